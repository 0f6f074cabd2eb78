//! Peak extraction and clustering
//!
//! Turns one edge-strength profile into at most a handful of edge positions.
//! A single physical frame border usually shows up as several nearby peaks
//! (outer and inner transition of the outline, anti-aliasing ripples), so
//! peaks are grouped into clusters before positions are reported.
//!
//! # Algorithm
//!
//! 1. Normalize by the maximum (an all-zero profile yields no edges)
//! 2. Moving-average smoothing
//! 3. Strict local maxima above the peak threshold become raw peaks
//! 4. Consecutive raw peaks are merged while they are closer than the
//!    adaptive maximum distance and either closer than the minimum distance
//!    or connected by a steep stretch of the curve
//! 5. Clusters are scored (summed magnitude, boosted by gradient continuity),
//!    diffuse clusters are dropped and the best few are kept
//! 6. With fewer than two surviving clusters, strong local maxima of the
//!    smoothed curve are reported instead

use tracing::debug;

// ============================================================
// Constants
// ============================================================

/// Default moving-average window
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;

/// Minimum normalized magnitude for a raw peak
pub const DEFAULT_PEAK_THRESHOLD: f64 = 0.1;

/// Minimum normalized magnitude for a fallback peak
pub const DEFAULT_FALLBACK_THRESHOLD: f64 = 0.5;

/// Mean absolute gradient above which distant peaks still merge
pub const DEFAULT_CONTINUITY_THRESHOLD: f64 = 0.1;

/// Lower bound of the minimum merge distance in samples
pub const DEFAULT_MIN_DISTANCE_FLOOR: usize = 10;

/// Minimum merge distance as a fraction of the axis length
pub const DEFAULT_MIN_DISTANCE_RATIO: f64 = 0.01;

/// Lower bound of the maximum merge distance in samples
pub const DEFAULT_MAX_DISTANCE_FLOOR: usize = 20;

/// Maximum merge distance as a fraction of the axis length
pub const DEFAULT_MAX_DISTANCE_RATIO: f64 = 0.03;

/// Clusters kept per axis
pub const DEFAULT_MAX_CLUSTERS: usize = 4;

/// Fewer surviving clusters than this triggers the fallback scan
const MIN_CLUSTERS: usize = 2;

/// Absorbs rounding in the weighted mean before truncation
const POSITION_EPSILON: f64 = 1e-9;

// ============================================================
// Types
// ============================================================

/// Tuning for peak extraction and clustering
#[derive(Debug, Clone, PartialEq)]
pub struct PeakOptions {
    /// Moving-average window size
    pub smoothing_window: usize,
    /// Raw peak threshold (0.0-1.0)
    pub peak_threshold: f64,
    /// Fallback peak threshold (0.0-1.0)
    pub fallback_threshold: f64,
    /// Gradient continuity needed to merge peaks beyond the minimum distance
    pub continuity_threshold: f64,
    /// Floor of the minimum merge distance
    pub min_distance_floor: usize,
    /// Minimum merge distance relative to axis length
    pub min_distance_ratio: f64,
    /// Floor of the maximum merge distance
    pub max_distance_floor: usize,
    /// Maximum merge distance relative to axis length
    pub max_distance_ratio: f64,
    /// Clusters kept per axis
    pub max_clusters: usize,
}

impl Default for PeakOptions {
    fn default() -> Self {
        Self {
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            peak_threshold: DEFAULT_PEAK_THRESHOLD,
            fallback_threshold: DEFAULT_FALLBACK_THRESHOLD,
            continuity_threshold: DEFAULT_CONTINUITY_THRESHOLD,
            min_distance_floor: DEFAULT_MIN_DISTANCE_FLOOR,
            min_distance_ratio: DEFAULT_MIN_DISTANCE_RATIO,
            max_distance_floor: DEFAULT_MAX_DISTANCE_FLOOR,
            max_distance_ratio: DEFAULT_MAX_DISTANCE_RATIO,
            max_clusters: DEFAULT_MAX_CLUSTERS,
        }
    }
}

impl PeakOptions {
    /// Merge distance limits `(min, max)` for an axis of `len` samples
    pub fn distance_limits(&self, len: usize) -> (usize, usize) {
        let scaled = |ratio: f64| (len as f64 * ratio) as usize;
        (
            self.min_distance_floor.max(scaled(self.min_distance_ratio)),
            self.max_distance_floor.max(scaled(self.max_distance_ratio)),
        )
    }
}

/// Local maximum of a smoothed profile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Index along the axis
    pub position: usize,
    /// Normalized magnitude (0.0-1.0)
    pub magnitude: f64,
}

impl Peak {
    pub fn new(position: usize, magnitude: f64) -> Self {
        Self {
            position,
            magnitude,
        }
    }
}

/// Group of nearby peaks judged to be one edge
#[derive(Debug, Clone, PartialEq)]
pub struct PeakCluster {
    /// Member peaks in ascending position
    pub peaks: Vec<Peak>,
    /// Summed magnitude times (1 + gradient continuity)
    pub score: f64,
}

impl PeakCluster {
    /// Magnitude-weighted mean position, truncated to an index
    pub fn position(&self) -> usize {
        let total: f64 = self.peaks.iter().map(|p| p.magnitude).sum();
        if total <= 0.0 {
            return self.peaks.first().map_or(0, |p| p.position);
        }
        let weighted: f64 = self
            .peaks
            .iter()
            .map(|p| p.position as f64 * p.magnitude)
            .sum();
        (weighted / total + POSITION_EPSILON) as usize
    }

    /// Population standard deviation of member positions
    pub fn spread(&self) -> f64 {
        if self.peaks.is_empty() {
            return 0.0;
        }
        let n = self.peaks.len() as f64;
        let mean = self.peaks.iter().map(|p| p.position as f64).sum::<f64>() / n;
        let variance = self
            .peaks
            .iter()
            .map(|p| (p.position as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        variance.sqrt()
    }

    /// Summed member magnitude
    pub fn magnitude(&self) -> f64 {
        self.peaks.iter().map(|p| p.magnitude).sum()
    }
}

/// Full result of clustering one profile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakAnalysis {
    /// Smoothed, normalized profile (empty if the profile was all zero)
    pub smoothed: Vec<f64>,
    /// Local maxima above the raw peak threshold
    pub raw_peaks: Vec<Peak>,
    /// Every cluster formed, before filtering
    pub clusters: Vec<PeakCluster>,
    /// Reported edge positions, ascending
    pub positions: Vec<usize>,
    /// Whether the strong-peak fallback produced `positions`
    pub used_fallback: bool,
}

impl PeakAnalysis {
    /// Reported positions paired with their score.
    ///
    /// Cluster positions carry the cluster score; fallback positions carry
    /// the smoothed magnitude at that index.
    pub fn scored_positions(&self) -> Vec<(usize, f64)> {
        self.positions
            .iter()
            .map(|&position| {
                let score = if self.used_fallback {
                    self.smoothed.get(position).copied().unwrap_or(0.0)
                } else {
                    self.clusters
                        .iter()
                        .filter(|c| c.position() == position)
                        .map(|c| c.score)
                        .fold(0.0, f64::max)
                };
                (position, score)
            })
            .collect()
    }
}

// ============================================================
// Peak Clusterer
// ============================================================

/// Extracts edge positions from a projection profile
pub struct PeakClusterer;

impl PeakClusterer {
    /// Edge positions of a profile, ascending
    pub fn find_edges(profile: &[f64], options: &PeakOptions) -> Vec<usize> {
        Self::analyze(profile, options).positions
    }

    /// Run the whole extraction and keep the intermediate results
    pub fn analyze(profile: &[f64], options: &PeakOptions) -> PeakAnalysis {
        let Some(normalized) = Self::normalize(profile) else {
            return PeakAnalysis::default();
        };

        let smoothed = Self::smooth(&normalized, options.smoothing_window);
        let raw_peaks = Self::local_maxima(&smoothed, options.peak_threshold);
        if raw_peaks.is_empty() {
            return PeakAnalysis {
                smoothed,
                ..Default::default()
            };
        }

        let (min_dist, max_dist) = options.distance_limits(profile.len());
        let gradient = Self::gradient(&smoothed);
        let clusters = Self::cluster_peaks(&raw_peaks, &gradient, min_dist, max_dist, options);
        let ranked = Self::rank_clusters(&clusters, max_dist, options.max_clusters);

        debug!(
            len = profile.len(),
            raw_peaks = raw_peaks.len(),
            clusters = clusters.len(),
            kept = ranked.len(),
            min_dist,
            max_dist,
            "clustered projection peaks"
        );

        let (positions, used_fallback) = if ranked.len() >= MIN_CLUSTERS {
            (ranked, false)
        } else {
            let strong: Vec<usize> = Self::local_maxima(&smoothed, options.fallback_threshold)
                .into_iter()
                .map(|p| p.position)
                .collect();
            debug!(strong = strong.len(), "too few clusters, using strong peaks");
            (strong, true)
        };

        PeakAnalysis {
            smoothed,
            raw_peaks,
            clusters,
            positions,
            used_fallback,
        }
    }

    /// Divide by the maximum; `None` when the maximum is not positive
    pub fn normalize(profile: &[f64]) -> Option<Vec<f64>> {
        let max = profile.iter().copied().fold(0.0_f64, f64::max);
        if max <= 0.0 {
            return None;
        }
        Some(profile.iter().map(|v| v / max).collect())
    }

    /// Centered moving average with zero padding; output has the input length
    pub fn smooth(values: &[f64], window: usize) -> Vec<f64> {
        if window <= 1 {
            return values.to_vec();
        }

        let len = values.len() as isize;
        let back = (window / 2) as isize;
        (0..len)
            .map(|i| {
                let start = (i - back).max(0);
                let end = (i - back + window as isize).min(len);
                let sum: f64 = (start..end).map(|j| values[j as usize]).sum();
                sum / window as f64
            })
            .collect()
    }

    /// Discrete gradient: central differences inside, one-sided at the ends
    pub fn gradient(values: &[f64]) -> Vec<f64> {
        let n = values.len();
        if n < 2 {
            return vec![0.0; n];
        }

        let mut gradient = Vec::with_capacity(n);
        gradient.push(values[1] - values[0]);
        for i in 1..n - 1 {
            gradient.push((values[i + 1] - values[i - 1]) / 2.0);
        }
        gradient.push(values[n - 1] - values[n - 2]);
        gradient
    }

    /// Strict local maxima above `threshold`, in ascending position
    pub fn local_maxima(values: &[f64], threshold: f64) -> Vec<Peak> {
        if values.len() < 3 {
            return Vec::new();
        }

        (1..values.len() - 1)
            .filter(|&i| {
                values[i] > threshold && values[i] > values[i - 1] && values[i] > values[i + 1]
            })
            .map(|i| Peak::new(i, values[i]))
            .collect()
    }

    /// Mean |gradient| over `start..end` (0.0 for an empty range)
    pub fn gradient_continuity(gradient: &[f64], start: usize, end: usize) -> f64 {
        let end = end.min(gradient.len());
        if start >= end {
            return 0.0;
        }
        let sum: f64 = gradient[start..end].iter().map(|g| g.abs()).sum();
        sum / (end - start) as f64
    }

    /// Group consecutive raw peaks into clusters and score them
    pub fn cluster_peaks(
        raw_peaks: &[Peak],
        gradient: &[f64],
        min_dist: usize,
        max_dist: usize,
        options: &PeakOptions,
    ) -> Vec<PeakCluster> {
        let mut clusters = Vec::new();
        let Some((first, rest)) = raw_peaks.split_first() else {
            return clusters;
        };

        let mut current = vec![*first];
        let mut previous = *first;
        for peak in rest {
            let gap = peak.position - previous.position;
            let continuity = Self::gradient_continuity(gradient, previous.position, peak.position);

            let merge = gap < max_dist
                && (gap < min_dist || continuity > options.continuity_threshold);
            if merge {
                current.push(*peak);
            } else {
                clusters.push(Self::score_cluster(std::mem::take(&mut current), gradient));
                current.push(*peak);
            }
            previous = *peak;
        }
        clusters.push(Self::score_cluster(current, gradient));

        clusters
    }

    fn score_cluster(peaks: Vec<Peak>, gradient: &[f64]) -> PeakCluster {
        let first = peaks.first().map_or(0, |p| p.position);
        let last = peaks.last().map_or(0, |p| p.position);
        let continuity = Self::gradient_continuity(gradient, first, last + 1);
        let magnitude: f64 = peaks.iter().map(|p| p.magnitude).sum();

        PeakCluster {
            peaks,
            score: magnitude * (1.0 + continuity),
        }
    }

    /// Drop diffuse clusters, keep the best `max_clusters` by score and
    /// return their positions ascending
    pub fn rank_clusters(clusters: &[PeakCluster], max_dist: usize, max_clusters: usize) -> Vec<usize> {
        let mut tight: Vec<&PeakCluster> = clusters
            .iter()
            .filter(|c| c.spread() < max_dist as f64)
            .collect();

        tight.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut positions: Vec<usize> = tight
            .into_iter()
            .take(max_clusters)
            .map(PeakCluster::position)
            .collect();
        positions.sort_unstable();
        positions
    }
}
