//! Frame Bounds Detection module
//!
//! Locates the decorative, near-uniformly colored rectangular frame around
//! artwork in an RGBA image and returns the pixel rectangle to crop to.
//!
//! # Features
//!
//! - HSV color masking with per-channel tolerance and an opacity gate
//! - Morphological closing of the mask
//! - Two localization strategies: gradient projections with peak clustering
//!   (default) or a minimum-area rectangle around the largest contour
//! - Aspect-ratio inference of a missing frame edge
//! - Clamped, padded integer output that always lies inside the image
//!
//! # Example
//!
//! ```rust,no_run
//! use frame_bounds::{FrameBoundsDetector, FrameOptions, FrameVariant};
//!
//! let image = image::open("card.png").unwrap();
//! let options = FrameOptions::builder()
//!     .variant(FrameVariant::Class)
//!     .padding(2)
//!     .build();
//!
//! let bounds = FrameBoundsDetector::detect(&image, &options).unwrap();
//! println!("x={} y={} w={} h={}", bounds.x, bounds.y, bounds.width, bounds.height);
//! ```

// Submodules
mod assemble;
mod cleanup;
mod color_mask;
mod detect;
mod finalize;
mod peaks;
mod projection;
mod smoothing;
mod types;

// Re-export public API
pub use assemble::EdgeAssembler;
pub use cleanup::{MaskCleaner, DEFAULT_CLOSING_RADIUS};
pub use color_mask::{parse_hex_rgb, ColorMasker, HsvColor, HsvRange, HsvTolerance, MASK_OFF, MASK_ON};
pub use detect::{detect_frame_bounds, FrameAnalysis, FrameBoundsDetector};
pub use finalize::{BoundsFinalizer, DEFAULT_PADDING};
pub use peaks::{
    Peak, PeakAnalysis, PeakCluster, PeakClusterer, PeakOptions, DEFAULT_CONTINUITY_THRESHOLD,
    DEFAULT_FALLBACK_THRESHOLD, DEFAULT_MAX_CLUSTERS, DEFAULT_MAX_DISTANCE_FLOOR,
    DEFAULT_MAX_DISTANCE_RATIO, DEFAULT_MIN_DISTANCE_FLOOR, DEFAULT_MIN_DISTANCE_RATIO,
    DEFAULT_PEAK_THRESHOLD, DEFAULT_SMOOTHING_WINDOW,
};
pub use projection::{ProjectionAnalyzer, Projections};
pub use smoothing::RectangleSmoother;
pub use types::{
    BoundingBox, DetectionStrategy, EdgeCandidates, FrameEdges, FrameError, FrameVariant, Result,
};

// ============================================================
// Constants
// ============================================================

/// Reference frame color (#B79461, a muted gold)
pub const DEFAULT_FRAME_COLOR: [u8; 3] = [0xB7, 0x94, 0x61];

/// Default hue tolerance (8-bit hue steps, 2 degrees each)
pub const DEFAULT_HUE_TOLERANCE: u8 = 3;

/// Default saturation tolerance
pub const DEFAULT_SATURATION_TOLERANCE: u8 = 40;

/// Default value tolerance
pub const DEFAULT_VALUE_TOLERANCE: u8 = 40;

/// Pixels need alpha strictly above this to count as opaque
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 127;

/// Largest closing radius accepted by validation
const MAX_CLOSING_RADIUS: u8 = 16;

// ============================================================
// Options
// ============================================================

/// Frame detection options
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOptions {
    /// Reference frame color as RGB
    pub frame_color: [u8; 3],
    /// HSV match window half-widths
    pub tolerance: HsvTolerance,
    /// Alpha threshold (pixel alpha must be greater)
    pub alpha_threshold: u8,
    /// Morphological closing radius (1 = 3x3)
    pub closing_radius: u8,
    /// Peak extraction tuning
    pub peaks: PeakOptions,
    /// Padding added on every side of the result
    pub padding: u32,
    /// Expected frame family
    pub variant: FrameVariant,
    /// Localization strategy
    pub strategy: DetectionStrategy,
    /// Retry with projections when the smoothing strategy finds no contours
    pub projection_fallback: bool,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            frame_color: DEFAULT_FRAME_COLOR,
            tolerance: HsvTolerance {
                hue: DEFAULT_HUE_TOLERANCE,
                saturation: DEFAULT_SATURATION_TOLERANCE,
                value: DEFAULT_VALUE_TOLERANCE,
            },
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            closing_radius: DEFAULT_CLOSING_RADIUS,
            peaks: PeakOptions::default(),
            padding: DEFAULT_PADDING,
            variant: FrameVariant::default(),
            strategy: DetectionStrategy::default(),
            projection_fallback: false,
        }
    }
}

impl FrameOptions {
    /// Create a new options builder
    pub fn builder() -> FrameOptionsBuilder {
        FrameOptionsBuilder::default()
    }

    /// Options for class artwork (ratio 1.57 / 1.16)
    pub fn class() -> Self {
        Self {
            variant: FrameVariant::Class,
            ..Default::default()
        }
    }

    /// Options for subclass artwork (ratio 1.65 / 0.55)
    pub fn subclass() -> Self {
        Self {
            variant: FrameVariant::Subclass,
            ..Default::default()
        }
    }

    /// Options using the rectangle smoothing strategy
    pub fn smoothing() -> Self {
        Self {
            strategy: DetectionStrategy::Smoothing,
            ..Default::default()
        }
    }

    /// Options equivalent to the two mode flags of [`detect_frame_bounds`]
    pub fn from_flags(is_alternate_variant: bool, use_smoothing: bool) -> Self {
        Self {
            variant: FrameVariant::from_alternate(is_alternate_variant),
            strategy: DetectionStrategy::from_smoothing(use_smoothing),
            ..Default::default()
        }
    }

    /// HSV window around the reference color
    pub fn hsv_range(&self) -> HsvRange {
        let [r, g, b] = self.frame_color;
        HsvRange::around(HsvColor::from_rgb(r, g, b), self.tolerance)
    }

    /// Expected frame height / frame width
    pub fn aspect_ratio(&self) -> f64 {
        self.variant.aspect_ratio()
    }

    /// Reject option combinations detection cannot work with
    pub fn validate(&self) -> Result<()> {
        let ratio = self.aspect_ratio();
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(FrameError::InvalidOptions(format!(
                "aspect ratio must be positive, got {ratio}"
            )));
        }

        if self.closing_radius > MAX_CLOSING_RADIUS {
            return Err(FrameError::InvalidOptions(format!(
                "closing radius {} exceeds {MAX_CLOSING_RADIUS}",
                self.closing_radius
            )));
        }

        let peaks = &self.peaks;
        if peaks.smoothing_window == 0 {
            return Err(FrameError::InvalidOptions(
                "smoothing window must be at least 1".to_string(),
            ));
        }
        if peaks.max_clusters == 0 {
            return Err(FrameError::InvalidOptions(
                "max clusters must be at least 1".to_string(),
            ));
        }

        for (name, value) in [
            ("peak threshold", peaks.peak_threshold),
            ("fallback threshold", peaks.fallback_threshold),
            ("continuity threshold", peaks.continuity_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(FrameError::InvalidOptions(format!(
                    "{name} must be within 0.0-1.0, got {value}"
                )));
            }
        }

        for (name, value) in [
            ("min distance ratio", peaks.min_distance_ratio),
            ("max distance ratio", peaks.max_distance_ratio),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(FrameError::InvalidOptions(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }

        Ok(())
    }
}

/// Builder for FrameOptions
#[derive(Debug, Default)]
pub struct FrameOptionsBuilder {
    options: FrameOptions,
}

impl FrameOptionsBuilder {
    /// Set the reference frame color (RGB)
    #[must_use]
    pub fn frame_color(mut self, rgb: [u8; 3]) -> Self {
        self.options.frame_color = rgb;
        self
    }

    /// Set the HSV tolerance window
    #[must_use]
    pub fn tolerance(mut self, tolerance: HsvTolerance) -> Self {
        self.options.tolerance = tolerance;
        self
    }

    /// Set the alpha threshold
    #[must_use]
    pub fn alpha_threshold(mut self, threshold: u8) -> Self {
        self.options.alpha_threshold = threshold;
        self
    }

    /// Set the closing radius
    #[must_use]
    pub fn closing_radius(mut self, radius: u8) -> Self {
        self.options.closing_radius = radius;
        self
    }

    /// Set peak extraction options
    #[must_use]
    pub fn peaks(mut self, peaks: PeakOptions) -> Self {
        self.options.peaks = peaks;
        self
    }

    /// Set the raw peak threshold (0.0-1.0)
    #[must_use]
    pub fn peak_threshold(mut self, threshold: f64) -> Self {
        self.options.peaks.peak_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the fallback peak threshold (0.0-1.0)
    #[must_use]
    pub fn fallback_threshold(mut self, threshold: f64) -> Self {
        self.options.peaks.fallback_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the padding in pixels
    #[must_use]
    pub fn padding(mut self, padding: u32) -> Self {
        self.options.padding = padding;
        self
    }

    /// Set the frame variant
    #[must_use]
    pub fn variant(mut self, variant: FrameVariant) -> Self {
        self.options.variant = variant;
        self
    }

    /// Set a custom height / width ratio
    #[must_use]
    pub fn aspect_ratio(mut self, ratio: f64) -> Self {
        self.options.variant = FrameVariant::Custom(ratio);
        self
    }

    /// Set the detection strategy
    #[must_use]
    pub fn strategy(mut self, strategy: DetectionStrategy) -> Self {
        self.options.strategy = strategy;
        self
    }

    /// Enable projection retry after an empty smoothing result
    #[must_use]
    pub fn projection_fallback(mut self, enabled: bool) -> Self {
        self.options.projection_fallback = enabled;
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> FrameOptions {
        self.options
    }
}
