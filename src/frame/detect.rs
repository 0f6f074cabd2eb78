//! Frame bounds detection pipeline
//!
//! # Algorithm
//!
//! 1. Mask frame-colored opaque pixels in HSV space
//! 2. Close small gaps in the mask
//! 3. Localize the frame with the selected strategy:
//!    - Projection: edge-strength profile per axis, peak clustering,
//!      edge assembly with aspect-ratio inference
//!    - Smoothing: minimum-area rectangle of the largest contour
//! 4. Clamp to the image and pad

use image::{ColorType, DynamicImage, GrayImage, RgbaImage};
use tracing::debug;

use super::assemble::EdgeAssembler;
use super::cleanup::MaskCleaner;
use super::color_mask::ColorMasker;
use super::finalize::BoundsFinalizer;
use super::peaks::{PeakAnalysis, PeakClusterer};
use super::projection::ProjectionAnalyzer;
use super::smoothing::RectangleSmoother;
use super::types::{
    BoundingBox, DetectionStrategy, EdgeCandidates, FrameEdges, FrameError, Result,
};
use super::FrameOptions;

/// Intermediate results of one detection
#[derive(Debug, Clone, PartialEq)]
pub struct FrameAnalysis {
    /// Frame pixels in the cleaned mask
    pub mask_pixels: u64,
    /// Fraction of the image covered by the cleaned mask
    pub mask_coverage: f64,
    /// Strategy that produced the result
    pub strategy: DetectionStrategy,
    /// Edge candidates (projection strategy only)
    pub candidates: Option<EdgeCandidates>,
    /// Peak clustering of the row profile, with cluster scores
    /// (projection strategy only)
    pub row_peaks: Option<PeakAnalysis>,
    /// Peak clustering of the column profile (projection strategy only)
    pub column_peaks: Option<PeakAnalysis>,
    /// Raw edges before clamping and padding
    pub edges: FrameEdges,
    /// Final crop box
    pub bounds: BoundingBox,
}

/// Frame bounds detector
pub struct FrameBoundsDetector;

impl FrameBoundsDetector {
    /// Detect the frame bounding box of an image.
    ///
    /// The image must carry an alpha channel.
    pub fn detect(image: &DynamicImage, options: &FrameOptions) -> Result<BoundingBox> {
        Ok(Self::analyze(image, options)?.bounds)
    }

    /// Detect the frame bounding box of an RGBA buffer
    pub fn detect_rgba(image: &RgbaImage, options: &FrameOptions) -> Result<BoundingBox> {
        Ok(Self::analyze_rgba(image, options)?.bounds)
    }

    /// Run detection and keep the intermediate results.
    ///
    /// Only four-channel (RGBA) images are accepted; gray + alpha images
    /// fail with [`FrameError::NoAlphaChannel`] like any other layout.
    pub fn analyze(image: &DynamicImage, options: &FrameOptions) -> Result<FrameAnalysis> {
        match image.color() {
            ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => {
                Self::analyze_rgba(&image.to_rgba8(), options)
            }
            _ => Err(FrameError::NoAlphaChannel),
        }
    }

    /// Run detection on an RGBA buffer and keep the intermediate results
    pub fn analyze_rgba(image: &RgbaImage, options: &FrameOptions) -> Result<FrameAnalysis> {
        options.validate()?;

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(FrameError::EmptyImage);
        }

        let mask = Self::build_mask(image, options);
        let mask_pixels = ColorMasker::count(&mask);
        let mask_coverage = ColorMasker::coverage(&mask);
        debug!(width, height, mask_pixels, mask_coverage, "built frame mask");

        let (strategy, fit, edges) = match options.strategy {
            DetectionStrategy::Projection => {
                let fit = Self::locate_by_projection(&mask, options)?;
                let edges = fit.edges;
                (DetectionStrategy::Projection, Some(fit), edges)
            }
            DetectionStrategy::Smoothing => match RectangleSmoother::smooth(&mask) {
                Ok(edges) => (DetectionStrategy::Smoothing, None, edges),
                Err(FrameError::NoContoursFound) if options.projection_fallback => {
                    debug!("no contours, retrying with projections");
                    let fit = Self::locate_by_projection(&mask, options)?;
                    let edges = fit.edges;
                    (DetectionStrategy::Projection, Some(fit), edges)
                }
                Err(e) => return Err(e),
            },
        };

        let bounds = BoundsFinalizer::finalize(edges, width, height, options.padding)?;
        debug!(
            ?strategy,
            x = bounds.x,
            y = bounds.y,
            width = bounds.width,
            height = bounds.height,
            "detected frame bounds"
        );

        let (candidates, row_peaks, column_peaks) = match fit {
            Some(fit) => (Some(fit.candidates), Some(fit.rows), Some(fit.columns)),
            None => (None, None, None),
        };

        Ok(FrameAnalysis {
            mask_pixels,
            mask_coverage,
            strategy,
            candidates,
            row_peaks,
            column_peaks,
            edges,
            bounds,
        })
    }

    /// Cleaned frame mask of an RGBA image
    pub fn build_mask(image: &RgbaImage, options: &FrameOptions) -> GrayImage {
        let raw = ColorMasker::mask(image, &options.hsv_range(), options.alpha_threshold);
        MaskCleaner::close(&raw, options.closing_radius)
    }

    fn locate_by_projection(mask: &GrayImage, options: &FrameOptions) -> Result<ProjectionFit> {
        let projections = ProjectionAnalyzer::analyze(mask);
        let rows = PeakClusterer::analyze(&projections.top_bottom, &options.peaks);
        let columns = PeakClusterer::analyze(&projections.left_right, &options.peaks);
        let candidates = EdgeCandidates {
            top_bottom: rows.positions.clone(),
            left_right: columns.positions.clone(),
        };
        debug!(
            top_bottom = ?candidates.top_bottom,
            left_right = ?candidates.left_right,
            "edge candidates"
        );

        let edges = EdgeAssembler::assemble(
            &candidates,
            options.aspect_ratio(),
            mask.width(),
            mask.height(),
        )?;
        Ok(ProjectionFit {
            rows,
            columns,
            candidates,
            edges,
        })
    }
}

struct ProjectionFit {
    rows: PeakAnalysis,
    columns: PeakAnalysis,
    candidates: EdgeCandidates,
    edges: FrameEdges,
}

/// Detect frame bounds with the two mode flags.
///
/// `is_alternate_variant` selects the class aspect ratio (1.57 / 1.16)
/// instead of the subclass one (1.65 / 0.55); `use_smoothing` selects the
/// minimum-area rectangle strategy instead of projections.
pub fn detect_frame_bounds(
    image: &DynamicImage,
    is_alternate_variant: bool,
    use_smoothing: bool,
) -> Result<BoundingBox> {
    FrameBoundsDetector::detect(
        image,
        &FrameOptions::from_flags(is_alternate_variant, use_smoothing),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameVariant, DEFAULT_FRAME_COLOR};
    use image::{Rgba, RgbImage};

    const GOLD: Rgba<u8> = Rgba([DEFAULT_FRAME_COLOR[0], DEFAULT_FRAME_COLOR[1], DEFAULT_FRAME_COLOR[2], 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    /// Outline of `thickness` pixels covering x0..x1, y0..y1
    fn outline(width: u32, height: u32, rect: (u32, u32, u32, u32), thickness: u32) -> RgbaImage {
        let (x0, y0, x1, y1) = rect;
        RgbaImage::from_fn(width, height, |x, y| {
            let inside = (x0..x1).contains(&x) && (y0..y1).contains(&y);
            let inner = (x0 + thickness..x1 - thickness).contains(&x)
                && (y0 + thickness..y1 - thickness).contains(&y);
            if inside && !inner {
                GOLD
            } else {
                WHITE
            }
        })
    }

    fn near(actual: u32, expected: u32, tolerance: u32) -> bool {
        actual.abs_diff(expected) <= tolerance
    }

    #[test]
    fn test_rejects_image_without_alpha() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(20, 20));
        assert_eq!(
            FrameBoundsDetector::detect(&image, &FrameOptions::default()),
            Err(FrameError::NoAlphaChannel)
        );
    }

    #[test]
    fn test_rejects_gray_alpha_image() {
        let image = DynamicImage::ImageLumaA8(image::GrayAlphaImage::new(50, 50));
        assert_eq!(
            FrameBoundsDetector::detect(&image, &FrameOptions::default()),
            Err(FrameError::NoAlphaChannel)
        );
        assert_eq!(
            detect_frame_bounds(&image, false, true),
            Err(FrameError::NoAlphaChannel)
        );
    }

    #[test]
    fn test_accepts_rgba16_image() {
        let image = DynamicImage::ImageRgba8(outline(400, 300, (50, 50, 350, 250), 4));
        let wide = DynamicImage::ImageRgba16(image.to_rgba16());
        assert_eq!(
            FrameBoundsDetector::detect(&wide, &FrameOptions::default()),
            FrameBoundsDetector::detect(&image, &FrameOptions::default())
        );
    }

    #[test]
    fn test_rejects_empty_image() {
        let image = RgbaImage::new(0, 0);
        assert_eq!(
            FrameBoundsDetector::detect_rgba(&image, &FrameOptions::default()),
            Err(FrameError::EmptyImage)
        );
    }

    #[test]
    fn test_rejects_invalid_options() {
        let image = outline(400, 300, (50, 50, 350, 250), 4);
        let options = FrameOptions::builder().aspect_ratio(-1.0).build();
        assert!(matches!(
            FrameBoundsDetector::detect_rgba(&image, &options),
            Err(FrameError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_projection_finds_outline() {
        let image = outline(400, 300, (50, 50, 350, 250), 4);
        let analysis = FrameBoundsDetector::analyze_rgba(&image, &FrameOptions::default()).unwrap();

        assert_eq!(analysis.strategy, DetectionStrategy::Projection);
        let candidates = analysis.candidates.unwrap();
        assert!(candidates.top_bottom.len() >= 2);
        assert!(candidates.left_right.len() >= 2);

        let rows = analysis.row_peaks.unwrap();
        assert_eq!(rows.positions, candidates.top_bottom);
        let scored = rows.scored_positions();
        assert_eq!(scored.len(), candidates.top_bottom.len());
        assert!(scored.iter().all(|(_, score)| *score > 0.0));
        assert_eq!(analysis.column_peaks.unwrap().positions, candidates.left_right);

        let bounds = analysis.bounds;
        assert!(near(bounds.x, 48, 3), "{bounds:?}");
        assert!(near(bounds.y, 48, 3), "{bounds:?}");
        assert!(near(bounds.width, 304, 3), "{bounds:?}");
        assert!(near(bounds.height, 204, 3), "{bounds:?}");
    }

    #[test]
    fn test_smoothing_finds_outline() {
        let image = outline(400, 300, (50, 50, 350, 250), 4);
        let analysis = FrameBoundsDetector::analyze_rgba(&image, &FrameOptions::smoothing()).unwrap();

        assert_eq!(analysis.strategy, DetectionStrategy::Smoothing);
        assert!(analysis.candidates.is_none());
        assert!(analysis.row_peaks.is_none());
        let bounds = analysis.bounds;
        assert!(near(bounds.x, 48, 2), "{bounds:?}");
        assert!(near(bounds.y, 48, 2), "{bounds:?}");
        assert!(near(bounds.width, 303, 3), "{bounds:?}");
        assert!(near(bounds.height, 203, 3), "{bounds:?}");
    }

    #[test]
    fn test_empty_mask_fails_for_both_strategies() {
        let image = RgbaImage::from_pixel(100, 80, WHITE);

        assert!(matches!(
            FrameBoundsDetector::detect_rgba(&image, &FrameOptions::default()),
            Err(FrameError::InsufficientEdges {
                top_bottom: 0,
                left_right: 0
            })
        ));
        assert_eq!(
            FrameBoundsDetector::detect_rgba(&image, &FrameOptions::smoothing()),
            Err(FrameError::NoContoursFound)
        );
    }

    #[test]
    fn test_projection_fallback_after_empty_smoothing() {
        let image = RgbaImage::from_pixel(100, 80, WHITE);
        let options = FrameOptions::builder()
            .strategy(DetectionStrategy::Smoothing)
            .projection_fallback(true)
            .build();

        // Retried with projections, which fail on their own terms
        assert!(matches!(
            FrameBoundsDetector::detect_rgba(&image, &options),
            Err(FrameError::InsufficientEdges { .. })
        ));
    }

    #[test]
    fn test_transparent_frame_ignored() {
        let mut image = outline(400, 300, (50, 50, 350, 250), 4);
        for pixel in image.pixels_mut() {
            pixel.0[3] = 100;
        }
        let analysis = FrameBoundsDetector::analyze_rgba(&image, &FrameOptions::smoothing());
        assert_eq!(analysis, Err(FrameError::NoContoursFound));
    }

    #[test]
    fn test_detect_frame_bounds_flags() {
        let image = DynamicImage::ImageRgba8(outline(400, 300, (50, 50, 350, 250), 4));

        let projection = detect_frame_bounds(&image, false, false).unwrap();
        let smoothing = detect_frame_bounds(&image, true, true).unwrap();
        assert!(projection.is_within(400, 300));
        assert!(smoothing.is_within(400, 300));
    }

    #[test]
    fn test_idempotent() {
        let image = outline(400, 300, (50, 50, 350, 250), 4);
        let options = FrameOptions::builder().variant(FrameVariant::Class).build();
        let first = FrameBoundsDetector::detect_rgba(&image, &options).unwrap();
        let second = FrameBoundsDetector::detect_rgba(&image, &options).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_mask_pixels_reported() {
        let image = outline(100, 100, (10, 10, 90, 90), 4);
        let analysis = FrameBoundsDetector::analyze_rgba(&image, &FrameOptions::smoothing()).unwrap();
        // 80x80 outer minus 72x72 inner
        assert_eq!(analysis.mask_pixels, 80 * 80 - 72 * 72);
        assert!(analysis.mask_coverage > 0.0);
    }
}
