//! Edge-strength projections
//!
//! Differentiates the cleaned mask along each axis with 3x3 Sobel kernels and
//! collapses the absolute responses into two 1-D profiles:
//!
//! - `top_bottom`: one value per row (sum of |d/dy| across the row); peaks
//!   mark rows where a horizontal frame border is crossed
//! - `left_right`: one value per column (sum of |d/dx| down the column);
//!   peaks mark columns where a vertical frame border is crossed
//!
//! Pixels outside the mask count as background, so a frame drawn against
//! the image edge still produces an edge response there.

use image::GrayImage;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use tracing::trace;

use super::color_mask::ColorMasker;

/// Background border added around the mask before differentiating
const SOBEL_BORDER: u32 = 1;

/// Edge-strength profiles of a mask
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projections {
    /// Indexed by row (y); locates top and bottom edges
    pub top_bottom: Vec<f64>,
    /// Indexed by column (x); locates left and right edges
    pub left_right: Vec<f64>,
}

/// Gradient projection analyzer
pub struct ProjectionAnalyzer;

impl ProjectionAnalyzer {
    /// Compute both edge-strength profiles of a mask
    pub fn analyze(mask: &GrayImage) -> Projections {
        let projections = Projections {
            top_bottom: Self::row_profile(mask),
            left_right: Self::column_profile(mask),
        };
        trace!(
            rows = projections.top_bottom.len(),
            columns = projections.left_right.len(),
            "computed edge projections"
        );
        projections
    }

    /// Sum of |d/dy| over each row
    pub fn row_profile(mask: &GrayImage) -> Vec<f64> {
        let (width, height) = mask.dimensions();
        let mut profile = vec![0.0; height as usize];
        if width == 0 || height == 0 {
            return profile;
        }

        let gradient = vertical_sobel(&ColorMasker::pad(mask, SOBEL_BORDER));
        for y in 0..height {
            profile[y as usize] = (0..width)
                .map(|x| {
                    let pixel = gradient.get_pixel(x + SOBEL_BORDER, y + SOBEL_BORDER);
                    f64::from(pixel.0[0].unsigned_abs())
                })
                .sum();
        }
        profile
    }

    /// Sum of |d/dx| over each column
    pub fn column_profile(mask: &GrayImage) -> Vec<f64> {
        let (width, height) = mask.dimensions();
        let mut profile = vec![0.0; width as usize];
        if width == 0 || height == 0 {
            return profile;
        }

        let gradient = horizontal_sobel(&ColorMasker::pad(mask, SOBEL_BORDER));
        for x in 0..width {
            profile[x as usize] = (0..height)
                .map(|y| {
                    let pixel = gradient.get_pixel(x + SOBEL_BORDER, y + SOBEL_BORDER);
                    f64::from(pixel.0[0].unsigned_abs())
                })
                .sum();
        }
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::color_mask::{MASK_OFF, MASK_ON};
    use image::Luma;

    fn argmax(values: &[f64]) -> usize {
        let mut best = 0;
        for (i, v) in values.iter().enumerate() {
            if *v > values[best] {
                best = i;
            }
        }
        best
    }

    #[test]
    fn test_profile_lengths() {
        let mask = GrayImage::new(40, 30);
        let projections = ProjectionAnalyzer::analyze(&mask);
        assert_eq!(projections.top_bottom.len(), 30);
        assert_eq!(projections.left_right.len(), 40);
    }

    #[test]
    fn test_empty_mask_has_flat_profiles() {
        let mask = GrayImage::new(40, 30);
        let projections = ProjectionAnalyzer::analyze(&mask);
        assert!(projections.top_bottom.iter().all(|v| *v == 0.0));
        assert!(projections.left_right.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_horizontal_band_only_excites_rows() {
        // Band across the middle columns: rows 10..20
        let mask = GrayImage::from_fn(50, 40, |x, y| {
            if (10..20).contains(&y) && (5..45).contains(&x) {
                Luma([MASK_ON])
            } else {
                Luma([MASK_OFF])
            }
        });
        let projections = ProjectionAnalyzer::analyze(&mask);

        // Transitions are at rows 9/10 and 19/20
        assert!(projections.top_bottom[9] > 0.0);
        assert!(projections.top_bottom[10] > 0.0);
        assert!(projections.top_bottom[19] > 0.0);
        assert!(projections.top_bottom[20] > 0.0);
        assert_eq!(projections.top_bottom[15], 0.0);
        assert_eq!(projections.top_bottom[0], 0.0);

        // Vertical edges only at the band ends
        assert!(projections.left_right[5] > 0.0);
        assert!(projections.left_right[44] > 0.0);
        assert!(projections.left_right[10..40].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_vertical_band_only_excites_columns() {
        let mask = GrayImage::from_fn(50, 40, |x, y| {
            if (30..35).contains(&x) && (5..35).contains(&y) {
                Luma([MASK_ON])
            } else {
                Luma([MASK_OFF])
            }
        });
        let projections = ProjectionAnalyzer::analyze(&mask);

        let peak = argmax(&projections.left_right);
        assert!(peak == 29 || peak == 30 || peak == 34 || peak == 35);
        assert_eq!(projections.left_right[10], 0.0);
        assert!(projections.top_bottom[10..30].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_band_on_image_edge_has_outer_response() {
        // Columns 0..4 filled top to bottom
        let mask = GrayImage::from_fn(50, 40, |x, _| {
            if x < 4 {
                Luma([MASK_ON])
            } else {
                Luma([MASK_OFF])
            }
        });
        let projections = ProjectionAnalyzer::analyze(&mask);

        assert!(projections.left_right[0] > 0.0);
        assert_eq!(projections.left_right[1], 0.0);
        assert!(projections.left_right[3] > 0.0);
        assert!(projections.left_right[4] > 0.0);

        // The band meets the top and bottom image edges too
        assert!(projections.top_bottom[0] > 0.0);
        assert!(projections.top_bottom[39] > 0.0);
        assert_eq!(projections.top_bottom[20], 0.0);
    }

    #[test]
    fn test_zero_sized_mask() {
        let mask = GrayImage::new(0, 0);
        let projections = ProjectionAnalyzer::analyze(&mask);
        assert!(projections.top_bottom.is_empty());
        assert!(projections.left_right.is_empty());
    }
}
