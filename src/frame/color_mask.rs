//! Frame color masking
//!
//! Classifies pixels as frame-colored by comparing them in HSV space against
//! a reference color and a per-channel tolerance window.
//!
//! # Algorithm
//!
//! 1. Convert the reference color and every pixel to 8-bit HSV
//!    (H in 0-180, S and V in 0-255)
//! 2. Build an inclusive window `[target - tolerance, target + tolerance]`
//!    per channel, clamped (not wrapped) at the channel limits
//! 3. Mark a pixel when all three channels fall inside the window and its
//!    alpha is above the opacity threshold

use image::{imageops, GrayImage, Luma, RgbaImage};
use serde::{Deserialize, Serialize};

use super::types::{FrameError, Result};

// ============================================================
// Constants
// ============================================================

/// Mask value for frame pixels
pub const MASK_ON: u8 = 255;

/// Mask value for everything else
pub const MASK_OFF: u8 = 0;

/// Upper limit of the 8-bit hue channel (degrees / 2)
const HUE_LIMIT: u8 = 180;

/// Upper limit of the saturation and value channels
const CHANNEL_LIMIT: u8 = 255;

// ============================================================
// Types
// ============================================================

/// Color in 8-bit HSV (hue 0-180, saturation and value 0-255)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvColor {
    pub hue: u8,
    pub saturation: u8,
    pub value: u8,
}

impl HsvColor {
    /// Convert an RGB color to 8-bit HSV
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let (h, s, v) = rgb_to_hsv(r, g, b);

        // Hue 360 degrees folds back onto 0
        let hue = (h / 2.0).round() as u32 % u32::from(HUE_LIMIT);

        Self {
            hue: hue as u8,
            saturation: (s * 255.0).round() as u8,
            value: (v * 255.0).round() as u8,
        }
    }

    /// Parse a `#RRGGBB` (or `RRGGBB`) string into its HSV equivalent
    pub fn from_hex(hex: &str) -> Result<Self> {
        let [r, g, b] = parse_hex_rgb(hex)?;
        Ok(Self::from_rgb(r, g, b))
    }
}

/// Parse a `#RRGGBB` (or `RRGGBB`) string into RGB components
pub fn parse_hex_rgb(hex: &str) -> Result<[u8; 3]> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(FrameError::InvalidColor(hex.to_string()));
    }

    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map_err(|_| FrameError::InvalidColor(hex.to_string()))
    };

    Ok([channel(0)?, channel(2)?, channel(4)?])
}

/// Half-widths of the HSV match window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvTolerance {
    pub hue: u8,
    pub saturation: u8,
    pub value: u8,
}

/// Inclusive HSV window for color matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    pub lower: HsvColor,
    pub upper: HsvColor,
}

impl HsvRange {
    /// Build the window around `center`, clamping at the channel limits
    pub fn around(center: HsvColor, tolerance: HsvTolerance) -> Self {
        let lower = HsvColor {
            hue: center.hue.saturating_sub(tolerance.hue),
            saturation: center.saturation.saturating_sub(tolerance.saturation),
            value: center.value.saturating_sub(tolerance.value),
        };
        let upper = HsvColor {
            hue: center.hue.saturating_add(tolerance.hue).min(HUE_LIMIT),
            saturation: center
                .saturation
                .saturating_add(tolerance.saturation)
                .min(CHANNEL_LIMIT),
            value: center.value.saturating_add(tolerance.value).min(CHANNEL_LIMIT),
        };
        Self { lower, upper }
    }

    /// Check if an HSV color lies inside the window (bounds inclusive)
    pub fn matches(&self, color: HsvColor) -> bool {
        (self.lower.hue..=self.upper.hue).contains(&color.hue)
            && (self.lower.saturation..=self.upper.saturation).contains(&color.saturation)
            && (self.lower.value..=self.upper.value).contains(&color.value)
    }
}

// ============================================================
// Color Masker
// ============================================================

/// Builds the binary frame mask of an RGBA image
pub struct ColorMasker;

impl ColorMasker {
    /// Mark opaque pixels whose color falls inside `range`.
    ///
    /// A pixel is opaque when its alpha is strictly greater than
    /// `alpha_threshold`. Frame pixels are [`MASK_ON`], all others
    /// [`MASK_OFF`]. An all-off mask is a valid result.
    pub fn mask(image: &RgbaImage, range: &HsvRange, alpha_threshold: u8) -> GrayImage {
        GrayImage::from_fn(image.width(), image.height(), |x, y| {
            let [r, g, b, a] = image.get_pixel(x, y).0;
            let on = a > alpha_threshold && range.matches(HsvColor::from_rgb(r, g, b));
            Luma([if on { MASK_ON } else { MASK_OFF }])
        })
    }

    /// Number of frame pixels in a mask
    pub fn count(mask: &GrayImage) -> u64 {
        mask.pixels().filter(|p| p.0[0] != MASK_OFF).count() as u64
    }

    /// Fraction of frame pixels in a mask (0.0-1.0)
    pub fn coverage(mask: &GrayImage) -> f64 {
        let total = u64::from(mask.width()) * u64::from(mask.height());
        if total == 0 {
            return 0.0;
        }
        Self::count(mask) as f64 / total as f64
    }

    /// Copy of `mask` surrounded by `border` pixels of [`MASK_OFF`] on every
    /// side, so frame pixels on the image edge still have background beyond
    /// them. Pixel `(x, y)` moves to `(x + border, y + border)`.
    pub fn pad(mask: &GrayImage, border: u32) -> GrayImage {
        let mut padded = GrayImage::new(mask.width() + 2 * border, mask.height() + 2 * border);
        imageops::replace(&mut padded, mask, i64::from(border), i64::from(border));
        padded
    }
}

/// Convert RGB to HSV (hue in degrees 0-360, saturation and value 0.0-1.0)
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let rf = r as f32 / 255.0;
    let gf = g as f32 / 255.0;
    let bf = b as f32 / 255.0;

    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let v = max;
    let d = max - min;
    let s = if max == 0.0 { 0.0 } else { d / max };

    let h = if d == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (((gf - bf) / d) % 6.0)
    } else if max == gf {
        60.0 * (((bf - rf) / d) + 2.0)
    } else {
        60.0 * (((rf - gf) / d) + 4.0)
    };

    let h = if h < 0.0 { h + 360.0 } else { h };
    (h, s, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gold_range() -> HsvRange {
        HsvRange::around(
            HsvColor::from_rgb(0xB7, 0x94, 0x61),
            HsvTolerance {
                hue: 3,
                saturation: 40,
                value: 40,
            },
        )
    }

    #[test]
    fn test_gold_to_hsv() {
        let hsv = HsvColor::from_rgb(0xB7, 0x94, 0x61);
        assert_eq!(hsv.hue, 18);
        assert_eq!(hsv.saturation, 120);
        assert_eq!(hsv.value, 183);
    }

    #[test]
    fn test_primary_colors_to_hsv() {
        let red = HsvColor::from_rgb(255, 0, 0);
        assert_eq!((red.hue, red.saturation, red.value), (0, 255, 255));

        let green = HsvColor::from_rgb(0, 255, 0);
        assert_eq!(green.hue, 60);

        let blue = HsvColor::from_rgb(0, 0, 255);
        assert_eq!(blue.hue, 120);

        let white = HsvColor::from_rgb(255, 255, 255);
        assert_eq!((white.saturation, white.value), (0, 255));
    }

    #[test]
    fn test_hue_near_360_folds_to_zero() {
        // Hue ~359.5 degrees rounds to 180 which is the same as 0
        let hsv = HsvColor::from_rgb(255, 0, 2);
        assert_eq!(hsv.hue, 0);
    }

    #[test]
    fn test_from_hex() {
        let hsv = HsvColor::from_hex("#B79461").unwrap();
        assert_eq!(hsv, HsvColor::from_rgb(0xB7, 0x94, 0x61));

        let bare = HsvColor::from_hex("b79461").unwrap();
        assert_eq!(bare, hsv);
    }

    #[test]
    fn test_from_hex_invalid() {
        assert!(matches!(
            HsvColor::from_hex("#B794"),
            Err(FrameError::InvalidColor(_))
        ));
        assert!(matches!(
            HsvColor::from_hex("#GG9461"),
            Err(FrameError::InvalidColor(_))
        ));
    }

    #[test]
    fn test_range_clamped_not_wrapped() {
        let range = HsvRange::around(
            HsvColor {
                hue: 1,
                saturation: 250,
                value: 10,
            },
            HsvTolerance {
                hue: 3,
                saturation: 40,
                value: 40,
            },
        );
        assert_eq!(range.lower.hue, 0);
        assert_eq!(range.upper.hue, 4);
        assert_eq!(range.upper.saturation, 255);
        assert_eq!(range.lower.value, 0);

        // Hue 178 is 2 steps away on the circle but outside a clamped window
        assert!(!range.matches(HsvColor {
            hue: 178,
            saturation: 250,
            value: 10,
        }));
    }

    #[test]
    fn test_range_upper_hue_clamped_at_180() {
        let range = HsvRange::around(
            HsvColor {
                hue: 179,
                saturation: 100,
                value: 100,
            },
            HsvTolerance {
                hue: 3,
                saturation: 0,
                value: 0,
            },
        );
        assert_eq!(range.upper.hue, 180);
        assert_eq!(range.lower.hue, 176);
    }

    #[test]
    fn test_range_matching_inclusive() {
        let range = gold_range();
        assert!(range.matches(HsvColor {
            hue: 15,
            saturation: 80,
            value: 143,
        }));
        assert!(range.matches(HsvColor {
            hue: 21,
            saturation: 160,
            value: 223,
        }));
        assert!(!range.matches(HsvColor {
            hue: 22,
            saturation: 120,
            value: 183,
        }));
    }

    #[test]
    fn test_mask_respects_alpha() {
        let mut image = RgbaImage::from_pixel(4, 1, Rgba([0xB7, 0x94, 0x61, 255]));
        image.put_pixel(1, 0, Rgba([0xB7, 0x94, 0x61, 127]));
        image.put_pixel(2, 0, Rgba([0xB7, 0x94, 0x61, 128]));
        image.put_pixel(3, 0, Rgba([255, 0, 0, 255]));

        let mask = ColorMasker::mask(&image, &gold_range(), 127);

        assert_eq!(mask.get_pixel(0, 0).0[0], MASK_ON);
        assert_eq!(mask.get_pixel(1, 0).0[0], MASK_OFF);
        assert_eq!(mask.get_pixel(2, 0).0[0], MASK_ON);
        assert_eq!(mask.get_pixel(3, 0).0[0], MASK_OFF);
    }

    #[test]
    fn test_mask_near_color_matches() {
        // Slightly darker gold is still inside the tolerance window
        let image = RgbaImage::from_pixel(2, 2, Rgba([0xA8, 0x88, 0x5A, 255]));
        let mask = ColorMasker::mask(&image, &gold_range(), 127);
        assert_eq!(ColorMasker::count(&mask), 4);
    }

    #[test]
    fn test_mask_empty_is_valid() {
        let image = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        let mask = ColorMasker::mask(&image, &gold_range(), 127);
        assert_eq!(mask.dimensions(), (10, 10));
        assert_eq!(ColorMasker::count(&mask), 0);
        assert_eq!(ColorMasker::coverage(&mask), 0.0);
    }

    #[test]
    fn test_coverage() {
        let mut image = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        for x in 0..10 {
            image.put_pixel(x, 0, Rgba([0xB7, 0x94, 0x61, 255]));
        }
        let mask = ColorMasker::mask(&image, &gold_range(), 127);
        assert!((ColorMasker::coverage(&mask) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_pad_moves_pixels_inward() {
        let mut mask = GrayImage::new(4, 3);
        mask.put_pixel(0, 0, Luma([MASK_ON]));
        mask.put_pixel(3, 2, Luma([MASK_ON]));

        let padded = ColorMasker::pad(&mask, 1);
        assert_eq!(padded.dimensions(), (6, 5));
        assert_eq!(padded.get_pixel(1, 1).0[0], MASK_ON);
        assert_eq!(padded.get_pixel(4, 3).0[0], MASK_ON);
        assert_eq!(padded.get_pixel(0, 0).0[0], MASK_OFF);
        assert_eq!(padded.get_pixel(5, 4).0[0], MASK_OFF);
        assert_eq!(ColorMasker::count(&padded), 2);
    }
}
