//! Mask cleanup
//!
//! One morphological closing pass (dilate, then erode) over the frame mask.
//! Closes hairline gaps in the frame outline left by anti-aliasing or
//! compression noise before the mask is localized.

use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology;

/// Default closing radius: 1 gives a 3x3 square structuring element
pub const DEFAULT_CLOSING_RADIUS: u8 = 1;

/// Morphological mask cleaner
pub struct MaskCleaner;

impl MaskCleaner {
    /// Close the mask with a square structuring element of side `2 * radius + 1`.
    ///
    /// A radius of 0 returns the mask unchanged.
    pub fn close(mask: &GrayImage, radius: u8) -> GrayImage {
        if radius == 0 {
            return mask.clone();
        }
        morphology::close(mask, Norm::LInf, radius)
    }
}
