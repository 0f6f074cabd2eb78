//! Bounds finalization
//!
//! Converts raw floating-point frame edges into the integer crop box:
//! clamp to the image, truncate, then grow by a fixed padding without
//! leaving the image.

use super::types::{BoundingBox, FrameEdges, FrameError, Result};

/// Default padding added on every side of the frame
pub const DEFAULT_PADDING: u32 = 2;

/// Clamps and pads raw frame edges
pub struct BoundsFinalizer;

impl BoundsFinalizer {
    /// Produce the final bounding box for a `image_width` x `image_height` image.
    ///
    /// Fails with [`FrameError::DegenerateBounds`] when nothing of the frame
    /// remains inside the image.
    pub fn finalize(
        edges: FrameEdges,
        image_width: u32,
        image_height: u32,
        padding: u32,
    ) -> Result<BoundingBox> {
        let (x, width) = Self::finalize_axis(edges.left, edges.right, image_width, padding);
        let (y, height) = Self::finalize_axis(edges.top, edges.bottom, image_height, padding);

        if width <= 0 || height <= 0 {
            return Err(FrameError::DegenerateBounds);
        }

        // Both values are within 0..=axis length here
        Ok(BoundingBox::new(x as u32, y as u32, width as u32, height as u32))
    }

    /// Clamp one axis and apply padding, returning `(start, length)`.
    ///
    /// The length is capped at the distance from the clamped (unpadded)
    /// start to the end of the axis.
    fn finalize_axis(start: f64, end: f64, axis_len: u32, padding: u32) -> (i64, i64) {
        let axis_len = i64::from(axis_len);
        let padding = i64::from(padding);

        let start = (start.trunc() as i64).max(0);
        let end = (end.trunc() as i64).min(axis_len);
        let extent = end - start;

        let padded_start = (start - padding).max(0);
        let padded_len = (axis_len - start).min(extent + 2 * padding);

        (padded_start, padded_len)
    }
}
