//! Rectangle smoothing strategy
//!
//! Fast path: take the largest external contour of the cleaned mask, fit a
//! minimum-area (possibly rotated) rectangle to it and use the axis-aligned
//! extent of that rectangle's corners as the frame.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::geometry::min_area_rect;
use imageproc::point::Point;
use tracing::debug;

use super::color_mask::ColorMasker;
use super::types::{FrameEdges, FrameError, Result};

/// Minimum number of points for a rotated rectangle fit
const MIN_FIT_POINTS: usize = 3;

/// Background border added around the mask before tracing
const TRACE_BORDER: u32 = 1;

/// Minimum-area rectangle smoother
pub struct RectangleSmoother;

impl RectangleSmoother {
    /// Fit the frame rectangle to the largest external contour of `mask`.
    ///
    /// Returns the raw (unpadded, unclamped) edges; fails with
    /// [`FrameError::NoContoursFound`] when the mask is empty.
    pub fn smooth(mask: &GrayImage) -> Result<FrameEdges> {
        let contours = Self::external_contours(mask);
        if contours.is_empty() {
            return Err(FrameError::NoContoursFound);
        }

        let mut largest = &contours[0];
        let mut largest_area = Self::contour_area(&largest.points);
        for contour in contours.iter().skip(1) {
            let area = Self::contour_area(&contour.points);
            if area > largest_area {
                largest = contour;
                largest_area = area;
            }
        }

        debug!(
            contours = contours.len(),
            points = largest.points.len(),
            area = largest_area,
            "selected largest contour"
        );

        let corners = Self::fit_rectangle(&largest.points);
        Ok(Self::axis_aligned_extent(&corners))
    }

    /// Outermost contours of the mask (no contours nested in holes), in
    /// mask coordinates.
    ///
    /// The tracer only starts an outer border after a background pixel, so
    /// the mask is traced inside a one-pixel background border and the
    /// points are shifted back.
    pub fn external_contours(mask: &GrayImage) -> Vec<Contour<i32>> {
        let padded = ColorMasker::pad(mask, TRACE_BORDER);
        let offset = TRACE_BORDER as i32;

        find_contours::<i32>(&padded)
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .map(|mut c| {
                for p in &mut c.points {
                    p.x -= offset;
                    p.y -= offset;
                }
                c
            })
            .collect()
    }

    /// Area enclosed by a closed polygon (shoelace formula)
    pub fn contour_area(points: &[Point<i32>]) -> f64 {
        if points.len() < MIN_FIT_POINTS {
            return 0.0;
        }

        let mut twice_area: i64 = 0;
        for (i, p) in points.iter().enumerate() {
            let q = points[(i + 1) % points.len()];
            twice_area += i64::from(p.x) * i64::from(q.y) - i64::from(q.x) * i64::from(p.y);
        }

        twice_area.abs() as f64 / 2.0
    }

    /// Corners of the minimum-area rectangle around `points`
    fn fit_rectangle(points: &[Point<i32>]) -> Vec<Point<i32>> {
        if points.len() < MIN_FIT_POINTS {
            // Degenerate contours: the points are their own rectangle
            return points.to_vec();
        }
        min_area_rect(points).to_vec()
    }

    fn axis_aligned_extent(corners: &[Point<i32>]) -> FrameEdges {
        let (mut left, mut right) = (i32::MAX, i32::MIN);
        let (mut top, mut bottom) = (i32::MAX, i32::MIN);
        for p in corners {
            left = left.min(p.x);
            right = right.max(p.x);
            top = top.min(p.y);
            bottom = bottom.max(p.y);
        }

        FrameEdges {
            left: f64::from(left),
            right: f64::from(right),
            top: f64::from(top),
            bottom: f64::from(bottom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::color_mask::{MASK_OFF, MASK_ON};
    use image::Luma;

    fn filled_rect(x0: u32, y0: u32, x1: u32, y1: u32) -> GrayImage {
        GrayImage::from_fn(100, 100, |x, y| {
            if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
                Luma([MASK_ON])
            } else {
                Luma([MASK_OFF])
            }
        })
    }

    fn near(actual: f64, expected: f64, tolerance: f64) -> bool {
        (actual - expected).abs() <= tolerance
    }

    #[test]
    fn test_empty_mask_fails() {
        let mask = GrayImage::new(50, 50);
        assert_eq!(
            RectangleSmoother::smooth(&mask),
            Err(FrameError::NoContoursFound)
        );
    }

    #[test]
    fn test_axis_aligned_rectangle() {
        let mask = filled_rect(20, 30, 80, 70);
        let edges = RectangleSmoother::smooth(&mask).unwrap();

        assert!(near(edges.left, 20.0, 1.0), "left={}", edges.left);
        assert!(near(edges.right, 79.0, 1.0), "right={}", edges.right);
        assert!(near(edges.top, 30.0, 1.0), "top={}", edges.top);
        assert!(near(edges.bottom, 69.0, 1.0), "bottom={}", edges.bottom);
    }

    #[test]
    fn test_outline_uses_outer_border() {
        // Hollow frame: the hole border must not win
        let mut mask = filled_rect(10, 10, 90, 90);
        for y in 14..86 {
            for x in 14..86 {
                mask.put_pixel(x, y, Luma([MASK_OFF]));
            }
        }
        let edges = RectangleSmoother::smooth(&mask).unwrap();
        assert!(near(edges.left, 10.0, 1.0));
        assert!(near(edges.right, 89.0, 1.0));
    }

    #[test]
    fn test_largest_contour_selected() {
        let mut mask = filled_rect(5, 5, 15, 15);
        for y in 40..90 {
            for x in 30..95 {
                mask.put_pixel(x, y, Luma([MASK_ON]));
            }
        }
        let edges = RectangleSmoother::smooth(&mask).unwrap();
        assert!(near(edges.left, 30.0, 1.0));
        assert!(near(edges.top, 40.0, 1.0));
    }

    #[test]
    fn test_rotated_square_extent() {
        // Diamond with half-diagonal 20 centered at (50, 50)
        let mask = GrayImage::from_fn(100, 100, |x, y| {
            let d = (x as i32 - 50).abs() + (y as i32 - 50).abs();
            if d <= 20 {
                Luma([MASK_ON])
            } else {
                Luma([MASK_OFF])
            }
        });
        let edges = RectangleSmoother::smooth(&mask).unwrap();
        assert!(near(edges.left, 30.0, 2.0), "left={}", edges.left);
        assert!(near(edges.right, 70.0, 2.0), "right={}", edges.right);
        assert!(near(edges.top, 30.0, 2.0), "top={}", edges.top);
        assert!(near(edges.bottom, 70.0, 2.0), "bottom={}", edges.bottom);
    }

    #[test]
    fn test_single_pixel_mask() {
        let mask = filled_rect(40, 40, 41, 41);
        let edges = RectangleSmoother::smooth(&mask).unwrap();
        assert_eq!(edges.left, 40.0);
        assert_eq!(edges.right, 40.0);
        assert_eq!(edges.width(), 0.0);
    }

    #[test]
    fn test_region_on_left_border() {
        let mask = filled_rect(0, 20, 30, 60);
        let edges = RectangleSmoother::smooth(&mask).unwrap();
        assert!(near(edges.left, 0.0, 1.0), "left={}", edges.left);
        assert!(near(edges.right, 29.0, 1.0), "right={}", edges.right);
        assert!(near(edges.top, 20.0, 1.0), "top={}", edges.top);
        assert!(near(edges.bottom, 59.0, 1.0), "bottom={}", edges.bottom);
    }

    #[test]
    fn test_region_filling_whole_mask() {
        let mask = filled_rect(0, 0, 100, 100);
        let contours = RectangleSmoother::external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert!(contours[0].points.iter().all(|p| (0..100).contains(&p.x) && (0..100).contains(&p.y)));

        let edges = RectangleSmoother::smooth(&mask).unwrap();
        assert!(near(edges.left, 0.0, 1.0));
        assert!(near(edges.top, 0.0, 1.0));
        assert!(near(edges.right, 99.0, 1.0));
        assert!(near(edges.bottom, 99.0, 1.0));
    }

    #[test]
    fn test_contour_points_in_mask_coordinates() {
        let mask = filled_rect(10, 10, 20, 20);
        let contours = RectangleSmoother::external_contours(&mask);
        assert_eq!(contours.len(), 1);
        let min_x = contours[0].points.iter().map(|p| p.x).min();
        let min_y = contours[0].points.iter().map(|p| p.y).min();
        assert_eq!((min_x, min_y), (Some(10), Some(10)));
    }

    #[test]
    fn test_contour_area_square() {
        let square = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert_eq!(RectangleSmoother::contour_area(&square), 100.0);
        assert_eq!(RectangleSmoother::contour_area(&square[..2]), 0.0);
    }
}
