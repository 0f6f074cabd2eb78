//! Edge assembly
//!
//! Combines the candidate edge positions of both axes into one rectangle.
//! When only one edge of an axis was found, the missing one is inferred from
//! the span of the other axis and the expected frame aspect ratio.
//!
//! # Decision order
//!
//! 1. ≥2 top/bottom and ≥1 left/right: top/bottom are the outermost rows;
//!    a lone column is a left edge when it lies left of the image midline,
//!    otherwise a right edge, and the other side sits `height / ratio` away
//! 2. ≥2 left/right and ≥1 top/bottom: the same with the axes swapped
//!    (`height = width * ratio`, split on the horizontal midline)
//! 3. Anything else cannot pin down a rectangle and fails

use tracing::debug;

use super::types::{EdgeCandidates, FrameEdges, FrameError, Result};

/// Assembles frame edges from per-axis candidates
pub struct EdgeAssembler;

impl EdgeAssembler {
    /// Build raw frame edges.
    ///
    /// `ratio` is the expected frame height divided by frame width.
    /// The result is neither clamped nor padded.
    pub fn assemble(
        candidates: &EdgeCandidates,
        ratio: f64,
        image_width: u32,
        image_height: u32,
    ) -> Result<FrameEdges> {
        let rows = &candidates.top_bottom;
        let columns = &candidates.left_right;

        let edges = match (Self::outermost(rows), Self::outermost(columns)) {
            (Some((top, bottom)), Some((left, right))) if rows.len() >= 2 && columns.len() >= 2 => {
                FrameEdges {
                    left,
                    right,
                    top,
                    bottom,
                }
            }
            (Some((top, bottom)), Some((column, _))) if rows.len() >= 2 => {
                let width = (bottom - top) / ratio;
                let (left, right) = Self::infer_span(column, width, image_width);
                debug!(column, inferred_width = width, "inferred missing column edge");
                FrameEdges {
                    left,
                    right,
                    top,
                    bottom,
                }
            }
            (Some((row, _)), Some((left, right))) if columns.len() >= 2 => {
                let height = (right - left) * ratio;
                let (top, bottom) = Self::infer_span(row, height, image_height);
                debug!(row, inferred_height = height, "inferred missing row edge");
                FrameEdges {
                    left,
                    right,
                    top,
                    bottom,
                }
            }
            _ => {
                return Err(FrameError::InsufficientEdges {
                    top_bottom: rows.len(),
                    left_right: columns.len(),
                })
            }
        };

        Ok(edges)
    }

    /// Smallest and largest candidate
    fn outermost(positions: &[usize]) -> Option<(f64, f64)> {
        let min = positions.iter().min()?;
        let max = positions.iter().max()?;
        Some((*min as f64, *max as f64))
    }

    /// Place a lone edge at `position` and infer the opposite one `extent` away.
    ///
    /// Edges in the first half of the axis open towards larger indices.
    fn infer_span(position: f64, extent: f64, axis_len: u32) -> (f64, f64) {
        if position < f64::from(axis_len) / 2.0 {
            (position, position + extent)
        } else {
            (position - extent, position)
        }
    }
}
