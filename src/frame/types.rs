//! Frame module core types
//!
//! Contains the error type and the small value types passed between the
//! detection stages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================
// Error Types
// ============================================================

/// Frame detection error types
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrameError {
    #[error("Image has no alpha channel")]
    NoAlphaChannel,

    #[error("No contours found in frame mask")]
    NoContoursFound,

    #[error("Insufficient frame edges: {top_bottom} top/bottom and {left_right} left/right candidates")]
    InsufficientEdges {
        top_bottom: usize,
        left_right: usize,
    },

    #[error("Image has zero dimensions")]
    EmptyImage,

    #[error("Detected bounds have no area")]
    DegenerateBounds,

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

pub type Result<T> = std::result::Result<T, FrameError>;

// ============================================================
// Frame Variants & Strategies
// ============================================================

/// Frame height of the class artwork family (in card units)
const CLASS_FRAME_HEIGHT: f64 = 1.57;

/// Frame width of the class artwork family
const CLASS_FRAME_WIDTH: f64 = 1.16;

/// Frame height of the subclass artwork family
const SUBCLASS_FRAME_HEIGHT: f64 = 1.65;

/// Frame width of the subclass artwork family
const SUBCLASS_FRAME_WIDTH: f64 = 0.55;

/// Known frame families, each with a fixed expected aspect ratio.
///
/// The ratio is always frame height divided by frame width.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameVariant {
    /// Subclass artwork (tall, 3:1)
    #[default]
    Subclass,
    /// Class artwork (≈1.353:1)
    Class,
    /// Caller supplied height/width ratio
    Custom(f64),
}

impl FrameVariant {
    /// Select a variant from the alternate-variant flag
    pub fn from_alternate(is_alternate: bool) -> Self {
        if is_alternate {
            FrameVariant::Class
        } else {
            FrameVariant::Subclass
        }
    }

    /// Expected frame height / frame width
    pub fn aspect_ratio(&self) -> f64 {
        match self {
            FrameVariant::Class => CLASS_FRAME_HEIGHT / CLASS_FRAME_WIDTH,
            FrameVariant::Subclass => SUBCLASS_FRAME_HEIGHT / SUBCLASS_FRAME_WIDTH,
            FrameVariant::Custom(ratio) => *ratio,
        }
    }
}

/// Localization strategy run after the mask has been cleaned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionStrategy {
    /// Gradient projections, peak clustering and aspect-ratio inference
    #[default]
    Projection,
    /// Minimum-area rectangle around the largest contour
    Smoothing,
}

impl DetectionStrategy {
    /// Select a strategy from the smoothing flag
    pub fn from_smoothing(use_smoothing: bool) -> Self {
        if use_smoothing {
            DetectionStrategy::Smoothing
        } else {
            DetectionStrategy::Projection
        }
    }
}

// ============================================================
// Geometry
// ============================================================

/// Final crop rectangle in image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Create a bounding box
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Area in pixels
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Height divided by width
    pub fn aspect_ratio(&self) -> f64 {
        if self.width == 0 {
            return 0.0;
        }
        f64::from(self.height) / f64::from(self.width)
    }

    /// Check the box has positive area and lies inside a `width` x `height` image
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.width > 0 && self.height > 0 && self.right() <= width && self.bottom() <= height
    }

    /// Horizontal offset of the box center from the image center, as a
    /// percentage of half the image width, rounded to one decimal place.
    ///
    /// Positive values mean the content sits left of center.
    pub fn horizontal_offset_percent(&self, image_width: u32) -> f64 {
        if image_width == 0 {
            return 0.0;
        }
        let image_center = f64::from(image_width) / 2.0;
        let content_center = f64::from(self.x) + f64::from(self.width) / 2.0;
        let percent = (image_center - content_center) / image_center * 100.0;
        (percent * 10.0).round() / 10.0
    }
}

/// Candidate edge positions found by the projection strategy.
///
/// `top_bottom` holds row indices, `left_right` holds column indices,
/// each sorted ascending. Edge assembly only needs positions; the score of
/// each candidate is kept in the per-axis `PeakAnalysis` of a
/// `FrameAnalysis` (see `PeakAnalysis::scored_positions`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeCandidates {
    pub top_bottom: Vec<usize>,
    pub left_right: Vec<usize>,
}

impl EdgeCandidates {
    /// Total candidates over both axes
    pub fn total(&self) -> usize {
        self.top_bottom.len() + self.left_right.len()
    }
}

/// Raw frame edges before clamping and padding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameEdges {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl FrameEdges {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}
