//! Batch processing
//!
//! Feeds many images through frame detection. Each image succeeds or fails
//! on its own; a failed image is reported to the sink and the batch moves on.
//!
//! - [`FrameSource`] supplies named images one at a time
//! - [`BoundsSink`] receives each image's bounding box or error
//! - [`process_all`] drives a source into a sink and counts the outcomes
//! - [`detect_many`] runs independent in-memory images in parallel

use image::DynamicImage;
use rayon::prelude::*;
use std::collections::VecDeque;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

use crate::frame::{BoundingBox, FrameBoundsDetector, FrameError, FrameOptions};

/// Errors for a single batch item
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BatchError {
    #[error("Failed to load image: {0}")]
    Load(String),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("Failed to write result: {0}")]
    Sink(String),
}

/// Outcome of one batch item
pub type ItemResult = std::result::Result<BoundingBox, BatchError>;

/// Supplier of named, decoded images
pub trait FrameSource {
    /// Next image and its name, `None` when exhausted
    fn next_image(&mut self) -> Option<(String, std::result::Result<DynamicImage, BatchError>)>;
}

/// Consumer of per-image results
pub trait BoundsSink {
    /// Receive the result for `name`
    fn accept(&mut self, name: &str, result: &ItemResult) -> std::result::Result<(), BatchError>;
}

/// Counts of a finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Images with a bounding box
    pub succeeded: usize,
    /// Images that failed to load or detect
    pub failed: usize,
}

impl BatchReport {
    /// Total images processed
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Check if every image succeeded
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

// ============================================================
// Sources
// ============================================================

/// Decodes image files from disk in order
#[derive(Debug, Default)]
pub struct PathSource {
    paths: VecDeque<PathBuf>,
}

impl PathSource {
    /// Create a source over `paths`
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }
}

impl FrameSource for PathSource {
    fn next_image(&mut self) -> Option<(String, std::result::Result<DynamicImage, BatchError>)> {
        let path = self.paths.pop_front()?;
        let image = image::open(&path).map_err(|e| BatchError::Load(e.to_string()));
        Some((path.display().to_string(), image))
    }
}

/// Serves already decoded images
#[derive(Debug, Default)]
pub struct MemorySource {
    images: VecDeque<(String, DynamicImage)>,
}

impl MemorySource {
    /// Create a source over named images
    pub fn new(images: impl IntoIterator<Item = (String, DynamicImage)>) -> Self {
        Self {
            images: images.into_iter().collect(),
        }
    }
}

impl FrameSource for MemorySource {
    fn next_image(&mut self) -> Option<(String, std::result::Result<DynamicImage, BatchError>)> {
        self.images
            .pop_front()
            .map(|(name, image)| (name, Ok(image)))
    }
}

// ============================================================
// Sinks
// ============================================================

/// Keeps every result in memory
impl BoundsSink for Vec<(String, ItemResult)> {
    fn accept(&mut self, name: &str, result: &ItemResult) -> std::result::Result<(), BatchError> {
        self.push((name.to_string(), result.clone()));
        Ok(())
    }
}

/// Writes one text line per result
pub struct LineSink<W: Write> {
    writer: W,
}

impl<W: Write> LineSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> BoundsSink for LineSink<W> {
    fn accept(&mut self, name: &str, result: &ItemResult) -> std::result::Result<(), BatchError> {
        writeln!(self.writer, "{}", format_line(name, result))
            .map_err(|e| BatchError::Sink(e.to_string()))
    }
}

/// Render a result as `<name>: x=.. y=.. width=.. height=..` or
/// `<name>: error: <message>`
pub fn format_line(name: &str, result: &ItemResult) -> String {
    match result {
        Ok(b) => format!(
            "{name}: x={} y={} width={} height={}",
            b.x, b.y, b.width, b.height
        ),
        Err(e) => format!("{name}: error: {e}"),
    }
}

// ============================================================
// Drivers
// ============================================================

/// Detect every image of `source` and hand the results to `sink`.
///
/// Per-image failures are counted and passed on; only a failing sink
/// stops the batch.
pub fn process_all<S, K>(
    source: &mut S,
    sink: &mut K,
    options: &FrameOptions,
) -> std::result::Result<BatchReport, BatchError>
where
    S: FrameSource + ?Sized,
    K: BoundsSink + ?Sized,
{
    let mut report = BatchReport::default();

    while let Some((name, image)) = source.next_image() {
        let result =
            image.and_then(|img| FrameBoundsDetector::detect(&img, options).map_err(BatchError::from));

        match &result {
            Ok(bounds) => {
                debug!(name = %name, ?bounds, "frame detected");
                report.succeeded += 1;
            }
            Err(e) => {
                warn!(name = %name, error = %e, "frame detection failed");
                report.failed += 1;
            }
        }

        sink.accept(&name, &result)?;
    }

    Ok(report)
}

/// Detect frames of independent images in parallel, preserving order
pub fn detect_many(
    images: &[DynamicImage],
    options: &FrameOptions,
) -> Vec<std::result::Result<BoundingBox, FrameError>> {
    images
        .par_iter()
        .map(|image| FrameBoundsDetector::detect(image, options))
        .collect()
}
