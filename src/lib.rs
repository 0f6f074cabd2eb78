//! frame-bounds - Decorative frame detection for RGBA artwork
//!
//! Finds the near-uniformly colored rectangular frame around the meaningful
//! content of an image and returns the pixel rectangle to crop to.
//!
//! # Features
//!
//! - **Frame Detection** ([`frame`]) - Color masking, gradient projections,
//!   peak clustering and aspect-ratio inference
//! - **Batch Processing** ([`batch`]) - Continue-on-error processing of many
//!   images, parallel detection with rayon
//! - **Configuration** ([`config`]) - TOML configuration files with CLI overrides
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use frame_bounds::detect_frame_bounds;
//!
//! let image = image::open("card.png").unwrap();
//!
//! // Subclass artwork, projection strategy
//! let bounds = detect_frame_bounds(&image, false, false).unwrap();
//! println!("{}x{} at ({}, {})", bounds.width, bounds.height, bounds.x, bounds.y);
//! ```
//!
//! ## Using Builder Patterns
//!
//! ```rust
//! use frame_bounds::{DetectionStrategy, FrameOptions, FrameVariant};
//!
//! let options = FrameOptions::builder()
//!     .variant(FrameVariant::Class)
//!     .strategy(DetectionStrategy::Smoothing)
//!     .projection_fallback(true)
//!     .build();
//!
//! // Or use presets
//! let class = FrameOptions::class();
//! let smoothing = FrameOptions::smoothing();
//! ```
//!
//! # Architecture
//!
//! ```text
//! RGBA image -> ColorMasker -> MaskCleaner -> RectangleSmoother ----------------------------> BoundsFinalizer
//!                                        \-> ProjectionAnalyzer -> PeakClusterer -> EdgeAssembler -/
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod frame;

// Re-exports for convenience
pub use batch::{
    detect_many, format_line, process_all, BatchError, BatchReport, BoundsSink, FrameSource,
    ItemResult, LineSink, MemorySource, PathSource,
};
pub use cli::{Cli, Commands, DetectArgs, ExitCode, ShowConfigArgs, VariantArg};
pub use config::{CliOverrides, Config, ConfigError};
pub use frame::{
    detect_frame_bounds, BoundingBox, BoundsFinalizer, ColorMasker, DetectionStrategy,
    EdgeAssembler, EdgeCandidates, FrameAnalysis, FrameBoundsDetector, FrameEdges, FrameError,
    FrameOptions, FrameOptionsBuilder, FrameVariant, HsvColor, HsvRange, HsvTolerance,
    MaskCleaner, PeakAnalysis, PeakClusterer, PeakOptions, ProjectionAnalyzer,
    RectangleSmoother,
};
