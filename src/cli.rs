//! CLI interface module
//!
//! Provides command-line interface using clap derive macros.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::CliOverrides;
use crate::frame::{DetectionStrategy, FrameVariant};

/// Exit codes for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Every image succeeded
    Success = 0,
    /// Unexpected failure (unreadable config, broken output)
    GeneralError = 1,
    /// Invalid arguments or configuration values
    InvalidArgs = 2,
    /// An input file does not exist
    InputNotFound = 3,
    /// At least one image failed detection
    ProcessingError = 5,
}

impl ExitCode {
    /// Convert to process exit code
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Get human-readable description
    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::InvalidArgs => "Invalid arguments",
            ExitCode::InputNotFound => "Input file not found",
            ExitCode::ProcessingError => "Processing error",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.code()
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code() as u8)
    }
}

/// Detect decorative frame bounds in RGBA images
#[derive(Parser, Debug)]
#[command(name = "frame-bounds")]
#[command(version)]
#[command(about = "Detect decorative frame bounds in RGBA images", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect the frame bounding box of each image
    Detect(DetectArgs),
    /// Print the effective configuration as TOML
    ShowConfig(ShowConfigArgs),
}

/// Frame family selectable on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantArg {
    /// Class artwork (1.57 / 1.16)
    Class,
    /// Subclass artwork (1.65 / 0.55)
    Subclass,
}

impl From<VariantArg> for FrameVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Class => FrameVariant::Class,
            VariantArg::Subclass => FrameVariant::Subclass,
        }
    }
}

/// Arguments for the detect command
#[derive(clap::Args, Debug)]
pub struct DetectArgs {
    /// Input image files (must carry an alpha channel)
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Frame family
    #[arg(long, value_enum)]
    pub variant: Option<VariantArg>,

    /// Custom frame height / width ratio
    #[arg(long, conflicts_with = "variant")]
    pub ratio: Option<f64>,

    /// Use the minimum-area rectangle strategy
    #[arg(long)]
    pub smooth: bool,

    /// Retry with projections when smoothing finds no contours
    #[arg(long)]
    pub fallback: bool,

    /// Reference frame color (#RRGGBB)
    #[arg(long)]
    pub color: Option<String>,

    /// Padding on every side in pixels
    #[arg(long)]
    pub padding: Option<u32>,

    /// Configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl DetectArgs {
    /// Values set on the command line, for merging over the config file.
    ///
    /// Flags that were not given stay unset so the file can provide them.
    pub fn overrides(&self) -> CliOverrides {
        let mut overrides = CliOverrides::new();
        if let Some(color) = &self.color {
            overrides = overrides.with_color(color.clone());
        }
        if let Some(padding) = self.padding {
            overrides = overrides.with_padding(padding);
        }
        if let Some(variant) = self.variant {
            overrides = overrides.with_variant(variant.into());
        }
        if let Some(ratio) = self.ratio {
            overrides = overrides.with_aspect_ratio(ratio);
        }
        if self.smooth {
            overrides = overrides.with_strategy(DetectionStrategy::Smoothing);
        }
        if self.fallback {
            overrides = overrides.with_projection_fallback(true);
        }
        overrides
    }
}

/// Arguments for the show-config command
#[derive(clap::Args, Debug)]
pub struct ShowConfigArgs {
    /// Configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}
