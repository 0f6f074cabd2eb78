//! Configuration file support for frame-bounds
//!
//! Supports TOML configuration files with the following search order:
//! 1. `--config <path>` - explicitly specified path
//! 2. `./frame-bounds.toml` - current directory
//! 3. `~/.config/frame-bounds/config.toml` - user config
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [mask]
//! color = "#B79461"
//! hue_tolerance = 3
//! alpha_threshold = 127
//!
//! [peaks]
//! peak_threshold = 0.1
//! fallback_threshold = 0.5
//!
//! [bounds]
//! padding = 2
//!
//! [detection]
//! variant = "class"
//! strategy = "projection"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::frame::{parse_hex_rgb, DetectionStrategy, FrameOptions, FrameVariant};

/// Config file name looked up in the current directory
const LOCAL_CONFIG_FILE: &str = "frame-bounds.toml";

/// Directory name under the user config directory
const USER_CONFIG_DIR: &str = "frame-bounds";

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// File not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Values parse but make no sense for detection
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Color mask settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MaskConfig {
    /// Reference frame color (`#RRGGBB`)
    #[serde(default)]
    pub color: Option<String>,

    /// Hue tolerance (0-180 scale)
    #[serde(default)]
    pub hue_tolerance: Option<u8>,

    /// Saturation tolerance
    #[serde(default)]
    pub saturation_tolerance: Option<u8>,

    /// Value tolerance
    #[serde(default)]
    pub value_tolerance: Option<u8>,

    /// Minimum alpha (exclusive) for a pixel to count
    #[serde(default)]
    pub alpha_threshold: Option<u8>,

    /// Morphological closing radius
    #[serde(default)]
    pub closing_radius: Option<u8>,
}

/// Peak clustering settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PeaksConfig {
    #[serde(default)]
    pub smoothing_window: Option<usize>,

    #[serde(default)]
    pub peak_threshold: Option<f64>,

    #[serde(default)]
    pub fallback_threshold: Option<f64>,

    #[serde(default)]
    pub continuity_threshold: Option<f64>,

    #[serde(default)]
    pub min_distance_floor: Option<usize>,

    #[serde(default)]
    pub min_distance_ratio: Option<f64>,

    #[serde(default)]
    pub max_distance_floor: Option<usize>,

    #[serde(default)]
    pub max_distance_ratio: Option<f64>,

    #[serde(default)]
    pub max_clusters: Option<usize>,
}

/// Output box settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BoundsConfig {
    /// Padding on every side in pixels
    #[serde(default)]
    pub padding: Option<u32>,
}

/// Strategy and variant selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DetectionConfig {
    /// `class` or `subclass`
    #[serde(default)]
    pub variant: Option<FrameVariant>,

    /// Custom height / width ratio (overrides `variant`)
    #[serde(default)]
    pub aspect_ratio: Option<f64>,

    /// `projection` or `smoothing`
    #[serde(default)]
    pub strategy: Option<DetectionStrategy>,

    /// Retry with projections when smoothing finds no contours
    #[serde(default)]
    pub projection_fallback: Option<bool>,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Color mask settings
    #[serde(default)]
    pub mask: MaskConfig,

    /// Peak clustering settings
    #[serde(default)]
    pub peaks: PeaksConfig,

    /// Output box settings
    #[serde(default)]
    pub bounds: BoundsConfig,

    /// Strategy and variant selection
    #[serde(default)]
    pub detection: DetectionConfig,
}

impl Config {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the default search path
    ///
    /// Search order:
    /// 1. `./frame-bounds.toml`
    /// 2. `~/.config/frame-bounds/config.toml`
    /// 3. Default values (if no file found)
    pub fn load() -> Result<Self, ConfigError> {
        for path in Self::search_paths() {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load an explicit path if given, otherwise search the default locations
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Fully populated configuration describing `options`
    pub fn from_options(options: &FrameOptions) -> Self {
        let [r, g, b] = options.frame_color;
        let peaks = &options.peaks;
        let (variant, aspect_ratio) = match options.variant {
            FrameVariant::Custom(ratio) => (None, Some(ratio)),
            variant => (Some(variant), None),
        };

        Self {
            mask: MaskConfig {
                color: Some(format!("#{r:02X}{g:02X}{b:02X}")),
                hue_tolerance: Some(options.tolerance.hue),
                saturation_tolerance: Some(options.tolerance.saturation),
                value_tolerance: Some(options.tolerance.value),
                alpha_threshold: Some(options.alpha_threshold),
                closing_radius: Some(options.closing_radius),
            },
            peaks: PeaksConfig {
                smoothing_window: Some(peaks.smoothing_window),
                peak_threshold: Some(peaks.peak_threshold),
                fallback_threshold: Some(peaks.fallback_threshold),
                continuity_threshold: Some(peaks.continuity_threshold),
                min_distance_floor: Some(peaks.min_distance_floor),
                min_distance_ratio: Some(peaks.min_distance_ratio),
                max_distance_floor: Some(peaks.max_distance_floor),
                max_distance_ratio: Some(peaks.max_distance_ratio),
                max_clusters: Some(peaks.max_clusters),
            },
            bounds: BoundsConfig {
                padding: Some(options.padding),
            },
            detection: DetectionConfig {
                variant,
                aspect_ratio,
                strategy: Some(options.strategy),
                projection_fallback: Some(options.projection_fallback),
            },
        }
    }

    /// Convert to FrameOptions, starting from the defaults
    pub fn to_options(&self) -> Result<FrameOptions, ConfigError> {
        let mut options = FrameOptions::default();

        // Apply mask settings
        if let Some(color) = &self.mask.color {
            options.frame_color = parse_color(color)?;
        }
        if let Some(hue) = self.mask.hue_tolerance {
            options.tolerance.hue = hue;
        }
        if let Some(saturation) = self.mask.saturation_tolerance {
            options.tolerance.saturation = saturation;
        }
        if let Some(value) = self.mask.value_tolerance {
            options.tolerance.value = value;
        }
        if let Some(alpha) = self.mask.alpha_threshold {
            options.alpha_threshold = alpha;
        }
        if let Some(radius) = self.mask.closing_radius {
            options.closing_radius = radius;
        }

        // Apply peak settings
        let peaks = &mut options.peaks;
        if let Some(window) = self.peaks.smoothing_window {
            peaks.smoothing_window = window;
        }
        if let Some(threshold) = self.peaks.peak_threshold {
            peaks.peak_threshold = threshold;
        }
        if let Some(threshold) = self.peaks.fallback_threshold {
            peaks.fallback_threshold = threshold;
        }
        if let Some(threshold) = self.peaks.continuity_threshold {
            peaks.continuity_threshold = threshold;
        }
        if let Some(floor) = self.peaks.min_distance_floor {
            peaks.min_distance_floor = floor;
        }
        if let Some(ratio) = self.peaks.min_distance_ratio {
            peaks.min_distance_ratio = ratio;
        }
        if let Some(floor) = self.peaks.max_distance_floor {
            peaks.max_distance_floor = floor;
        }
        if let Some(ratio) = self.peaks.max_distance_ratio {
            peaks.max_distance_ratio = ratio;
        }
        if let Some(max) = self.peaks.max_clusters {
            peaks.max_clusters = max;
        }

        // Apply bounds settings
        if let Some(padding) = self.bounds.padding {
            options.padding = padding;
        }

        // Apply detection settings
        if let Some(variant) = self.detection.variant {
            options.variant = variant;
        }
        if let Some(ratio) = self.detection.aspect_ratio {
            options.variant = FrameVariant::Custom(ratio);
        }
        if let Some(strategy) = self.detection.strategy {
            options.strategy = strategy;
        }
        if let Some(fallback) = self.detection.projection_fallback {
            options.projection_fallback = fallback;
        }

        options
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(options)
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&self, cli: &CliOverrides) -> Result<FrameOptions, ConfigError> {
        let mut merged = self.clone();

        if let Some(color) = &cli.color {
            merged.mask.color = Some(color.clone());
        }
        if let Some(padding) = cli.padding {
            merged.bounds.padding = Some(padding);
        }
        if let Some(variant) = cli.variant {
            merged.detection.variant = Some(variant);
            merged.detection.aspect_ratio = None;
        }
        if let Some(ratio) = cli.aspect_ratio {
            merged.detection.aspect_ratio = Some(ratio);
        }
        if let Some(strategy) = cli.strategy {
            merged.detection.strategy = Some(strategy);
        }
        if let Some(fallback) = cli.projection_fallback {
            merged.detection.projection_fallback = Some(fallback);
        }

        merged.to_options()
    }

    /// Get config file search paths
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(USER_CONFIG_DIR).join("config.toml"));
        }

        paths
    }
}

fn parse_color(color: &str) -> Result<[u8; 3], ConfigError> {
    parse_hex_rgb(color).map_err(|e| ConfigError::Invalid(e.to_string()))
}

/// CLI override values for merging with config file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub color: Option<String>,
    pub padding: Option<u32>,
    pub variant: Option<FrameVariant>,
    pub aspect_ratio: Option<f64>,
    pub strategy: Option<DetectionStrategy>,
    pub projection_fallback: Option<bool>,
}

impl CliOverrides {
    /// Create new empty overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Set frame color override
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Set padding override
    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = Some(padding);
        self
    }

    /// Set variant override
    pub fn with_variant(mut self, variant: FrameVariant) -> Self {
        self.variant = Some(variant);
        self
    }

    /// Set aspect ratio override
    pub fn with_aspect_ratio(mut self, ratio: f64) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    /// Set strategy override
    pub fn with_strategy(mut self, strategy: DetectionStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Set projection fallback override
    pub fn with_projection_fallback(mut self, enabled: bool) -> Self {
        self.projection_fallback = Some(enabled);
        self
    }
}
