//! Processing configuration.
//!
//! Handles loading, validating, and merging an optional TOML config file.
//! Stock defaults are overridden by the user file, which is in turn
//! overridden by command-line flags (applied in `main.rs`).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! quality = 100             # Starting JPEG quality (60-100)
//! max_file_size = 8388608   # Byte ceiling per output file (8 MiB)
//! fit_size = false          # Keep aspect, scale to fit the byte budget
//!
//! [sharpening]
//! enabled = true
//! radius = 0.8              # Gaussian sigma in pixels
//! amount = 50               # Percent
//! threshold = 2             # Per-channel difference below which pixels are untouched
//!
//! [metadata]
//! keep = false              # Keep GPS + timestamps instead of stripping everything
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! [output]
//! max_file_size = 4194304
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Quality, Sharpening};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default ceiling: the platform's 8 MB upload limit.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 8 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Invalid size '{0}': expected bytes or a number with KB/MB/GB")]
    Size(String),
}

/// Configuration loaded from a TOML file.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrepConfig {
    /// Quality and size targets.
    pub output: OutputConfig,
    /// Screen sharpening.
    pub sharpening: SharpeningConfig,
    /// Metadata handling.
    pub metadata: MetadataConfig,
}

impl PrepConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let quality = self.output.quality;
        if !(Quality::FLOOR.value()..=Quality::MAX.value()).contains(&quality) {
            return Err(ConfigError::Validation(format!(
                "output.quality must be {}-{}, got {quality}",
                Quality::FLOOR,
                Quality::MAX
            )));
        }
        if self.output.max_file_size == 0 {
            return Err(ConfigError::Validation(
                "output.max_file_size must be greater than 0".into(),
            ));
        }
        let radius = self.sharpening.radius;
        if radius.is_nan() || radius <= 0.0 {
            return Err(ConfigError::Validation(
                "sharpening.radius must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Quality and size targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Starting quality for the fixed-geometry search.
    pub quality: u32,
    /// Byte ceiling per output file.
    pub max_file_size: u64,
    /// Preserve aspect and let the encoder scale to the byte budget.
    pub fit_size: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default().value(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            fit_size: false,
        }
    }
}

/// Screen sharpening settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SharpeningConfig {
    pub enabled: bool,
    pub radius: f32,
    pub amount: u32,
    pub threshold: u8,
}

impl Default for SharpeningConfig {
    fn default() -> Self {
        let screen = Sharpening::screen();
        Self {
            enabled: true,
            radius: screen.radius,
            amount: screen.amount,
            threshold: screen.threshold,
        }
    }
}

impl SharpeningConfig {
    /// Unsharp-mask parameters, or `None` when sharpening is off.
    pub fn params(&self) -> Option<Sharpening> {
        self.enabled.then_some(Sharpening {
            radius: self.radius,
            amount: self.amount,
            threshold: self.threshold,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    /// Keep the GPS + timestamp allow-list instead of stripping everything.
    pub keep: bool,
}

// =============================================================================
// Size parsing
// =============================================================================

/// Parse a human byte size: `8388608`, `500KB`, `8MB`, `2.5MiB`, `1 GB`.
///
/// Units are case-insensitive and binary (1 KB = 1024 bytes), with or
/// without the `i`.
pub fn parse_size(input: &str) -> Result<u64, ConfigError> {
    let trimmed = input.trim();
    let invalid = || ConfigError::Size(input.to_string());

    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);
    let multiplier: u64 = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" | "kib" => 1024,
        "m" | "mb" | "mib" => 1024 * 1024,
        "g" | "gb" | "gib" => 1024 * 1024 * 1024,
        _ => return Err(invalid()),
    };

    let value: f64 = number.parse().map_err(|_| invalid())?;
    let bytes = (value * multiplier as f64).round();
    if !bytes.is_finite() || bytes < 1.0 || bytes > u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(bytes as u64)
}

/// `value_parser` adapter for clap.
pub fn parse_size_arg(input: &str) -> Result<u64, String> {
    parse_size(input).map_err(|e| e.to_string())
}

// =============================================================================
// Loading
// =============================================================================

/// Stock defaults as a TOML value tree, the base layer for merging.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(PrepConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<PrepConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PrepConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path`, or the stock defaults when `path` is `None`.
///
/// An explicitly named file that does not exist is an error.
pub fn load_config(path: Option<&Path>) -> Result<PrepConfig, ConfigError> {
    let overlay = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        None => None,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by `--gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# insta-prep configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags override them.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Starting JPEG quality (60-100). Lowered in steps of 5 until the file fits
# under max_file_size, never below 60.
quality = 100

# Byte ceiling per output file. 8388608 is the 8 MB upload limit.
max_file_size = 8388608

# Keep the original aspect ratio and scale down to fit max_file_size instead
# of cropping/resizing to 1080x1350 / 1350px / 1080x1080.
fit_size = false

# ---------------------------------------------------------------------------
# Sharpening for phone screens (unsharp mask)
# ---------------------------------------------------------------------------
[sharpening]
# Disable if images are already sharpened for output in your editor.
enabled = true
# Gaussian blur sigma in pixels.
radius = 0.8
# Strength in percent.
amount = 50
# Per-channel differences below this are left untouched.
threshold = 2

# ---------------------------------------------------------------------------
# Metadata
# ---------------------------------------------------------------------------
[metadata]
# false: strip all EXIF. true: keep GPS and DateTime tags only.
keep = false
"##
}
