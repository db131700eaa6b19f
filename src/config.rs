//! Tool configuration.
//!
//! Handles loading, validating, and merging `panocube.toml`. Stock defaults
//! are overridden by a user file, and command-line flags override both.
//!
//! ## Config File Location
//!
//! `panocube.toml` in the current directory is picked up automatically.
//! `--config <file>` points at any other file (which must then exist).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! format = "tiff"          # tiff | png | jpeg
//! quality = 90             # JPEG quality (1-100)
//! naming = "letter"        # letter (_f) | word (_Front) | joined-word (Front)
//! equirect_suffix = ""     # stitched file = {prefix}{equirect_suffix}.{ext}
//!
//! [sizing]
//! multiple = 1             # round derived sizes to a multiple of this
//!
//! [processing]
//! max_processes = 4        # Max worker threads (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [output]
//! format = "png"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::faces::FaceNaming;
use crate::imaging::{Encoding, OutputFormat, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "panocube.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `panocube.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PanoConfig {
    pub output: OutputConfig,
    pub sizing: SizingConfig,
    pub processing: ProcessingConfig,
}

impl PanoConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if self.output.equirect_suffix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "output.equirect_suffix must not contain path separators".into(),
            ));
        }
        if self.sizing.multiple == 0 {
            return Err(ConfigError::Validation(
                "sizing.multiple must be at least 1".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// How output files are named and encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// JPEG quality; ignored by lossless formats.
    pub quality: u32,
    /// Face tag scheme for projector output.
    pub naming: FaceNaming,
    /// Appended to the face-set prefix for stitched output.
    pub equirect_suffix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            quality: Quality::default().value(),
            naming: FaceNaming::default(),
            equirect_suffix: String::new(),
        }
    }
}

impl OutputConfig {
    pub fn encoding(&self) -> Encoding {
        Encoding {
            format: self.format,
            quality: Quality::new(self.quality),
        }
    }
}

/// Size derivation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizingConfig {
    /// Derived face and canvas sizes are rounded to a multiple of this.
    pub multiple: u32,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self { multiple: 1 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of worker threads. Omit for auto (= number of CPU cores).
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PanoConfig::default()).expect("default config must serialize")
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

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<PanoConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PanoConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

fn read_toml(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load `panocube.toml` from `dir` if present, else the stock defaults.
pub fn load_config(dir: &Path) -> Result<PanoConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    let overlay = if path.exists() {
        Some(read_toml(&path)?)
    } else {
        None
    };
    resolve_config(overlay)
}

/// Load an explicitly named config file. A missing file is an error.
pub fn load_config_file(path: &Path) -> Result<PanoConfig, ConfigError> {
    resolve_config(Some(read_toml(path)?))
}

/// Returns a fully-commented stock `panocube.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# panocube configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# panocube reads ./panocube.toml, or the file given with --config.
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output files
# ---------------------------------------------------------------------------
[output]
# Container for cube faces and stitched panoramas: "tiff", "png" or "jpeg".
# TIFF and PNG are lossless and keep 16-bit sources at 16 bits.
format = "tiff"

# JPEG quality (1-100). Ignored for TIFF and PNG.
quality = 90

# Face tag scheme used when writing cube faces:
#   "letter"       pano_f  pano_b  pano_l  pano_r  pano_u  pano_d
#   "word"         pano_Front  pano_Back  ...  pano_Down
#   "joined-word"  panoFront  panoBack  ...  panoDown
# Stitching recognises all three regardless of this setting.
naming = "letter"

# Appended to the face-set prefix to name the stitched panorama:
#   ""                  -> pano.tif
#   "_equirectangular"  -> pano_equirectangular.tif
equirect_suffix = ""

# ---------------------------------------------------------------------------
# Size derivation
# ---------------------------------------------------------------------------
[sizing]
# Without an explicit size, faces are round(width / pi) and stitched
# panoramas round(face * pi) wide. Both are rounded to a multiple of this.
multiple = 1

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum worker threads. Omit to use all CPU cores.
# Values above the core count are clamped down.
# max_processes = 4
"##
}
