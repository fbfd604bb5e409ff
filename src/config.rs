//! Tool configuration module.
//!
//! Handles loading, validating, and merging `rasterkit.toml`. Stock defaults
//! are overridden by whatever the user's file specifies; the file may be
//! sparse.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [export]
//! jpeg_quality = 90         # 1-100
//! bmp_compression = false   # RLE request (palette images only)
//! wbmp_index = 0            # 0xRRGGBB color written as WBMP black
//! allow_overwrite = false   # replace existing output files
//!
//! [resize]
//! smoothing = true          # false = nearest-neighbour always
//!
//! [text]
//! fonts = []                # font files, tried in order
//! size = 12.0               # points
//! color = "#000000"
//!
//! [processing]
//! max_processes = 4         # batch workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::color::Color;
use crate::format::ExportableFormat;
use crate::params::Quality;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up by [`load_config`].
pub const CONFIG_FILE: &str = "rasterkit.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `rasterkit.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Encoder settings for written files.
    pub export: ExportConfig,
    /// Resampling settings.
    pub resize: ResizeConfig,
    /// Defaults for the `text` command.
    pub text: TextConfig,
    /// Parallel batch settings.
    pub processing: ProcessingConfig,
}

impl ToolConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.export.jpeg_quality) {
            return Err(ConfigError::Validation(
                "export.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.export.wbmp_index > 0xff_ffff {
            return Err(ConfigError::Validation(
                "export.wbmp_index must be a 0xRRGGBB value".into(),
            ));
        }
        if !(self.text.size.is_finite() && self.text.size > 0.0) {
            return Err(ConfigError::Validation(
                "text.size must be a positive number".into(),
            ));
        }
        Color::from_hex(&self.text.color)
            .map_err(|e| ConfigError::Validation(format!("text.color: {e}")))?;
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// JPEG quality as a [`Quality`].
    pub fn quality(&self) -> Quality {
        Quality::new(self.export.jpeg_quality)
    }

    /// Export format for an extension, with this config's encoder parameters.
    pub fn export_format(&self, ext: &str) -> Option<ExportableFormat> {
        let format = match ExportableFormat::from_extension(ext, self.quality())? {
            ExportableFormat::Bmp { .. } => ExportableFormat::Bmp {
                compression: self.export.bmp_compression,
            },
            ExportableFormat::Wbmp { .. } => ExportableFormat::Wbmp {
                index: self.export.wbmp_index,
            },
            other => other,
        };
        Some(format)
    }
}

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// JPEG quality (1 = worst, 100 = best).
    pub jpeg_quality: u32,
    /// Ask the BMP encoder for RLE. Only palette images compress.
    pub bmp_compression: bool,
    /// Color (`0xRRGGBB`) written as black in WBMP output.
    pub wbmp_index: u32,
    /// Replace output files that already exist.
    pub allow_overwrite: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            bmp_compression: false,
            wbmp_index: 0,
            allow_overwrite: false,
        }
    }
}

/// Resampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    /// Use smoothing filters; when false every resize is nearest-neighbour.
    pub smoothing: bool,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self { smoothing: true }
    }
}

/// Text rendering defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextConfig {
    /// Font files, tried in order until one loads.
    pub fonts: Vec<PathBuf>,
    /// Size in points.
    pub size: f64,
    /// Hex color.
    pub color: String,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            fonts: Vec::new(),
            size: 12.0,
            color: "#000000".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel batch workers.
    /// When absent, defaults to the number of CPU cores.
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

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ToolConfig::default()).expect("default config must serialize")
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

/// Load `rasterkit.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ToolConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `rasterkit.toml` in the given directory, falling back to
/// stock defaults for anything it leaves out.
pub fn load_config(dir: &Path) -> Result<ToolConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Returns a fully-commented stock `rasterkit.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# rasterkit configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[export]
# JPEG quality (1 = worst, 100 = best). Other formats are lossless.
jpeg_quality = 90

# Request RLE for BMP output. BMP only compresses palette images, so
# truecolor output is written uncompressed either way.
bmp_compression = false

# Color (0xRRGGBB, as an integer) written as black in WBMP output.
# Every other color becomes white.
wbmp_index = 0

# Replace output files that already exist.
allow_overwrite = false

# ---------------------------------------------------------------------------
# Resampling
# ---------------------------------------------------------------------------
[resize]
# Smooth resizes pick sinc when shrinking and a cubic when enlarging.
# Set to false for nearest-neighbour everywhere.
smoothing = true

# ---------------------------------------------------------------------------
# Text
# ---------------------------------------------------------------------------
[text]
# TrueType/OpenType files, tried in order until one loads.
fonts = []

# Size in points (96 dpi).
size = 12.0

# Hex color: rgb, rgba, rrggbb or rrggbbaa, with or without '#'.
color = "#000000"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for the batch command.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) {
        fs::write(dir.join(CONFIG_FILE), content).unwrap();
    }

    #[test]
    fn default_config_values() {
        let config = ToolConfig::default();
        assert_eq!(config.export.jpeg_quality, 90);
        assert!(!config.export.allow_overwrite);
        assert!(config.resize.smoothing);
        assert_eq!(config.text.size, 12.0);
        assert_eq!(config.text.color, "#000000");
        assert!(config.text.fonts.is_empty());
    }

    #[test]
    fn parse_partial_config() {
        let config: ToolConfig = toml::from_str(
            r#"
[export]
jpeg_quality = 70
"#,
        )
        .unwrap();
        assert_eq!(config.export.jpeg_quality, 70);
        // untouched sections keep defaults
        assert!(config.resize.smoothing);
        assert!(!config.export.bmp_compression);
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, ToolConfig::default());
    }

    #[test]
    fn load_config_full_config() {
        let tmp = TempDir::new().unwrap();
        write_config(
            tmp.path(),
            r##"
[export]
jpeg_quality = 55
bmp_compression = true
wbmp_index = 0xff0000
allow_overwrite = true

[resize]
smoothing = false

[text]
fonts = ["/fonts/a.ttf", "/fonts/b.otf"]
size = 18.5
color = "#ff000080"

[processing]
max_processes = 2
"##,
        );

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.export.jpeg_quality, 55);
        assert!(config.export.bmp_compression);
        assert_eq!(config.export.wbmp_index, 0xff0000);
        assert!(config.export.allow_overwrite);
        assert!(!config.resize.smoothing);
        assert_eq!(config.text.fonts.len(), 2);
        assert_eq!(config.text.size, 18.5);
        assert_eq!(config.processing.max_processes, Some(2));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "this is not valid toml [[[");
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "[export]\njpeg_qualty = 50\n");
        assert!(load_config(tmp.path()).is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<ToolConfig, _> = toml::from_str("[fonts]\nsize = 3\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // validation
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(ToolConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_quality_bounds() {
        let mut config = ToolConfig::default();
        config.export.jpeg_quality = 100;
        assert!(config.validate().is_ok());
        config.export.jpeg_quality = 0;
        assert!(config.validate().is_err());
        config.export.jpeg_quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_text_color() {
        let mut config = ToolConfig::default();
        config.text.color = "#zzz".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("text.color"));
    }

    #[test]
    fn validate_text_size_and_wbmp_index() {
        let mut config = ToolConfig::default();
        config.text.size = 0.0;
        assert!(config.validate().is_err());

        let mut config = ToolConfig::default();
        config.export.wbmp_index = 0x1_000_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_zero_workers() {
        let mut config = ToolConfig::default();
        config.processing.max_processes = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "[export]\njpeg_quality = 500\n");
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    // =========================================================================
    // export_format
    // =========================================================================

    #[test]
    fn export_format_applies_encoder_settings() {
        let mut config = ToolConfig::default();
        config.export.jpeg_quality = 40;
        config.export.bmp_compression = true;
        config.export.wbmp_index = 0x00ff00;

        assert_eq!(
            config.export_format("jpeg"),
            Some(ExportableFormat::Jpeg {
                quality: Quality::new(40)
            })
        );
        assert_eq!(
            config.export_format("BMP"),
            Some(ExportableFormat::Bmp { compression: true })
        );
        assert_eq!(
            config.export_format("wbmp"),
            Some(ExportableFormat::Wbmp { index: 0x00ff00 })
        );
        assert_eq!(config.export_format("png"), Some(ExportableFormat::Png));
        assert_eq!(config.export_format("heic"), None);
    }

    // =========================================================================
    // merge / processing
    // =========================================================================

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_scalar_override() {
        let merged = merge_toml(toml::Value::Integer(1), toml::Value::Integer(2));
        assert_eq!(merged.as_integer(), Some(2));
    }

    #[test]
    fn resolve_config_with_no_overlay() {
        let config = resolve_config(stock_defaults_value(), None).unwrap();
        assert_eq!(config, ToolConfig::default());
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: ToolConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, ToolConfig::default());
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let value = stock_defaults_value();
        let table = value.as_table().unwrap();
        for section in ["export", "resize", "text", "processing"] {
            assert!(table.contains_key(section), "missing [{section}]");
        }
    }
}
