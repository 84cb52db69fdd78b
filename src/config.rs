//! Tool configuration module.
//!
//! Handles loading, validating, and merging `binimage.toml`. Stock defaults
//! are the base layer; a user file overrides any subset of them.
//!
//! ## Config File Location
//!
//! `binimage` reads `binimage.toml` from the working directory, or the file
//! passed with `--config`. Without either, the stock defaults apply.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [binary]                  # to_binary / crop-border --binary
//! gray_levels = 64          # Gray tones kept before dithering (2-256)
//! quantize_dither = "none"  # "none" or "floyd-steinberg"
//! threshold_map = "checks"  # threshold, checks, o2x2, o3x3, o4x4, o8x8
//!
//! [fit]
//! max_width = 1024
//! max_height = 1024
//!
//! [level]
//! black_point = 0.0
//! white_point = 255.0
//! gamma = 1.0
//!
//! [quantize]
//! colors = 64
//! colorspace = "gray"       # "gray" or "rgb"
//! dither = "none"
//! tree_depth = 0            # 0 = automatic, otherwise 1-8
//! measure_error = false
//!
//! [logging]
//! level = "warn"            # tracing filter directive
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse, override just the values you want:
//!
//! ```toml
//! [binary]
//! threshold_map = "o8x8"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{
    BinaryOptions, Colorspace, DitherMethod, LevelParams, QuantizeParams, ThresholdMap,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "binimage.toml";

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
}

/// Configuration loaded from `binimage.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Defaults for binarization.
    pub binary: BinaryConfig,
    /// Bounds used by `fit` when none are given on the command line.
    pub fit: FitConfig,
    pub level: LevelConfig,
    pub quantize: QuantizeConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=256).contains(&self.binary.gray_levels) {
            return Err(ConfigError::Validation(
                "binary.gray_levels must be 2-256".into(),
            ));
        }
        if !(2..=256).contains(&self.quantize.colors) {
            return Err(ConfigError::Validation(
                "quantize.colors must be 2-256".into(),
            ));
        }
        if self.quantize.tree_depth > 8 {
            return Err(ConfigError::Validation(
                "quantize.tree_depth must be 0-8".into(),
            ));
        }
        if !(self.level.gamma.is_finite() && self.level.gamma > 0.0) {
            return Err(ConfigError::Validation(
                "level.gamma must be positive".into(),
            ));
        }
        if self.fit.max_width == 0 || self.fit.max_height == 0 {
            return Err(ConfigError::Validation(
                "fit.max_width and fit.max_height must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Binarization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BinaryConfig {
    pub gray_levels: u32,
    pub quantize_dither: DitherMethod,
    pub threshold_map: ThresholdMap,
}

impl Default for BinaryConfig {
    fn default() -> Self {
        let options = BinaryOptions::default();
        Self {
            gray_levels: options.gray_levels,
            quantize_dither: options.quantize_dither,
            threshold_map: options.threshold_map,
        }
    }
}

impl BinaryConfig {
    pub fn options(&self) -> BinaryOptions {
        BinaryOptions {
            gray_levels: self.gray_levels,
            quantize_dither: self.quantize_dither,
            threshold_map: self.threshold_map,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FitConfig {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_width: 1024,
            max_height: 1024,
        }
    }
}

/// Tone curve applied by `level_in_place`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LevelConfig {
    pub black_point: f64,
    pub white_point: f64,
    pub gamma: f64,
}

impl Default for LevelConfig {
    fn default() -> Self {
        let params = LevelParams::default();
        Self {
            black_point: params.black_point,
            white_point: params.white_point,
            gamma: params.gamma,
        }
    }
}

impl LevelConfig {
    pub fn params(&self) -> LevelParams {
        LevelParams {
            black_point: self.black_point,
            white_point: self.white_point,
            gamma: self.gamma,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuantizeConfig {
    pub colors: u32,
    pub colorspace: Colorspace,
    pub dither: DitherMethod,
    pub tree_depth: u32,
    pub measure_error: bool,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        let params = QuantizeParams::default();
        Self {
            colors: params.colors,
            colorspace: params.colorspace,
            dither: params.dither,
            tree_depth: params.tree_depth,
            measure_error: params.measure_error,
        }
    }
}

impl QuantizeConfig {
    pub fn params(&self) -> QuantizeParams {
        QuantizeParams {
            colors: self.colors,
            colorspace: self.colorspace,
            dither: self.dither,
            tree_depth: self.tree_depth,
            measure_error: self.measure_error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Config::default())?)
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

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<Config, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config.
///
/// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] in the
/// working directory is used if present.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(toml::from_str(&fs::read_to_string(path)?)?),
        None => load_raw_config(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `binimage.toml` with all keys and
/// explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# binimage Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# binimage reads ./binimage.toml, or the file given with --config.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Binarization (binarize, crop-border --binary)
# ---------------------------------------------------------------------------
[binary]
# Gray tones kept by the quantize step before dithering (2-256).
gray_levels = 64

# Error diffusion during the quantize step: "none" or "floyd-steinberg".
quantize_dither = "none"

# Ordered-dither pattern for the gray -> black/white step.
# One of: threshold, checks, o2x2, o3x3, o4x4, o8x8.
threshold_map = "checks"

# ---------------------------------------------------------------------------
# Fit (fit command defaults)
# ---------------------------------------------------------------------------
[fit]
max_width = 1024
max_height = 1024

# ---------------------------------------------------------------------------
# Level (level_in_place defaults)
# ---------------------------------------------------------------------------
[level]
# Input values mapped to black and white. black_point > white_point inverts.
black_point = 0.0
white_point = 255.0
gamma = 1.0

# ---------------------------------------------------------------------------
# Quantize (quantize_in_place defaults)
# ---------------------------------------------------------------------------
[quantize]
colors = 64

# "gray" or "rgb".
colorspace = "gray"
dither = "none"

# 0 picks the depth automatically; 1-8 caps tones per channel at 2^depth.
tree_depth = 0

# Log the mean per-pixel error after quantizing.
measure_error = false

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# tracing filter directive, e.g. "info" or "binimage=debug".
# RUST_LOG overrides this; --verbose forces binimage=debug.
level = "warn"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn default_config_matches_library_defaults() {
        let config = Config::default();
        assert_eq!(config.binary.options(), BinaryOptions::default());
        assert_eq!(config.level.params(), LevelParams::default());
        assert_eq!(config.quantize.params(), QuantizeParams::default());
        assert_eq!((config.fit.max_width, config.fit.max_height), (1024, 1024));
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn parse_partial_config() {
        let config = resolve_config(Some(
            toml::from_str(
                r#"
                [binary]
                threshold_map = "o8x8"
                "#,
            )
            .unwrap(),
        ))
        .unwrap();

        assert_eq!(config.binary.threshold_map, ThresholdMap::O8x8);
        assert_eq!(config.binary.gray_levels, 64);
        assert_eq!(config.fit, FitConfig::default());
    }

    #[test]
    fn parse_enum_spellings() {
        let config: Config = toml::from_str(
            r#"
            [binary]
            quantize_dither = "floyd-steinberg"

            [quantize]
            colorspace = "rgb"
            "#,
        )
        .unwrap();

        assert_eq!(config.binary.quantize_dither, DitherMethod::FloydSteinberg);
        assert_eq!(config.quantize.colorspace, Colorspace::Rgb);
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let config = resolve_config(None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_config_reads_explicit_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            r#"
            [fit]
            max_width = 640

            [logging]
            level = "debug"
            "#,
        );

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.fit.max_width, 640);
        assert_eq!(config.fit.max_height, 1024);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn load_config_missing_explicit_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_raw_config_missing_file_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(
            load_raw_config(&tmp.path().join(DEFAULT_CONFIG_FILE))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[binary\ngray_levels = ");
        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn unknown_key_rejected() {
        let result = resolve_config(Some(
            toml::from_str("[binary]\ngray_level = 8\n").unwrap(),
        ));
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_section_rejected() {
        let result = resolve_config(Some(toml::from_str("[sharpen]\namount = 1\n").unwrap()));
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_threshold_map_rejected() {
        let result = resolve_config(Some(
            toml::from_str("[binary]\nthreshold_map = \"o5x5\"\n").unwrap(),
        ));
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validation_rejects_out_of_range_values() {
        let cases = [
            "[binary]\ngray_levels = 1\n",
            "[quantize]\ncolors = 300\n",
            "[quantize]\ntree_depth = 9\n",
            "[level]\ngamma = 0.0\n",
            "[fit]\nmax_height = 0\n",
        ];
        for case in cases {
            let result = resolve_config(Some(toml::from_str(case).unwrap()));
            assert!(
                matches!(result, Err(ConfigError::Validation(_))),
                "{case} should fail validation"
            );
        }
    }

    // =========================================================================
    // merge_toml
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value =
            toml::from_str("[fit]\nmax_width = 10\nmax_height = 20").unwrap();
        let overlay: toml::Value = toml::from_str("[fit]\nmax_height = 5").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["fit"]["max_width"].as_integer(), Some(10));
        assert_eq!(merged["fit"]["max_height"].as_integer(), Some(5));
    }

    // =========================================================================
    // Stock config
    // =========================================================================

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let config: Config = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, Config::default());
    }
}
