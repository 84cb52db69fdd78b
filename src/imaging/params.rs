//! Parameter types for image primitives.
//!
//! These types describe *what* a primitive should do. The
//! [`ImageHandle`](super::backend::ImageHandle) implementation decides *how*.
//!
//! ## Types
//!
//! - [`PixelMap`]: channel layout for `dispatch`/`constitute` (`RGB`, `RGBA`, `I`).
//! - [`Colorspace`]: target space for quantization (gray or RGB).
//! - [`DitherMethod`]: error diffusion applied while quantizing.
//! - [`ThresholdMap`]: ordered-dither pattern (`checks`, `o4x4`, ...).
//! - [`QuantizeParams`]: full quantize call, defaults to 64 gray tones.
//! - [`LevelParams`]: black point, white point and gamma for `level2`.
//! - [`BinaryOptions`]: the knobs of the two-stage binarization pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest value an 8-bit channel can hold.
pub const QUANTUM_RANGE: f64 = 255.0;

/// Default number of gray tones used when an image is quantized to grayscale.
pub const N_GRAY_COLORS: u32 = 64;

/// Error returned when a parameter name cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Channel layout of a flat pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelMap {
    #[default]
    Rgb,
    Rgba,
    /// Single intensity byte per pixel.
    Intensity,
}

impl PixelMap {
    pub fn channels(self) -> usize {
        match self {
            PixelMap::Rgb => 3,
            PixelMap::Rgba => 4,
            PixelMap::Intensity => 1,
        }
    }
}

impl FromStr for PixelMap {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RGB" => Ok(PixelMap::Rgb),
            "RGBA" => Ok(PixelMap::Rgba),
            "I" => Ok(PixelMap::Intensity),
            _ => Err(UnknownVariant {
                kind: "pixel map",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for PixelMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PixelMap::Rgb => "RGB",
            PixelMap::Rgba => "RGBA",
            PixelMap::Intensity => "I",
        })
    }
}

/// Color space an image is reduced into by `quantize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colorspace {
    #[default]
    Gray,
    Rgb,
}

impl FromStr for Colorspace {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gray" | "grey" | "grayscale" => Ok(Colorspace::Gray),
            "rgb" => Ok(Colorspace::Rgb),
            _ => Err(UnknownVariant {
                kind: "colorspace",
                value: s.to_string(),
            }),
        }
    }
}

/// Error-diffusion method used during color reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DitherMethod {
    #[default]
    None,
    FloydSteinberg,
}

impl FromStr for DitherMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "no" => Ok(DitherMethod::None),
            "floyd-steinberg" | "floydsteinberg" | "fs" => Ok(DitherMethod::FloydSteinberg),
            _ => Err(UnknownVariant {
                kind: "dither method",
                value: s.to_string(),
            }),
        }
    }
}

/// Ordered-dither pattern, named after the ImageMagick threshold maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMap {
    Threshold,
    #[default]
    Checks,
    O2x2,
    O3x3,
    O4x4,
    O8x8,
}

impl ThresholdMap {
    pub fn name(self) -> &'static str {
        match self {
            ThresholdMap::Threshold => "threshold",
            ThresholdMap::Checks => "checks",
            ThresholdMap::O2x2 => "o2x2",
            ThresholdMap::O3x3 => "o3x3",
            ThresholdMap::O4x4 => "o4x4",
            ThresholdMap::O8x8 => "o8x8",
        }
    }
}

impl FromStr for ThresholdMap {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "threshold" | "th" | "1x1" => Ok(ThresholdMap::Threshold),
            "checks" | "checkerboard" | "2x1" => Ok(ThresholdMap::Checks),
            "o2x2" | "2x2" => Ok(ThresholdMap::O2x2),
            "o3x3" | "3x3" => Ok(ThresholdMap::O3x3),
            "o4x4" | "4x4" => Ok(ThresholdMap::O4x4),
            "o8x8" | "8x8" => Ok(ThresholdMap::O8x8),
            _ => Err(UnknownVariant {
                kind: "threshold map",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ThresholdMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters for a `quantize` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizeParams {
    pub colors: u32,
    pub colorspace: Colorspace,
    pub dither: DitherMethod,
    /// 0 picks the depth automatically; 1..=8 caps tones per channel at `2^depth`.
    pub tree_depth: u32,
    pub measure_error: bool,
}

impl Default for QuantizeParams {
    fn default() -> Self {
        Self {
            colors: N_GRAY_COLORS,
            colorspace: Colorspace::Gray,
            dither: DitherMethod::None,
            tree_depth: 0,
            measure_error: false,
        }
    }
}

/// Parameters for a `level2` call. Black and white are never swapped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelParams {
    pub black_point: f64,
    pub white_point: f64,
    pub gamma: f64,
}

impl Default for LevelParams {
    fn default() -> Self {
        Self {
            black_point: 0.0,
            white_point: QUANTUM_RANGE,
            gamma: 1.0,
        }
    }
}

/// Options for converting a color image to a binary one.
///
/// - `gray_levels`: number of gray tones for the quantize step
/// - `quantize_dither`: error diffusion applied on the color reduction step
/// - `threshold_map`: dither pattern for the grayscale → binary step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryOptions {
    pub gray_levels: u32,
    pub quantize_dither: DitherMethod,
    pub threshold_map: ThresholdMap,
}

impl Default for BinaryOptions {
    fn default() -> Self {
        Self {
            gray_levels: N_GRAY_COLORS,
            quantize_dither: DitherMethod::None,
            threshold_map: ThresholdMap::Checks,
        }
    }
}

impl BinaryOptions {
    /// The quantize call used by the first stage of binarization.
    pub fn quantize_params(&self) -> QuantizeParams {
        QuantizeParams {
            colors: self.gray_levels,
            colorspace: Colorspace::Gray,
            dither: self.quantize_dither,
            tree_depth: 0,
            measure_error: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_map_accepts_imagemagick_aliases() {
        assert_eq!("checks".parse::<ThresholdMap>(), Ok(ThresholdMap::Checks));
        assert_eq!("2x1".parse::<ThresholdMap>(), Ok(ThresholdMap::Checks));
        assert_eq!("O4X4".parse::<ThresholdMap>(), Ok(ThresholdMap::O4x4));
        assert_eq!("th".parse::<ThresholdMap>(), Ok(ThresholdMap::Threshold));
        assert!("spiral".parse::<ThresholdMap>().is_err());
    }

    #[test]
    fn pixel_map_channels() {
        assert_eq!("rgb".parse::<PixelMap>().unwrap().channels(), 3);
        assert_eq!("RGBA".parse::<PixelMap>().unwrap().channels(), 4);
        assert_eq!("I".parse::<PixelMap>().unwrap().channels(), 1);
    }

    #[test]
    fn defaults_match_binarization_defaults() {
        let opts = BinaryOptions::default();
        assert_eq!(opts.gray_levels, 64);
        assert_eq!(opts.quantize_dither, DitherMethod::None);
        assert_eq!(opts.threshold_map, ThresholdMap::Checks);

        let q = opts.quantize_params();
        assert_eq!(q.colorspace, Colorspace::Gray);
        assert_eq!(q, QuantizeParams::default());
    }

    #[test]
    fn level_defaults_span_quantum_range() {
        let level = LevelParams::default();
        assert_eq!(level.black_point, 0.0);
        assert_eq!(level.white_point, 255.0);
        assert_eq!(level.gamma, 1.0);
    }

    #[test]
    fn unknown_variant_message_names_the_kind() {
        let err = "sierra".parse::<DitherMethod>().unwrap_err();
        assert_eq!(err.to_string(), "unknown dither method 'sierra'");
    }

    #[test]
    fn unknown_variant_is_a_std_error() {
        let err: Box<dyn std::error::Error> = Box::new("XYZ".parse::<PixelMap>().unwrap_err());
        assert_eq!(err.to_string(), "unknown pixel map 'XYZ'");
    }
}
