//! Pure calculation functions behind the raster primitives.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{Colorspace, QUANTUM_RANGE, ThresholdMap};
use image::{Rgb, Rgba};

/// Largest RGB canvas, in bytes, a primitive may allocate.
pub const MAX_CANVAS_BYTES: u64 = 1 << 30;

/// Check whether `(width, height)` exceeds either bound.
///
/// An image exactly at the bounds is not oversize.
pub fn is_oversize(dims: (u32, u32), max: (u32, u32)) -> bool {
    dims.0 > max.0 || dims.1 > max.1
}

/// Check whether an 8-bit RGB canvas of `(width, height)` stays within
/// [`MAX_CANVAS_BYTES`].
pub fn canvas_fits(dims: (u32, u32)) -> bool {
    dims.0 as u64 * dims.1 as u64 * 3 <= MAX_CANVAS_BYTES
}

/// Calculate the largest aspect-preserving size that fits inside `max`.
///
/// Each side is at least one pixel. Smaller images are scaled up, like
/// ImageMagick's `resize_to_fit`; callers that only want to shrink check
/// [`is_oversize`] first.
///
/// # Examples
/// ```
/// # use binimage::imaging::calculations::fit_dimensions;
/// // 200x100 into a 50x50 box → 50x25
/// assert_eq!(fit_dimensions((200, 100), (50, 50)), (50, 25));
/// ```
pub fn fit_dimensions(source: (u32, u32), max: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = max;
    if src_w == 0 || src_h == 0 {
        return (max_w.max(1), max_h.max(1));
    }

    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w.max(1));
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h.max(1));
    (w, h)
}

/// Rec. 709 luma of an 8-bit RGB pixel, in `0.0..=255.0`.
pub fn luma(pixel: Rgb<u8>) -> f32 {
    let [r, g, b] = pixel.0;
    0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32
}

/// Composite a pixel over white. Fully transparent pixels become white.
pub fn flatten_on_white(pixel: Rgba<u8>) -> Rgb<u8> {
    let [r, g, b, a] = pixel.0;
    let a = a as u32;
    let over = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
    Rgb([over(r), over(g), over(b)])
}

/// Number of evenly spaced tones per channel a quantize call produces.
///
/// Gray keeps `colors` tones. RGB splits the budget across three channels
/// (`floor(cbrt(colors))`). A non-zero `tree_depth` caps the result at
/// `2^tree_depth`. The result is never below two.
pub fn tones_per_channel(colors: u32, colorspace: Colorspace, tree_depth: u32) -> u32 {
    let tones = match colorspace {
        Colorspace::Gray => colors,
        Colorspace::Rgb => ((colors as f64).cbrt() + 1e-9).floor() as u32,
    };
    let tones = if tree_depth > 0 {
        tones.min(1u32 << tree_depth.min(8))
    } else {
        tones
    };
    tones.clamp(2, 256)
}

/// Snap a channel value to the nearest of `tones` evenly spaced levels.
pub fn nearest_tone(value: f32, tones: u32) -> f32 {
    let steps = (tones.max(2) - 1) as f32;
    let range = QUANTUM_RANGE as f32;
    let index = (value.clamp(0.0, range) * steps / range).round();
    (index * range / steps).round()
}

/// Map one channel through a `level2` tone curve.
///
/// Black and white are used as given; `black > white` inverts the ramp.
pub fn level_value(value: u8, black: f64, white: f64, gamma: f64) -> u8 {
    let scale = if white != black {
        1.0 / (white - black)
    } else {
        1.0
    };
    let t = ((value as f64 - black) * scale).clamp(0.0, 1.0);
    (QUANTUM_RANGE * t.powf(1.0 / gamma)).round() as u8
}

/// ImageMagick ordered-dither table: `(width, height, divisor, levels)`.
pub fn threshold_matrix(map: ThresholdMap) -> (usize, usize, u32, &'static [u32]) {
    match map {
        ThresholdMap::Threshold => (1, 1, 2, &[1]),
        ThresholdMap::Checks => (2, 2, 3, &[1, 2, 2, 1]),
        ThresholdMap::O2x2 => (2, 2, 5, &[1, 3, 4, 2]),
        ThresholdMap::O3x3 => (3, 3, 10, &[3, 7, 4, 6, 1, 9, 2, 8, 5]),
        ThresholdMap::O4x4 => (
            4,
            4,
            17,
            &[1, 9, 3, 11, 13, 5, 15, 7, 4, 12, 2, 10, 16, 8, 14, 6],
        ),
        ThresholdMap::O8x8 => (
            8,
            8,
            65,
            &[
                1, 49, 13, 61, 4, 52, 16, 64, 33, 17, 45, 29, 36, 20, 48, 32, 9, 57, 5, 53, 12, 60,
                8, 56, 41, 25, 37, 21, 44, 28, 40, 24, 3, 51, 15, 63, 2, 50, 14, 62, 35, 19, 47,
                31, 34, 18, 46, 30, 11, 59, 7, 55, 10, 58, 6, 54, 43, 27, 39, 23, 42, 26, 38, 22,
            ],
        ),
    }
}

/// Two-level ordered dither of one channel at pixel `(x, y)`.
pub fn dither_channel(value: u8, x: u32, y: u32, map: ThresholdMap) -> u8 {
    let (w, h, divisor, levels) = threshold_matrix(map);
    let level = levels[(y as usize % h) * w + (x as usize % w)];
    if value as u32 * divisor >= level * QUANTUM_RANGE as u32 {
        u8::MAX
    } else {
        0
    }
}

const NAMED_COLORS: &[([u8; 3], &str)] = &[
    ([0, 0, 0], "black"),
    ([255, 255, 255], "white"),
    ([255, 0, 0], "red"),
    ([0, 255, 0], "lime"),
    ([0, 0, 255], "blue"),
    ([255, 255, 0], "yellow"),
    ([0, 255, 255], "cyan"),
    ([255, 0, 255], "magenta"),
    ([128, 128, 128], "gray"),
    ([192, 192, 192], "silver"),
    ([128, 0, 0], "maroon"),
    ([128, 128, 0], "olive"),
    ([0, 128, 0], "green"),
    ([128, 0, 128], "purple"),
    ([0, 128, 128], "teal"),
    ([0, 0, 128], "navy"),
];

/// Canonical name of a color: an SVG basic color name, else `#RRGGBB`.
pub fn color_name(color: Rgb<u8>) -> String {
    NAMED_COLORS
        .iter()
        .find(|(rgb, _)| *rgb == color.0)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| {
            let [r, g, b] = color.0;
            format!("#{r:02X}{g:02X}{b:02X}")
        })
}
