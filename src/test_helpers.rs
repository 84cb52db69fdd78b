//! Shared test utilities for the binimage test suite.
//!
//! Builds small synthetic rasters in memory so tests never need fixture
//! files, plus extractors that read pixels back out through the public
//! primitive surface.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let img = Proxy::new(square_on_white(100, 100, 40, 40, 10)).unwrap();
//! let cropped = img.crop_border().unwrap();
//! assert_eq!(distinct_colors(&cropped), 1);
//! ```

use crate::imaging::{ImageHandle, PixelMap, RasterHandle};
use crate::proxy::Proxy;
use image::{Rgb, RgbImage};
use std::collections::HashSet;

// =========================================================================
// Synthetic rasters
// =========================================================================

/// White `width × height` canvas with a black `size × size` square at `(x, y)`.
pub fn square_on_white(width: u32, height: u32, x: u32, y: u32, size: u32) -> RasterHandle {
    let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    for row in y..(y + size).min(height) {
        for col in x..(x + size).min(width) {
            img.put_pixel(col, row, Rgb([0, 0, 0]));
        }
    }
    RasterHandle::from_rgb(img)
}

/// Left half `left`, right half `right`.
pub fn two_tone(width: u32, height: u32, left: Rgb<u8>, right: Rgb<u8>) -> RasterHandle {
    RasterHandle::from_rgb(RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 { left } else { right }
    }))
}

/// Horizontal ramp from black to white, tinted so channels differ.
pub fn gradient(width: u32, height: u32) -> RasterHandle {
    let span = width.saturating_sub(1).max(1);
    RasterHandle::from_rgb(RgbImage::from_fn(width, height, |x, _| {
        let v = (x * 255 / span) as u8;
        Rgb([v, v.saturating_sub(20), v / 2 + 64])
    }))
}

// =========================================================================
// Extractors
// =========================================================================

/// Full-frame RGB buffer of the wrapped image.
pub fn pixels_of<H: ImageHandle>(proxy: &Proxy<H>) -> Vec<u8> {
    proxy
        .image()
        .dispatch(0, 0, proxy.columns(), proxy.rows(), PixelMap::Rgb)
        .unwrap()
}

/// Number of distinct RGB colors in the wrapped image.
pub fn distinct_colors<H: ImageHandle>(proxy: &Proxy<H>) -> usize {
    pixels_of(proxy)
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect::<HashSet<_>>()
        .len()
}
