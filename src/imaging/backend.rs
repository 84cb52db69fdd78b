//! Image library trait and the value types its primitives return.
//!
//! The [`ImageHandle`] trait is the closed primitive surface the wrapper is
//! allowed to reach: decode, dispatch/constitute, histogram, bounding box and
//! the geometric and tonal primitives the composite operations are built from.
//! Anything not on this trait cannot be forwarded.
//!
//! The production implementation is
//! [`RasterHandle`](super::raster::RasterHandle), built on the `image` crate.

use super::calculations::color_name;
use super::operation::Operation;
use super::params::{LevelParams, PixelMap, QuantizeParams, ThresholdMap};
use image::Rgb;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("Failed to encode {path}: {message}")]
    Encode { path: String, message: String },
    #[error("Image has been destroyed")]
    Destroyed,
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    PixelBuffer { expected: usize, actual: usize },
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Minimal rectangle enclosing all non-background pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Occurrence count of every distinct color in an image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorHistogram {
    counts: HashMap<Rgb<u8>, usize>,
}

impl ColorHistogram {
    pub fn count(&self, color: Rgb<u8>) -> usize {
        self.counts.get(&color).copied().unwrap_or(0)
    }

    /// Number of distinct colors.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Rgb<u8>, usize)> + '_ {
        self.counts.iter().map(|(color, count)| (*color, *count))
    }

    /// The histogram keyed by canonical color name instead of color value.
    pub fn by_name(&self) -> HashMap<String, usize> {
        self.iter()
            .map(|(color, count)| (color_name(color), count))
            .collect()
    }
}

impl FromIterator<Rgb<u8>> for ColorHistogram {
    fn from_iter<I: IntoIterator<Item = Rgb<u8>>>(iter: I) -> Self {
        let mut counts = HashMap::new();
        for color in iter {
            *counts.entry(color).or_insert(0) += 1;
        }
        Self { counts }
    }
}

/// Trait for an image library handle.
///
/// Every primitive returns a *new* handle; none mutates the receiver. The
/// wrapper builds in-place semantics on top with `dispatch` + `constitute`.
pub trait ImageHandle: Sized {
    /// Decode the first frame of the file at `path`.
    fn read(path: &Path) -> Result<Self, LibraryError>;

    /// Build a handle from a flat pixel buffer laid out as `map`.
    fn constitute(
        columns: u32,
        rows: u32,
        map: PixelMap,
        pixels: &[u8],
    ) -> Result<Self, LibraryError>;

    fn columns(&self) -> u32;

    fn rows(&self) -> u32;

    fn is_destroyed(&self) -> bool;

    /// Capability probe: does this handle implement the named primitive?
    fn supports(&self, operation: &str) -> bool {
        Operation::is_primitive(operation)
    }

    /// Extract the pixels of a rectangular region as a flat buffer.
    fn dispatch(
        &self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        map: PixelMap,
    ) -> Result<Vec<u8>, LibraryError>;

    fn color_histogram(&self) -> Result<ColorHistogram, LibraryError>;

    fn bounding_box(&self) -> Result<BoundingBox, LibraryError>;

    fn copy(&self) -> Result<Self, LibraryError>;

    fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Result<Self, LibraryError>;

    /// Aspect-preserving resize into a `width × height` box.
    fn resize_to_fit(&self, width: u32, height: u32) -> Result<Self, LibraryError>;

    /// Pad or crop the canvas to `width × height`, source placed at `(-x, -y)`.
    fn extent(&self, width: u32, height: u32, x: i64, y: i64) -> Result<Self, LibraryError>;

    /// Tone-curve remap that never swaps black and white points.
    fn level2(&self, params: &LevelParams) -> Result<Self, LibraryError>;

    fn ordered_dither(&self, map: ThresholdMap) -> Result<Self, LibraryError>;

    fn quantize(&self, params: &QuantizeParams) -> Result<Self, LibraryError>;

    /// Mirror top to bottom.
    fn flip(&self) -> Result<Self, LibraryError>;

    /// Mirror left to right.
    fn flop(&self) -> Result<Self, LibraryError>;

    /// Encode to `path`, format chosen from the extension.
    fn write(&self, path: &Path) -> Result<(), LibraryError>;

    /// Show the image interactively.
    fn display(&self) -> Result<(), LibraryError>;
}
