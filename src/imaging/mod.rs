//! The image library seen by the wrapper: a closed primitive surface and one
//! pure Rust implementation of it.
//!
//! | Primitive | Crate / function |
//! |---|---|
//! | **Decode / encode** | `image::ImageReader`, `ImageBuffer::save` |
//! | **Crop / resize / extent / flip** | `image::imageops` |
//! | **Quantize / ordered dither / level** | pure functions in `calculations` |
//! | **Histogram / bounding box** | pixel scans in `raster` |
//!
//! The module is split into:
//! - **Calculations**: Pure tone and geometry math (unit testable)
//! - **Parameters**: Data structures describing primitive calls
//! - **Backend**: [`ImageHandle`] trait + returned value types
//! - **Operation**: The forwardable surface as an enum, invocable by name
//! - **Raster**: [`RasterHandle`], the `image`-crate implementation

pub mod backend;
pub mod calculations;
pub mod operation;
mod params;
pub mod raster;

pub use backend::{BoundingBox, ColorHistogram, ImageHandle, LibraryError};
pub use operation::{Operation, Outcome, PRIMITIVES, Value};
pub use params::{
    BinaryOptions, Colorspace, DitherMethod, LevelParams, N_GRAY_COLORS, PixelMap,
    QUANTUM_RANGE, QuantizeParams, ThresholdMap, UnknownVariant,
};
pub use raster::RasterHandle;
