//! The wrapper around one image library handle.
//!
//! A [`Proxy`] owns exactly one [`ImageHandle`]. Operations the wrapper does
//! not define itself are forwarded to the handle; when the handle answers
//! with another image, the answer is wrapped again so call chains stay inside
//! `Proxy`. Everything else comes back unchanged as a [`Value`].
//!
//! ```text
//! call("crop_border")      → composite layer
//! call("flip")             → forward_named → Operation::Flip → handle.flip()
//!                                                            → Forwarded::Image(Proxy)
//! call("bounding_box")     → ... → Forwarded::Value(Value::Geometry(..))
//! call("sepia_tone")       → UnsupportedOperation("sepia_tone")
//! ```

use crate::composite::COMPOSITE_OPERATIONS;
use crate::error::{BinMagickError, Result};
use crate::imaging::{ImageHandle, Operation, Outcome, PixelMap, RasterHandle, Value};
use std::path::Path;
use tracing::trace;

/// Reply of a forwarded call.
#[derive(Debug)]
pub enum Forwarded<H: ImageHandle> {
    /// The library produced an image; already re-wrapped.
    Image(Proxy<H>),
    Value(Value),
}

impl<H: ImageHandle> Forwarded<H> {
    pub fn into_image(self) -> Option<Proxy<H>> {
        match self {
            Forwarded::Image(proxy) => Some(proxy),
            Forwarded::Value(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Forwarded::Value(value) => Some(value),
            Forwarded::Image(_) => None,
        }
    }
}

/// Wrapper around a live image handle.
#[derive(Debug, Clone, PartialEq)]
pub struct Proxy<H: ImageHandle = RasterHandle> {
    image: H,
}

impl<H: ImageHandle> Proxy<H> {
    /// Wrap `image`. Fails if the library already destroyed it.
    pub fn new(image: H) -> Result<Self> {
        if image.is_destroyed() {
            return Err(BinMagickError::DestroyedImage);
        }
        Ok(Self { image })
    }

    /// Read the first frame of the image at `path`.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = H::read(path).map_err(|e| BinMagickError::Io(e.to_string()))?;
        Self::new(image)
    }

    /// The wrapped handle.
    pub fn image(&self) -> &H {
        &self.image
    }

    pub fn into_image(self) -> H {
        self.image
    }

    pub fn columns(&self) -> u32 {
        self.image.columns()
    }

    pub fn rows(&self) -> u32 {
        self.image.rows()
    }

    /// Image width; same as [`columns`](Self::columns).
    pub fn width(&self) -> u32 {
        self.columns()
    }

    /// Image height; same as [`rows`](Self::rows).
    pub fn height(&self) -> u32 {
        self.rows()
    }

    /// Whether a by-name [`call`](Self::call) of `name` would be handled,
    /// either by the wrapper itself or by the wrapped handle.
    pub fn responds_to(&self, name: &str) -> bool {
        COMPOSITE_OPERATIONS.contains(&name)
            || (Operation::is_primitive(name) && self.image.supports(name))
    }

    /// Forward a primitive to the wrapped handle.
    ///
    /// Image results come back wrapped in a new `Proxy`; the receiver is
    /// never modified.
    pub fn forward(&self, operation: &Operation) -> Result<Forwarded<H>> {
        let name = operation.name();
        if !self.image.supports(name) {
            return Err(BinMagickError::UnsupportedOperation(name.to_string()));
        }
        trace!(operation = name, "forwarding to image handle");

        match operation.apply(&self.image)? {
            Outcome::Image(image) => Ok(Forwarded::Image(Self::new(image)?)),
            Outcome::Value(value) => Ok(Forwarded::Value(value)),
        }
    }

    /// Forward a primitive given by name and textual arguments.
    ///
    /// The capability probe runs before argument parsing, so an unknown name
    /// is reported as unsupported even if its arguments are malformed.
    pub fn forward_named(&self, name: &str, args: &[&str]) -> Result<Forwarded<H>> {
        if !Operation::is_primitive(name) || !self.image.supports(name) {
            return Err(BinMagickError::UnsupportedOperation(name.to_string()));
        }
        self.forward(&Operation::parse(name, args)?)
    }

    /// By-name entry point: composite operations first, then forwarding.
    ///
    /// In-place composite forms reply with [`Value::Unit`]; the receiver
    /// holds the result.
    pub fn call(&mut self, name: &str, args: &[&str]) -> Result<Forwarded<H>> {
        match self.call_composite(name, args) {
            Some(reply) => reply,
            None => self.forward_named(name, args),
        }
    }

    /// Re-synthesize `source` into a fresh handle and make it the receiver's.
    ///
    /// Reads `source`'s full RGB buffer and rebuilds a handle of identical
    /// dimensions from it. This is how every in-place form is implemented.
    pub fn replace_pixels(&mut self, source: &H) -> Result<()> {
        let (columns, rows) = (source.columns(), source.rows());
        let pixels = source.dispatch(0, 0, columns, rows, PixelMap::Rgb)?;
        let image = H::constitute(columns, rows, PixelMap::Rgb, &pixels)?;
        trace!(columns, rows, "replaced backing image");
        self.image = image;
        Ok(())
    }
}
