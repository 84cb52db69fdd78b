//! # binimage
//!
//! A thin wrapper around an image library handle that adds the handful of
//! composite operations a scanning pipeline keeps needing: cropping the
//! border around content, binarizing color scans, and shrinking oversize
//! pages into a bounding box.
//!
//! # Architecture: Wrapper + Closed Primitive Surface
//!
//! ```text
//! Proxy::call(name, args)
//!   ├── composite layer   crop_border, to_binary, fit_to_size, *_in_place, ...
//!   └── forwarding        Operation::parse → ImageHandle primitive
//!                           ├── image result  → wrapped in a new Proxy
//!                           └── other result  → returned as a Value
//! ```
//!
//! The library is reached only through the [`imaging::ImageHandle`] trait.
//! Every primitive returns a new handle. In-place (`*_in_place`) forms are
//! built by re-synthesis: the result's pixels are dispatched out as a flat
//! RGB buffer and constituted into a fresh handle that replaces the
//! receiver's.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`proxy`] | The wrapper: construction, file loading, forwarding, re-synthesis |
//! | [`composite`] | Border crop, binarization, fit-to-size and the in-place forms |
//! | [`imaging`] | The primitive surface, its parameters, and the `image`-crate handle |
//! | [`error`] | Crate error type |
//! | [`config`] | `binimage.toml` loading, validation, and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Example
//!
//! ```no_run
//! use binimage::Proxy;
//!
//! let page: Proxy = Proxy::load_from_file("scan.png")?;
//! let content = page.crop_border()?;
//! let small = content.fit_to_size(1024, 1024)?;
//! # Ok::<(), binimage::BinMagickError>(())
//! ```
//!
//! # Design Decisions
//!
//! ## Closed Forwarding
//!
//! Forwarding works off the [`imaging::Operation`] enum plus a capability
//! probe ([`imaging::ImageHandle::supports`]). A name that is neither a
//! composite nor a supported primitive fails with
//! [`BinMagickError::UnsupportedOperation`] before anything runs.
//!
//! ## Black Means Content
//!
//! `crop_border` only crops when the image holds at least one pure black
//! pixel. A page without one is treated as blank and returned unedited, so a
//! blank scan never collapses to a sliver. Color scans go through
//! `crop_border_treating_as_binary`, which decides on a binarized copy and
//! cuts the rectangle from the original.

pub mod composite;
pub mod config;
pub mod error;
pub mod imaging;
pub mod output;
pub mod proxy;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use error::{BinMagickError, Result};
pub use proxy::{Forwarded, Proxy};
