//! The forwardable primitive surface as a closed enum.
//!
//! An [`Operation`] names one [`ImageHandle`] primitive together with its
//! arguments. [`Operation::apply`] is the only place a primitive is invoked
//! by name, and it reports the result as a typed [`Outcome`]: either a new
//! handle or a plain [`Value`]. Callers never inspect return types at runtime.

use super::backend::{BoundingBox, ColorHistogram, ImageHandle, LibraryError};
use super::params::{LevelParams, PixelMap, QuantizeParams, ThresholdMap};
use crate::error::{BinMagickError, Result};
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

/// Non-image result of a primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unit,
    Bool(bool),
    Dimension(u32),
    Geometry(BoundingBox),
    Histogram(ColorHistogram),
    Pixels(Vec<u8>),
}

/// Result of invoking a primitive on a handle.
#[derive(Debug)]
pub enum Outcome<H> {
    Image(H),
    Value(Value),
}

/// One invocation of a library primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Columns,
    Rows,
    IsDestroyed,
    Dispatch {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        map: PixelMap,
    },
    ColorHistogram,
    BoundingBox,
    Copy,
    Crop {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    ResizeToFit {
        width: u32,
        height: u32,
    },
    Extent {
        width: u32,
        height: u32,
        x: i64,
        y: i64,
    },
    Level2(LevelParams),
    OrderedDither(ThresholdMap),
    Quantize(QuantizeParams),
    Flip,
    Flop,
    Write(PathBuf),
    Display,
}

/// Names of every primitive an [`Operation`] can carry.
pub const PRIMITIVES: &[&str] = &[
    "columns",
    "rows",
    "is_destroyed",
    "dispatch",
    "color_histogram",
    "bounding_box",
    "copy",
    "crop",
    "resize_to_fit",
    "extent",
    "level2",
    "ordered_dither",
    "quantize",
    "flip",
    "flop",
    "write",
    "display",
];

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Columns => "columns",
            Operation::Rows => "rows",
            Operation::IsDestroyed => "is_destroyed",
            Operation::Dispatch { .. } => "dispatch",
            Operation::ColorHistogram => "color_histogram",
            Operation::BoundingBox => "bounding_box",
            Operation::Copy => "copy",
            Operation::Crop { .. } => "crop",
            Operation::ResizeToFit { .. } => "resize_to_fit",
            Operation::Extent { .. } => "extent",
            Operation::Level2(_) => "level2",
            Operation::OrderedDither(_) => "ordered_dither",
            Operation::Quantize(_) => "quantize",
            Operation::Flip => "flip",
            Operation::Flop => "flop",
            Operation::Write(_) => "write",
            Operation::Display => "display",
        }
    }

    pub fn is_primitive(name: &str) -> bool {
        PRIMITIVES.contains(&name)
    }

    /// Build an operation from a primitive name and textual arguments.
    ///
    /// Trailing arguments may be omitted where the primitive has defaults.
    pub fn parse(name: &str, args: &[&str]) -> Result<Self> {
        let mut args = ArgReader::new(name, args);
        let op = match name {
            "columns" => Operation::Columns,
            "rows" => Operation::Rows,
            "is_destroyed" => Operation::IsDestroyed,
            "dispatch" => Operation::Dispatch {
                x: args.required("x")?,
                y: args.required("y")?,
                width: args.required("width")?,
                height: args.required("height")?,
                map: args.optional("map", PixelMap::Rgb)?,
            },
            "color_histogram" => Operation::ColorHistogram,
            "bounding_box" => Operation::BoundingBox,
            "copy" => Operation::Copy,
            "crop" => Operation::Crop {
                x: args.required("x")?,
                y: args.required("y")?,
                width: args.required("width")?,
                height: args.required("height")?,
            },
            "resize_to_fit" => Operation::ResizeToFit {
                width: args.required("width")?,
                height: args.required("height")?,
            },
            "extent" => Operation::Extent {
                width: args.required("width")?,
                height: args.required("height")?,
                x: args.optional("x", 0)?,
                y: args.optional("y", 0)?,
            },
            "level2" => {
                let defaults = LevelParams::default();
                Operation::Level2(LevelParams {
                    black_point: args.optional("black_point", defaults.black_point)?,
                    white_point: args.optional("white_point", defaults.white_point)?,
                    gamma: args.optional("gamma", defaults.gamma)?,
                })
            }
            "ordered_dither" => {
                Operation::OrderedDither(args.optional("threshold_map", ThresholdMap::Checks)?)
            }
            "quantize" => {
                let defaults = QuantizeParams::default();
                Operation::Quantize(QuantizeParams {
                    colors: args.optional("colors", defaults.colors)?,
                    colorspace: args.optional("colorspace", defaults.colorspace)?,
                    dither: args.optional("dither", defaults.dither)?,
                    tree_depth: args.optional("tree_depth", defaults.tree_depth)?,
                    measure_error: args.optional("measure_error", defaults.measure_error)?,
                })
            }
            "flip" => Operation::Flip,
            "flop" => Operation::Flop,
            "write" => Operation::Write(PathBuf::from(args.required::<String>("path")?)),
            "display" => Operation::Display,
            other => return Err(BinMagickError::UnsupportedOperation(other.to_string())),
        };
        args.finish()?;
        Ok(op)
    }

    /// Invoke this primitive on `handle`, arguments passed through unchanged.
    pub fn apply<H: ImageHandle>(
        &self,
        handle: &H,
    ) -> std::result::Result<Outcome<H>, LibraryError> {
        let image = Outcome::Image;
        let value = |v| Ok(Outcome::Value(v));
        match self {
            Operation::Columns => value(Value::Dimension(handle.columns())),
            Operation::Rows => value(Value::Dimension(handle.rows())),
            Operation::IsDestroyed => value(Value::Bool(handle.is_destroyed())),
            Operation::Dispatch {
                x,
                y,
                width,
                height,
                map,
            } => value(Value::Pixels(
                handle.dispatch(*x, *y, *width, *height, *map)?,
            )),
            Operation::ColorHistogram => value(Value::Histogram(handle.color_histogram()?)),
            Operation::BoundingBox => value(Value::Geometry(handle.bounding_box()?)),
            Operation::Copy => handle.copy().map(image),
            Operation::Crop {
                x,
                y,
                width,
                height,
            } => handle.crop(*x, *y, *width, *height).map(image),
            Operation::ResizeToFit { width, height } => {
                handle.resize_to_fit(*width, *height).map(image)
            }
            Operation::Extent {
                width,
                height,
                x,
                y,
            } => handle.extent(*width, *height, *x, *y).map(image),
            Operation::Level2(params) => handle.level2(params).map(image),
            Operation::OrderedDither(map) => handle.ordered_dither(*map).map(image),
            Operation::Quantize(params) => handle.quantize(params).map(image),
            Operation::Flip => handle.flip().map(image),
            Operation::Flop => handle.flop().map(image),
            Operation::Write(path) => {
                handle.write(path)?;
                value(Value::Unit)
            }
            Operation::Display => {
                handle.display()?;
                value(Value::Unit)
            }
        }
    }
}

/// Positional argument cursor for by-name calls.
pub(crate) struct ArgReader<'a> {
    operation: &'a str,
    args: &'a [&'a str],
    next: usize,
}

impl<'a> ArgReader<'a> {
    pub(crate) fn new(operation: &'a str, args: &'a [&'a str]) -> Self {
        Self {
            operation,
            args,
            next: 0,
        }
    }

    fn invalid(&self, message: String) -> BinMagickError {
        BinMagickError::InvalidArgument {
            operation: self.operation.to_string(),
            message,
        }
    }

    fn parse<T>(&self, label: &str, raw: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        raw.parse()
            .map_err(|e| self.invalid(format!("{label}: cannot parse '{raw}': {e}")))
    }

    pub(crate) fn required<T>(&mut self, label: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self
            .args
            .get(self.next)
            .ok_or_else(|| self.invalid(format!("missing argument '{label}'")))?;
        self.next += 1;
        self.parse(label, raw)
    }

    pub(crate) fn optional<T>(&mut self, label: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.args.get(self.next) {
            Some(raw) => {
                self.next += 1;
                self.parse(label, raw)
            }
            None => Ok(default),
        }
    }

    /// Reject leftover arguments.
    pub(crate) fn finish(self) -> Result<()> {
        if self.next < self.args.len() {
            return Err(self.invalid(format!(
                "expected at most {} argument(s), got {}",
                self.next,
                self.args.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::{Colorspace, DitherMethod};
    use crate::imaging::raster::RasterHandle;

    #[test]
    fn every_primitive_name_parses() {
        let sample_args: &[&str] = &["1", "1", "1", "1"];
        for name in PRIMITIVES {
            let args: &[&str] = match *name {
                "dispatch" | "crop" => sample_args,
                "resize_to_fit" | "extent" => &sample_args[..2],
                "write" => &["out.png"],
                _ => &[],
            };
            let op = Operation::parse(name, args).unwrap();
            assert_eq!(op.name(), *name);
        }
    }

    #[test]
    fn parse_fills_trailing_defaults() {
        let op = Operation::parse("extent", &["20", "10"]).unwrap();
        assert_eq!(
            op,
            Operation::Extent {
                width: 20,
                height: 10,
                x: 0,
                y: 0
            }
        );

        let op = Operation::parse("quantize", &["16", "rgb"]).unwrap();
        assert_eq!(
            op,
            Operation::Quantize(QuantizeParams {
                colors: 16,
                colorspace: Colorspace::Rgb,
                dither: DitherMethod::None,
                tree_depth: 0,
                measure_error: false,
            })
        );
    }

    #[test]
    fn parse_unknown_name_is_unsupported() {
        let err = Operation::parse("sepia_tone", &[]).unwrap_err();
        assert!(matches!(err, BinMagickError::UnsupportedOperation(name) if name == "sepia_tone"));
    }

    #[test]
    fn parse_rejects_bad_and_extra_arguments() {
        let err = Operation::parse("crop", &["1", "2", "three", "4"]).unwrap_err();
        assert!(matches!(
            &err,
            BinMagickError::InvalidArgument { operation, message }
                if operation == "crop" && message.contains("width") && message.contains("three")
        ));

        let err = Operation::parse("crop", &["1", "2"]).unwrap_err();
        assert!(err.to_string().contains("missing argument 'width'"));

        let err = Operation::parse("rows", &["7"]).unwrap_err();
        assert!(matches!(err, BinMagickError::InvalidArgument { .. }));
    }

    #[test]
    fn apply_reports_images_and_values_separately() {
        let handle = RasterHandle::blank(4, 3);

        match Operation::Columns.apply(&handle).unwrap() {
            Outcome::Value(Value::Dimension(4)) => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
        match Operation::Flip.apply(&handle).unwrap() {
            Outcome::Image(flipped) => assert_eq!(flipped.rows(), 3),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
