//! Composite image operations layered on top of [`Proxy`].
//!
//! Each operation is a short pipeline of library primitives plus an explicit
//! edge-case policy:
//!
//! | Operation | Pipeline | Edge case |
//! |---|---|---|
//! | `crop_border` | histogram → bounding box → crop | no black pixel: unedited copy |
//! | `crop_border_treating_as_binary` | to_binary → histogram → bounding box → crop original | no black pixel after binarization: unedited copy |
//! | `to_binary` | quantize (gray) → ordered dither | |
//! | `fit_to_size` | resize_to_fit | not oversize: unedited copy |
//!
//! The `*_in_place` forms run the non-mutating pipeline first and only then
//! swap the receiver's handle via [`Proxy::replace_pixels`]. A failure part
//! way through leaves the receiver untouched.

use crate::error::{BinMagickError, Result};
use crate::imaging::operation::ArgReader;
use crate::imaging::{
    BinaryOptions, BoundingBox, ImageHandle, LevelParams, PixelMap, QuantizeParams, ThresholdMap,
    Value, calculations,
};
use crate::proxy::{Forwarded, Proxy};
use tracing::debug;

/// Names handled by the composite layer before anything is forwarded.
pub const COMPOSITE_OPERATIONS: &[&str] = &[
    "width",
    "height",
    "has_black_pixel",
    "crop_border",
    "crop_border_in_place",
    "crop_border_treating_as_binary",
    "crop_border_treating_as_binary_in_place",
    "to_binary",
    "to_binary_in_place",
    "is_oversize",
    "fit_to_size",
    "fit_to_size_in_place",
    "extent_in_place",
    "level_in_place",
    "ordered_dither_in_place",
    "quantize_in_place",
    "display",
];

impl<H: ImageHandle> Proxy<H> {
    /// Check if the image has at least one black pixel.
    pub fn has_black_pixel(&self) -> Result<bool> {
        let histogram = self.image().color_histogram()?;
        Ok(histogram.by_name().contains_key("black"))
    }

    /// Crop the border around the image.
    ///
    /// A blank image (no black pixel) comes back as an unedited copy.
    pub fn crop_border(&self) -> Result<Self> {
        if !self.has_black_pixel()? {
            debug!("no black pixel, returning an unedited copy");
            return Proxy::new(self.image().copy()?);
        }
        let bb = self.image().bounding_box()?;
        self.crop_to(bb)
    }

    pub fn crop_border_in_place(&mut self) -> Result<&mut Self> {
        let cropped = self.crop_border()?;
        self.adopt(cropped)
    }

    /// Crop the border of a color image as if it were already binary.
    ///
    /// The blank check and bounding box run on a binarized working copy;
    /// the resulting rectangle is cut from the original pixels.
    pub fn crop_border_treating_as_binary(&self, options: &BinaryOptions) -> Result<Self> {
        let binary = self.to_binary(options)?;
        if (binary.columns(), binary.rows()) != (self.columns(), self.rows()) {
            return Err(BinMagickError::ExtentMismatch {
                width: self.columns(),
                height: self.rows(),
                binary_width: binary.columns(),
                binary_height: binary.rows(),
            });
        }

        if !binary.has_black_pixel()? {
            debug!("binarized copy has no black pixel, returning an unedited copy");
            return Proxy::new(self.image().copy()?);
        }
        let bb = binary.image().bounding_box()?;
        self.crop_to(bb)
    }

    pub fn crop_border_treating_as_binary_in_place(
        &mut self,
        options: &BinaryOptions,
    ) -> Result<&mut Self> {
        let cropped = self.crop_border_treating_as_binary(options)?;
        self.adopt(cropped)
    }

    /// Convert a color image to a binary one: quantize to gray tones, then
    /// ordered-dither down to two.
    pub fn to_binary(&self, options: &BinaryOptions) -> Result<Self> {
        let grayscale = self.image().quantize(&options.quantize_params())?;
        Proxy::new(grayscale.ordered_dither(options.threshold_map)?)
    }

    pub fn to_binary_in_place(&mut self, options: &BinaryOptions) -> Result<&mut Self> {
        let binary = self.to_binary(options)?;
        self.adopt(binary)
    }

    /// Check if the image is wider than `max_width` OR taller than `max_height`.
    pub fn is_oversize(&self, max_width: u32, max_height: u32) -> bool {
        calculations::is_oversize((self.columns(), self.rows()), (max_width, max_height))
    }

    /// Scale the image to fit the limits *if* it exceeds them.
    pub fn fit_to_size(&self, max_width: u32, max_height: u32) -> Result<Self> {
        if self.is_oversize(max_width, max_height) {
            debug!(
                columns = self.columns(),
                rows = self.rows(),
                max_width,
                max_height,
                "image oversize, resizing to fit"
            );
            Proxy::new(self.image().resize_to_fit(max_width, max_height)?)
        } else {
            Proxy::new(self.image().copy()?)
        }
    }

    pub fn fit_to_size_in_place(&mut self, max_width: u32, max_height: u32) -> Result<&mut Self> {
        let fitted = self.fit_to_size(max_width, max_height)?;
        self.adopt(fitted)
    }

    /// In-place `extent`: pad or crop the canvas, anchored at `(x, y)`.
    pub fn extent_in_place(&mut self, width: u32, height: u32, x: i64, y: i64) -> Result<&mut Self> {
        let extended = self.image().extent(width, height, x, y)?;
        self.replace_pixels(&extended)?;
        Ok(self)
    }

    /// In-place `level2`. Black and white points are never swapped.
    pub fn level_in_place(&mut self, params: &LevelParams) -> Result<&mut Self> {
        let leveled = self.image().level2(params)?;
        self.replace_pixels(&leveled)?;
        Ok(self)
    }

    pub fn ordered_dither_in_place(&mut self, map: ThresholdMap) -> Result<&mut Self> {
        let dithered = self.image().ordered_dither(map)?;
        self.replace_pixels(&dithered)?;
        Ok(self)
    }

    pub fn quantize_in_place(&mut self, params: &QuantizeParams) -> Result<&mut Self> {
        let quantized = self.image().quantize(params)?;
        self.replace_pixels(&quantized)?;
        Ok(self)
    }

    /// Show the current pixels through a freshly constituted handle.
    pub fn display(&self) -> Result<&Self> {
        let (columns, rows) = (self.columns(), self.rows());
        let pixels = self
            .image()
            .dispatch(0, 0, columns, rows, PixelMap::Rgb)?;
        H::constitute(columns, rows, PixelMap::Rgb, &pixels)?.display()?;
        Ok(self)
    }

    fn crop_to(&self, bb: BoundingBox) -> Result<Self> {
        debug!(x = bb.x, y = bb.y, width = bb.width, height = bb.height, "cropping border");
        Proxy::new(self.image().crop(bb.x, bb.y, bb.width, bb.height)?)
    }

    fn adopt(&mut self, result: Self) -> Result<&mut Self> {
        self.replace_pixels(result.image())?;
        Ok(self)
    }

    /// Run a composite operation by name. `None` if the name is not one.
    pub(crate) fn call_composite(
        &mut self,
        name: &str,
        args: &[&str],
    ) -> Option<Result<Forwarded<H>>> {
        if !COMPOSITE_OPERATIONS.contains(&name) {
            return None;
        }
        Some(Composite::parse(name, args).and_then(|composite| composite.run(self)))
    }
}

/// A composite operation with its arguments, parsed before anything runs so
/// a malformed in-place call never touches the receiver.
#[derive(Debug, Clone, PartialEq)]
enum Composite {
    Width,
    Height,
    HasBlackPixel,
    CropBorder { in_place: bool },
    CropBorderTreatingAsBinary { options: BinaryOptions, in_place: bool },
    ToBinary { options: BinaryOptions, in_place: bool },
    IsOversize { max_width: u32, max_height: u32 },
    FitToSize { max_width: u32, max_height: u32, in_place: bool },
    ExtentInPlace { width: u32, height: u32, x: i64, y: i64 },
    LevelInPlace(LevelParams),
    OrderedDitherInPlace(ThresholdMap),
    QuantizeInPlace(QuantizeParams),
    Display,
}

impl Composite {
    fn parse(name: &str, args: &[&str]) -> Result<Self> {
        let mut args = ArgReader::new(name, args);
        let composite = match name {
            "width" => Composite::Width,
            "height" => Composite::Height,
            "has_black_pixel" => Composite::HasBlackPixel,
            "crop_border" | "crop_border_in_place" => Composite::CropBorder {
                in_place: name.ends_with("_in_place"),
            },
            "crop_border_treating_as_binary" | "crop_border_treating_as_binary_in_place" => {
                Composite::CropBorderTreatingAsBinary {
                    options: binary_options(&mut args)?,
                    in_place: name.ends_with("_in_place"),
                }
            }
            "to_binary" | "to_binary_in_place" => Composite::ToBinary {
                options: binary_options(&mut args)?,
                in_place: name.ends_with("_in_place"),
            },
            "is_oversize" => Composite::IsOversize {
                max_width: args.required("max_width")?,
                max_height: args.required("max_height")?,
            },
            "fit_to_size" | "fit_to_size_in_place" => Composite::FitToSize {
                max_width: args.required("max_width")?,
                max_height: args.required("max_height")?,
                in_place: name.ends_with("_in_place"),
            },
            "extent_in_place" => Composite::ExtentInPlace {
                width: args.required("width")?,
                height: args.required("height")?,
                x: args.optional("x", 0)?,
                y: args.optional("y", 0)?,
            },
            "level_in_place" => {
                let defaults = LevelParams::default();
                Composite::LevelInPlace(LevelParams {
                    black_point: args.optional("black_point", defaults.black_point)?,
                    white_point: args.optional("white_point", defaults.white_point)?,
                    gamma: args.optional("gamma", defaults.gamma)?,
                })
            }
            "ordered_dither_in_place" => Composite::OrderedDitherInPlace(
                args.optional("threshold_map", ThresholdMap::Checks)?,
            ),
            "quantize_in_place" => {
                let defaults = QuantizeParams::default();
                Composite::QuantizeInPlace(QuantizeParams {
                    colors: args.optional("colors", defaults.colors)?,
                    colorspace: args.optional("colorspace", defaults.colorspace)?,
                    dither: args.optional("dither", defaults.dither)?,
                    tree_depth: args.optional("tree_depth", defaults.tree_depth)?,
                    measure_error: args.optional("measure_error", defaults.measure_error)?,
                })
            }
            "display" => Composite::Display,
            other => return Err(BinMagickError::UnsupportedOperation(other.to_string())),
        };
        args.finish()?;
        Ok(composite)
    }

    /// In-place forms reply with [`Value::Unit`].
    fn run<H: ImageHandle>(self, proxy: &mut Proxy<H>) -> Result<Forwarded<H>> {
        let image = |result: Result<Proxy<H>>| result.map(Forwarded::Image);
        let value = |value: Value| Ok(Forwarded::Value(value));
        let unit = |result: Result<&mut Proxy<H>>| result.map(|_| Forwarded::Value(Value::Unit));

        match self {
            Composite::Width => value(Value::Dimension(proxy.width())),
            Composite::Height => value(Value::Dimension(proxy.height())),
            Composite::HasBlackPixel => value(Value::Bool(proxy.has_black_pixel()?)),
            Composite::CropBorder { in_place: false } => image(proxy.crop_border()),
            Composite::CropBorder { in_place: true } => unit(proxy.crop_border_in_place()),
            Composite::CropBorderTreatingAsBinary {
                options,
                in_place: false,
            } => image(proxy.crop_border_treating_as_binary(&options)),
            Composite::CropBorderTreatingAsBinary {
                options,
                in_place: true,
            } => unit(proxy.crop_border_treating_as_binary_in_place(&options)),
            Composite::ToBinary {
                options,
                in_place: false,
            } => image(proxy.to_binary(&options)),
            Composite::ToBinary {
                options,
                in_place: true,
            } => unit(proxy.to_binary_in_place(&options)),
            Composite::IsOversize {
                max_width,
                max_height,
            } => value(Value::Bool(proxy.is_oversize(max_width, max_height))),
            Composite::FitToSize {
                max_width,
                max_height,
                in_place: false,
            } => image(proxy.fit_to_size(max_width, max_height)),
            Composite::FitToSize {
                max_width,
                max_height,
                in_place: true,
            } => unit(proxy.fit_to_size_in_place(max_width, max_height)),
            Composite::ExtentInPlace {
                width,
                height,
                x,
                y,
            } => unit(proxy.extent_in_place(width, height, x, y)),
            Composite::LevelInPlace(params) => unit(proxy.level_in_place(&params)),
            Composite::OrderedDitherInPlace(map) => unit(proxy.ordered_dither_in_place(map)),
            Composite::QuantizeInPlace(params) => unit(proxy.quantize_in_place(&params)),
            Composite::Display => {
                proxy.display()?;
                value(Value::Unit)
            }
        }
    }
}

fn binary_options(args: &mut ArgReader<'_>) -> Result<BinaryOptions> {
    let defaults = BinaryOptions::default();
    Ok(BinaryOptions {
        gray_levels: args.optional("gray_levels", defaults.gray_levels)?,
        quantize_dither: args.optional("quantize_dither", defaults.quantize_dither)?,
        threshold_map: args.optional("threshold_map", defaults.threshold_map)?,
    })
}
