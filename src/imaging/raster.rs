//! Pure Rust image library handle built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Primitive | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF first frame) | `image::ImageReader` with format sniffing |
//! | Encode | `image::ImageBuffer::save` (format from extension) |
//! | Crop | `image::imageops::crop_imm` |
//! | Resize to fit | `image::imageops::resize` with `Lanczos3` |
//! | Extent | white canvas + `image::imageops::replace` |
//! | Flip / flop | `image::imageops::flip_vertical` / `flip_horizontal` |
//! | Level, ordered dither, quantize, bounding box, histogram | [`calculations`](super::calculations) |
//!
//! Pixels are held as 8-bit RGB. Images with alpha are flattened onto white
//! on decode, so transparent areas read as white background.

use super::backend::{BoundingBox, ColorHistogram, ImageHandle, LibraryError};
use super::calculations::{
    canvas_fits, dither_channel, fit_dimensions, flatten_on_white, is_oversize, level_value, luma,
    nearest_tone, tones_per_channel,
};
use super::params::{Colorspace, DitherMethod, LevelParams, PixelMap, QuantizeParams, ThresholdMap};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageReader, Rgb, RgbImage};
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;
use tracing::{debug, info, trace};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Widest terminal preview `display` draws, in character cells.
const PREVIEW_COLUMNS: u32 = 80;

/// An in-memory RGB raster. Empty once [`destroy`](Self::destroy) is called.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterHandle {
    pixels: Option<RgbImage>,
    mean_error: Option<f64>,
}

impl RasterHandle {
    pub fn from_rgb(pixels: RgbImage) -> Self {
        Self {
            pixels: Some(pixels),
            mean_error: None,
        }
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        if !image.color().has_alpha() {
            return Self::from_rgb(image.into_rgb8());
        }
        let rgba = image.into_rgba8();
        Self::from_rgb(RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            flatten_on_white(*rgba.get_pixel(x, y))
        }))
    }

    /// A white `columns × rows` canvas.
    pub fn blank(columns: u32, rows: u32) -> Self {
        Self::filled(columns, rows, WHITE)
    }

    pub fn filled(columns: u32, rows: u32, color: Rgb<u8>) -> Self {
        Self::from_rgb(RgbImage::from_pixel(columns, rows, color))
    }

    /// Borrow the pixel buffer.
    pub fn as_rgb(&self) -> Result<&RgbImage, LibraryError> {
        self.pixels.as_ref().ok_or(LibraryError::Destroyed)
    }

    /// Release the pixel buffer. Every later primitive fails with
    /// [`LibraryError::Destroyed`].
    pub fn destroy(&mut self) {
        self.pixels = None;
    }

    /// Mean per-pixel error (0.0–1.0) recorded by a `quantize` call with
    /// `measure_error` set.
    pub fn mean_error_per_pixel(&self) -> Option<f64> {
        self.mean_error
    }

    /// Truecolor half-block rendering, two pixel rows per text line.
    pub fn render_preview(&self, max_columns: u32) -> Result<String, LibraryError> {
        let img = self.as_rgb()?;
        let bounds = (max_columns, max_columns);
        let scaled;
        let img = if is_oversize(img.dimensions(), bounds) {
            let (w, h) = fit_dimensions(img.dimensions(), bounds);
            scaled = imageops::resize(img, w, h, FilterType::Triangle);
            &scaled
        } else {
            img
        };

        let mut out = String::new();
        for y in (0..img.height()).step_by(2) {
            for x in 0..img.width() {
                let [tr, tg, tb] = img.get_pixel(x, y).0;
                let [br, bg, bb] = if y + 1 < img.height() {
                    img.get_pixel(x, y + 1).0
                } else {
                    [tr, tg, tb]
                };
                let _ = write!(out, "\x1b[38;2;{tr};{tg};{tb}m\x1b[48;2;{br};{bg};{bb}m\u{2580}");
            }
            out.push_str("\x1b[0m\n");
        }
        Ok(out)
    }

    fn map_channels(&self, f: impl Fn(u8, u32, u32) -> u8) -> Result<Self, LibraryError> {
        let mut out = self.as_rgb()?.clone();
        for (x, y, pixel) in out.enumerate_pixels_mut() {
            for channel in pixel.0.iter_mut() {
                *channel = f(*channel, x, y);
            }
        }
        Ok(Self::from_rgb(out))
    }
}

fn check_canvas(width: u32, height: u32) -> Result<(), LibraryError> {
    if canvas_fits((width, height)) {
        Ok(())
    } else {
        Err(LibraryError::InvalidGeometry(format!(
            "{width}x{height} exceeds the canvas size limit"
        )))
    }
}

fn invalid_geometry(
    width: u32,
    height: u32,
    x: impl std::fmt::Display,
    y: impl std::fmt::Display,
    img: &RgbImage,
) -> LibraryError {
    LibraryError::InvalidGeometry(format!(
        "{width}x{height}+{x}+{y} does not fit a {}x{} image",
        img.width(),
        img.height()
    ))
}

/// Reduce interleaved samples to `tones` levels, optionally with
/// Floyd–Steinberg error diffusion. Returns the reduced samples.
fn reduce_tones(
    samples: &[f32],
    width: usize,
    channels: usize,
    tones: u32,
    dither: DitherMethod,
) -> Vec<u8> {
    let mut work = samples.to_vec();
    let mut out = Vec::with_capacity(work.len());
    let stride = width * channels;
    let height = if stride == 0 { 0 } else { work.len() / stride };

    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let i = y * stride + x * channels + c;
                let old = work[i];
                let new = nearest_tone(old, tones);
                out.push(new as u8);

                if dither == DitherMethod::FloydSteinberg {
                    let err = old - new;
                    let mut spread = |dx: isize, dy: usize, weight: f32| {
                        let nx = x as isize + dx;
                        let ny = y + dy;
                        if nx >= 0 && (nx as usize) < width && ny < height {
                            work[ny * stride + nx as usize * channels + c] += err * weight;
                        }
                    };
                    spread(1, 0, 7.0 / 16.0);
                    spread(-1, 1, 3.0 / 16.0);
                    spread(0, 1, 5.0 / 16.0);
                    spread(1, 1, 1.0 / 16.0);
                }
            }
        }
    }
    out
}

impl ImageHandle for RasterHandle {
    fn read(path: &Path) -> Result<Self, LibraryError> {
        let decoded = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| LibraryError::Decode {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        debug!(
            path = %path.display(),
            width = decoded.width(),
            height = decoded.height(),
            "decoded image"
        );
        Ok(Self::from_dynamic(decoded))
    }

    fn constitute(
        columns: u32,
        rows: u32,
        map: PixelMap,
        pixels: &[u8],
    ) -> Result<Self, LibraryError> {
        if columns == 0 || rows == 0 {
            return Err(LibraryError::InvalidGeometry(format!(
                "cannot constitute a {columns}x{rows} image"
            )));
        }
        let expected = columns as usize * rows as usize * map.channels();
        if pixels.len() != expected {
            return Err(LibraryError::PixelBuffer {
                expected,
                actual: pixels.len(),
            });
        }

        let rgb: Vec<u8> = match map {
            PixelMap::Rgb => pixels.to_vec(),
            PixelMap::Rgba => pixels
                .chunks_exact(4)
                .flat_map(|p| [p[0], p[1], p[2]])
                .collect(),
            PixelMap::Intensity => pixels.iter().flat_map(|&v| [v, v, v]).collect(),
        };
        RgbImage::from_raw(columns, rows, rgb)
            .map(Self::from_rgb)
            .ok_or(LibraryError::PixelBuffer {
                expected,
                actual: pixels.len(),
            })
    }

    fn columns(&self) -> u32 {
        self.pixels.as_ref().map_or(0, |img| img.width())
    }

    fn rows(&self) -> u32 {
        self.pixels.as_ref().map_or(0, |img| img.height())
    }

    fn is_destroyed(&self) -> bool {
        self.pixels.is_none()
    }

    fn dispatch(
        &self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        map: PixelMap,
    ) -> Result<Vec<u8>, LibraryError> {
        let img = self.as_rgb()?;
        if x as u64 + width as u64 > img.width() as u64
            || y as u64 + height as u64 > img.height() as u64
        {
            return Err(invalid_geometry(width, height, x, y, img));
        }

        let mut out = Vec::with_capacity(width as usize * height as usize * map.channels());
        for row in y..y + height {
            for col in x..x + width {
                let pixel = *img.get_pixel(col, row);
                match map {
                    PixelMap::Rgb => out.extend_from_slice(&pixel.0),
                    PixelMap::Rgba => {
                        out.extend_from_slice(&pixel.0);
                        out.push(u8::MAX);
                    }
                    PixelMap::Intensity => out.push(luma(pixel).round() as u8),
                }
            }
        }
        Ok(out)
    }

    fn color_histogram(&self) -> Result<ColorHistogram, LibraryError> {
        Ok(self.as_rgb()?.pixels().copied().collect())
    }

    fn bounding_box(&self) -> Result<BoundingBox, LibraryError> {
        let img = self.as_rgb()?;
        let (w, h) = img.dimensions();
        let whole = BoundingBox {
            x: 0,
            y: 0,
            width: w,
            height: h,
        };
        let Some(&background) = img.pixels().next() else {
            return Ok(whole);
        };

        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, pixel) in img.enumerate_pixels() {
            if *pixel == background {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }

        Ok(bounds.map_or(whole, |(x0, y0, x1, y1)| BoundingBox {
            x: x0,
            y: y0,
            width: x1 - x0 + 1,
            height: y1 - y0 + 1,
        }))
    }

    fn copy(&self) -> Result<Self, LibraryError> {
        Ok(Self::from_rgb(self.as_rgb()?.clone()))
    }

    fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Result<Self, LibraryError> {
        let img = self.as_rgb()?;
        if width == 0 || height == 0 || x >= img.width() || y >= img.height() {
            return Err(invalid_geometry(width, height, x, y, img));
        }
        let width = width.min(img.width() - x);
        let height = height.min(img.height() - y);
        trace!(x, y, width, height, "crop");
        Ok(Self::from_rgb(
            imageops::crop_imm(img, x, y, width, height).to_image(),
        ))
    }

    fn resize_to_fit(&self, width: u32, height: u32) -> Result<Self, LibraryError> {
        let img = self.as_rgb()?;
        if width == 0 || height == 0 {
            return Err(invalid_geometry(width, height, 0, 0, img));
        }
        let (w, h) = fit_dimensions(img.dimensions(), (width, height));
        check_canvas(w, h)?;
        trace!(from_w = img.width(), from_h = img.height(), w, h, "resize_to_fit");
        if (w, h) == img.dimensions() {
            return self.copy();
        }
        Ok(Self::from_rgb(imageops::resize(
            img,
            w,
            h,
            FilterType::Lanczos3,
        )))
    }

    fn extent(&self, width: u32, height: u32, x: i64, y: i64) -> Result<Self, LibraryError> {
        let img = self.as_rgb()?;
        if width == 0 || height == 0 {
            return Err(invalid_geometry(width, height, x, y, img));
        }
        check_canvas(width, height)?;
        let mut canvas = RgbImage::from_pixel(width, height, WHITE);
        imageops::replace(&mut canvas, img, -x, -y);
        Ok(Self::from_rgb(canvas))
    }

    fn level2(&self, params: &LevelParams) -> Result<Self, LibraryError> {
        if !(params.gamma.is_finite() && params.gamma > 0.0) {
            return Err(LibraryError::InvalidParameter(format!(
                "gamma must be positive, got {}",
                params.gamma
            )));
        }
        let lut: Vec<u8> = (0..=u8::MAX)
            .map(|v| level_value(v, params.black_point, params.white_point, params.gamma))
            .collect();
        self.map_channels(|v, _, _| lut[v as usize])
    }

    fn ordered_dither(&self, map: ThresholdMap) -> Result<Self, LibraryError> {
        trace!(%map, "ordered_dither");
        self.map_channels(|v, x, y| dither_channel(v, x, y, map))
    }

    fn quantize(&self, params: &QuantizeParams) -> Result<Self, LibraryError> {
        if params.colors == 0 {
            return Err(LibraryError::InvalidParameter(
                "number of colors must be at least 1".into(),
            ));
        }
        if params.tree_depth > 8 {
            return Err(LibraryError::InvalidParameter(format!(
                "tree depth must be 0-8, got {}",
                params.tree_depth
            )));
        }

        let img = self.as_rgb()?;
        let (w, h) = img.dimensions();
        let tones = tones_per_channel(params.colors, params.colorspace, params.tree_depth);
        let (samples, channels): (Vec<f32>, usize) = match params.colorspace {
            Colorspace::Gray => (img.pixels().map(|p| luma(*p)).collect(), 1),
            Colorspace::Rgb => (img.as_raw().iter().map(|&v| v as f32).collect(), 3),
        };
        trace!(tones, colorspace = ?params.colorspace, dither = ?params.dither, "quantize");

        let reduced = reduce_tones(&samples, w as usize, channels, tones, params.dither);
        let mean_error = params.measure_error.then(|| {
            let total: f64 = samples
                .iter()
                .zip(&reduced)
                .map(|(&s, &r)| (s as f64 - r as f64).abs())
                .sum();
            total / (samples.len().max(1) as f64 * 255.0)
        });
        if let Some(error) = mean_error {
            info!(mean_error_per_pixel = error, tones, "quantize error measured");
        }

        let rgb = match params.colorspace {
            Colorspace::Gray => reduced.iter().flat_map(|&v| [v, v, v]).collect(),
            Colorspace::Rgb => reduced,
        };
        let pixels = RgbImage::from_raw(w, h, rgb).ok_or(LibraryError::PixelBuffer {
            expected: w as usize * h as usize * 3,
            actual: samples.len() * 3 / channels,
        })?;
        Ok(Self {
            pixels: Some(pixels),
            mean_error,
        })
    }

    fn flip(&self) -> Result<Self, LibraryError> {
        Ok(Self::from_rgb(imageops::flip_vertical(self.as_rgb()?)))
    }

    fn flop(&self) -> Result<Self, LibraryError> {
        Ok(Self::from_rgb(imageops::flip_horizontal(self.as_rgb()?)))
    }

    fn write(&self, path: &Path) -> Result<(), LibraryError> {
        self.as_rgb()?
            .save(path)
            .map_err(|e| LibraryError::Encode {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        debug!(path = %path.display(), "wrote image");
        Ok(())
    }

    fn display(&self) -> Result<(), LibraryError> {
        let preview = self.render_preview(PREVIEW_COLUMNS)?;
        let mut stderr = std::io::stderr().lock();
        stderr.write_all(preview.as_bytes())?;
        stderr.flush()?;
        Ok(())
    }
}
