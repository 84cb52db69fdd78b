//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Info
//!
//! ```text
//! scan.png
//!     Size: 100x100
//!     Black pixel: yes
//!     Bounding box: 10x10+40+40
//!     Colors: 2
//! ```
//!
//! ## Image-producing commands
//!
//! ```text
//! scan.png (100x100) → cropped.png (10x10)
//! ```
//!
//! ## Values from `call`
//!
//! ```text
//! bounding_box: 10x10+40+40
//! color_histogram: 2 colors
//!     white 9900
//!     black 100
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::error::Result;
use crate::imaging::{BoundingBox, ImageHandle, Value};
use crate::proxy::Proxy;
use serde::Serialize;
use std::path::Path;

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// ImageMagick-style geometry: `WxH+X+Y`.
pub fn geometry(bb: &BoundingBox) -> String {
    format!("{}x{}+{}+{}", bb.width, bb.height, bb.x, bb.y)
}

// ============================================================================
// Info
// ============================================================================

/// Summary of one image, as reported by `binimage info`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInfo {
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub has_black_pixel: bool,
    pub bounding_box: BoundingBox,
    pub colors: usize,
}

impl ImageInfo {
    pub fn gather<H: ImageHandle>(proxy: &Proxy<H>, source: &Path) -> Result<Self> {
        Ok(Self {
            source: source.display().to_string(),
            width: proxy.width(),
            height: proxy.height(),
            has_black_pixel: proxy.has_black_pixel()?,
            bounding_box: proxy.image().bounding_box()?,
            colors: proxy.image().color_histogram()?.len(),
        })
    }
}

pub fn format_info(info: &ImageInfo) -> Vec<String> {
    vec![
        info.source.clone(),
        format!("{}Size: {}x{}", indent(1), info.width, info.height),
        format!("{}Black pixel: {}", indent(1), yes_no(info.has_black_pixel)),
        format!("{}Bounding box: {}", indent(1), geometry(&info.bounding_box)),
        format!("{}Colors: {}", indent(1), info.colors),
    ]
}

pub fn print_info(info: &ImageInfo) {
    for line in format_info(info) {
        println!("{line}");
    }
}

// ============================================================================
// Image-producing commands
// ============================================================================

pub fn format_written(input: &Path, from: (u32, u32), output: &Path, to: (u32, u32)) -> String {
    format!(
        "{} ({}x{}) → {} ({}x{})",
        input.display(),
        from.0,
        from.1,
        output.display(),
        to.0,
        to.1
    )
}

// ============================================================================
// Forwarded values
// ============================================================================

/// Largest number of histogram entries listed under a `color_histogram` reply.
const HISTOGRAM_LINES: usize = 16;

pub fn format_value(operation: &str, value: &Value) -> Vec<String> {
    match value {
        Value::Unit => vec![format!("{operation}: ok")],
        Value::Bool(flag) => vec![format!("{operation}: {flag}")],
        Value::Dimension(n) => vec![format!("{operation}: {n}")],
        Value::Geometry(bb) => vec![format!("{operation}: {}", geometry(bb))],
        Value::Pixels(bytes) => vec![format!("{operation}: {} bytes", bytes.len())],
        Value::Histogram(histogram) => {
            let mut entries: Vec<(String, usize)> = histogram.by_name().into_iter().collect();
            entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

            let mut lines = vec![format!("{operation}: {} colors", entries.len())];
            lines.extend(
                entries
                    .iter()
                    .take(HISTOGRAM_LINES)
                    .map(|(name, count)| format!("{}{name} {count}", indent(1))),
            );
            if entries.len() > HISTOGRAM_LINES {
                lines.push(format!(
                    "{}... {} more",
                    indent(1),
                    entries.len() - HISTOGRAM_LINES
                ));
            }
            lines
        }
    }
}

pub fn print_value(operation: &str, value: &Value) {
    for line in format_value(operation, value) {
        println!("{line}");
    }
}
