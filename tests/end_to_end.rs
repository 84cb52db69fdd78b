//! End-to-end tests through the public API: files on disk in, files out.

use binimage::imaging::{BinaryOptions, BoundingBox, ImageHandle, PixelMap, RasterHandle, Value};
use binimage::{BinMagickError, Forwarded, Proxy};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Save a white page with `color` filled into `rect = (x, y, w, h)`.
fn write_page(
    dir: &TempDir,
    name: &str,
    size: (u32, u32),
    rect: Option<(u32, u32, u32, u32)>,
    color: Rgb<u8>,
) -> PathBuf {
    let mut img = RgbImage::from_pixel(size.0, size.1, WHITE);
    if let Some((x, y, w, h)) = rect {
        for row in y..y + h {
            for col in x..x + w {
                img.put_pixel(col, row, color);
            }
        }
    }
    let path = dir.path().join(name);
    img.save(&path).unwrap();
    path
}

fn load(path: &Path) -> Proxy {
    Proxy::load_from_file(path).unwrap()
}

fn pixels(proxy: &Proxy) -> Vec<u8> {
    proxy
        .image()
        .dispatch(0, 0, proxy.columns(), proxy.rows(), PixelMap::Rgb)
        .unwrap()
}

#[test]
fn crop_border_of_scanned_square() {
    let tmp = TempDir::new().unwrap();
    let input = write_page(&tmp, "page.png", (100, 100), Some((40, 40, 10, 10)), BLACK);

    let page = load(&input);
    assert!(page.has_black_pixel().unwrap());

    let cropped = page.crop_border().unwrap();
    let output = tmp.path().join("cropped.png");
    cropped.image().write(&output).unwrap();

    let back = load(&output);
    assert_eq!((back.width(), back.height()), (10, 10));
    assert!(pixels(&back).iter().all(|&v| v == 0));
}

#[test]
fn crop_border_of_blank_page_is_unchanged() {
    let tmp = TempDir::new().unwrap();
    let input = write_page(&tmp, "blank.png", (100, 100), None, BLACK);

    let page = load(&input);
    assert!(!page.has_black_pixel().unwrap());

    let cropped = page.crop_border().unwrap();
    assert_eq!((cropped.width(), cropped.height()), (100, 100));
    assert_eq!(pixels(&cropped), pixels(&page));
}

#[test]
fn color_scan_crops_when_treated_as_binary() {
    let tmp = TempDir::new().unwrap();
    let blue = Rgb([0, 0, 200]);
    let input = write_page(&tmp, "color.png", (80, 60), Some((10, 5, 20, 30)), blue);
    let page = load(&input);

    assert_eq!(page.crop_border().unwrap().width(), 80);

    let cropped = page
        .crop_border_treating_as_binary(&BinaryOptions::default())
        .unwrap();
    assert_eq!((cropped.width(), cropped.height()), (20, 30));
    assert_eq!(&pixels(&cropped)[..3], &[0, 0, 200]);
}

#[test]
fn transparent_page_reads_as_white_background() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("transparent.png");
    let mut img = RgbaImage::new(100, 100);
    for y in 40..50 {
        for x in 40..50 {
            img.put_pixel(x, y, Rgba([255, 0, 0, 255]));
        }
    }
    img.save(&input).unwrap();

    let page = load(&input);
    assert!(!page.has_black_pixel().unwrap());
    assert_eq!(page.crop_border().unwrap().width(), 100);

    let cropped = page
        .crop_border_treating_as_binary(&BinaryOptions::default())
        .unwrap();
    assert_eq!((cropped.width(), cropped.height()), (10, 10));
    assert_eq!(&pixels(&cropped)[..3], &[255, 0, 0]);
}

#[test]
fn binarized_page_has_two_tones() {
    let tmp = TempDir::new().unwrap();
    let dark = Rgb([40, 40, 40]);
    let input = write_page(&tmp, "gray.png", (32, 32), Some((0, 0, 16, 32)), dark);

    let binary = load(&input).to_binary(&BinaryOptions::default()).unwrap();
    let histogram = binary.image().color_histogram().unwrap();

    assert_eq!(histogram.len(), 2);
    assert_eq!(histogram.count(BLACK) + histogram.count(WHITE), 32 * 32);
}

#[test]
fn fit_to_size_in_place_then_save() {
    let tmp = TempDir::new().unwrap();
    let input = write_page(&tmp, "wide.png", (400, 100), None, BLACK);

    let mut page = load(&input);
    assert!(page.is_oversize(200, 200));
    page.fit_to_size_in_place(200, 200).unwrap();

    let output = tmp.path().join("fitted.png");
    page.image().write(&output).unwrap();
    let back = load(&output);
    assert_eq!((back.width(), back.height()), (200, 50));
    assert!(!back.is_oversize(200, 200));
}

#[test]
fn missing_file_reports_library_message() {
    let err = Proxy::<RasterHandle>::load_from_file("/nonexistent/page.png").unwrap_err();

    assert!(matches!(err, BinMagickError::Io(_)));
    assert!(
        err.to_string()
            .starts_with("Error occurred while reading image from file: ")
    );
}

#[test]
fn by_name_calls_rewrap_images_and_pass_values() {
    let tmp = TempDir::new().unwrap();
    let input = write_page(&tmp, "page.png", (50, 40), Some((5, 6, 7, 8)), BLACK);
    let mut page = load(&input);

    match page.call("flop", &[]).unwrap() {
        Forwarded::Image(flopped) => assert_eq!(flopped.width(), 50),
        Forwarded::Value(v) => panic!("expected an image, got {v:?}"),
    }

    let bbox = page.call("bounding_box", &[]).unwrap().into_value();
    assert_eq!(
        bbox,
        Some(Value::Geometry(BoundingBox {
            x: 5,
            y: 6,
            width: 7,
            height: 8
        }))
    );
}

#[test]
fn unknown_operation_leaves_receiver_unchanged() {
    let tmp = TempDir::new().unwrap();
    let input = write_page(&tmp, "page.png", (20, 20), Some((1, 1, 3, 3)), BLACK);
    let mut page = load(&input);
    let before = pixels(&page);

    let err = page.call("sepia_tone", &["80"]).unwrap_err();
    assert!(matches!(err, BinMagickError::UnsupportedOperation(ref name) if name == "sepia_tone"));
    assert!(!page.responds_to("sepia_tone"));
    assert_eq!(pixels(&page), before);
}

#[test]
fn in_place_call_matches_non_mutating_result() {
    let tmp = TempDir::new().unwrap();
    let input = write_page(&tmp, "page.png", (64, 48), Some((20, 10, 9, 4)), BLACK);
    let mut page = load(&input);
    let expected = page.crop_border().unwrap();

    let reply = page.call("crop_border_in_place", &[]).unwrap();
    assert_eq!(reply.into_value(), Some(Value::Unit));
    assert_eq!((page.width(), page.height()), (9, 4));
    assert_eq!(pixels(&page), pixels(&expected));
}
