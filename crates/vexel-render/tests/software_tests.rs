//! End-to-end tests of the drawing contract on the software backend.

use std::path::PathBuf;
use std::sync::Arc;

use vexel_render::{
    Color, Drawing, DrawingError, Flip, NullDrawing, PixelFormat, Rect, SoftwareDrawing, Surface,
    SurfaceUsage,
};

/// Write a 16x16 PNG whose pixel (x, y) is (x*16, y*16, 7, 255).
fn write_test_source(dir: &tempfile::TempDir) -> PathBuf {
    let mut image = image::RgbaImage::new(16, 16);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        *pixel = image::Rgba([(x * 16) as u8, (y * 16) as u8, 7, 255]);
    }
    let path = dir.path().join("source.png");
    image.save(&path).unwrap();
    path
}

fn pixel(mapped: &vexel_render::MappedSurface, x: u32, y: u32) -> [u8; 4] {
    let offset = (y * mapped.stride() + x * 4) as usize;
    mapped.data()[offset..offset + 4].try_into().unwrap()
}

#[test]
fn flipped_blit_into_cleared_output() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = write_test_source(&dir);

    let mut drawing = SoftwareDrawing::new();
    let output = drawing
        .create_surface(64, 64, PixelFormat::Argb32, SurfaceUsage::OUTPUT)
        .unwrap();
    drawing.set_surface(Some(output.clone())).unwrap();

    let source = drawing.create_surface_from_file(&source_path, &[]).unwrap();

    drawing.clear(Color::RED);
    drawing
        .draw_surface(
            source.as_ref(),
            Rect::new(0, 0, 16, 16),
            Rect::new(0.0, 0.0, 16.0, 16.0),
            Flip::Horizontal,
        )
        .unwrap();
    drawing.flush().unwrap();

    let mapped = output.map().unwrap();
    assert_eq!(mapped.stride(), 64 * 4);
    assert_eq!(mapped.len(), 64 * 64 * 4);

    // horizontally mirrored: output (0,0) shows source (15,0)
    assert_eq!(pixel(&mapped, 0, 0), [240, 0, 7, 255]);
    assert_eq!(pixel(&mapped, 15, 0), [0, 0, 7, 255]);
    assert_eq!(pixel(&mapped, 0, 15), [240, 240, 7, 255]);

    // everything outside the 16x16 block stays pure red
    let red = [255, 0, 0, 255];
    for x in 0..64 {
        for y in 0..64 {
            if x >= 16 || y >= 16 {
                assert_eq!(pixel(&mapped, x, y), red, "pixel ({}, {})", x, y);
            }
        }
    }
}

#[test]
fn png_round_trip_is_lossless() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = write_test_source(&dir);

    let drawing = SoftwareDrawing::new();
    let source = drawing.create_surface_from_file(&source_path, &[]).unwrap();

    let saved_path = dir.path().join("copy.png");
    source.save(&saved_path).unwrap();
    let reloaded = drawing.create_surface_from_file(&saved_path, &[]).unwrap();

    assert_eq!(reloaded.size(), source.size());
    assert_eq!(reloaded.map().unwrap().data(), source.map().unwrap().data());
}

#[test]
fn color_key_zeroes_whole_pixel() {
    let dir = tempfile::tempdir().unwrap();
    let mut image = image::RgbaImage::new(4, 1);
    image.put_pixel(0, 0, image::Rgba([255, 0, 255, 255]));
    image.put_pixel(1, 0, image::Rgba([10, 20, 30, 255]));
    image.put_pixel(2, 0, image::Rgba([255, 0, 255, 255]));
    image.put_pixel(3, 0, image::Rgba([255, 0, 254, 255]));
    let path = dir.path().join("keyed.png");
    image.save(&path).unwrap();

    let drawing = SoftwareDrawing::new();
    let surface = drawing
        .create_surface_from_file(&path, &[Color::MAGENTA])
        .unwrap();
    let mapped = surface.map().unwrap();

    // matches lose their color bytes too, near-matches are untouched
    assert_eq!(pixel(&mapped, 0, 0), [0, 0, 0, 0]);
    assert_eq!(pixel(&mapped, 1, 0), [10, 20, 30, 255]);
    assert_eq!(pixel(&mapped, 2, 0), [0, 0, 0, 0]);
    assert_eq!(pixel(&mapped, 3, 0), [255, 0, 254, 255]);
}

#[test]
fn alpha_blit_blends_source_over() {
    let mut drawing = SoftwareDrawing::new();
    let output = drawing
        .create_surface(8, 8, PixelFormat::Argb32, SurfaceUsage::OUTPUT)
        .unwrap();
    drawing.set_surface(Some(output.clone())).unwrap();
    drawing.clear(Color::BLACK);

    let dir = tempfile::tempdir().unwrap();
    let mut white = image::RgbaImage::new(8, 8);
    for pixel in white.pixels_mut() {
        *pixel = image::Rgba([255, 255, 255, 255]);
    }
    let path = dir.path().join("white.png");
    white.save(&path).unwrap();
    let source = drawing.create_surface_from_file(&path, &[]).unwrap();

    drawing
        .draw_surface_alpha(
            source.as_ref(),
            Rect::new(0, 0, 8, 8),
            Rect::new(0.0, 0.0, 8.0, 8.0),
            0.5,
            Flip::None,
        )
        .unwrap();

    let mapped = output.map().unwrap();
    let [r, g, b, a] = pixel(&mapped, 4, 4);
    assert!((126..=129).contains(&r));
    assert_eq!(r, g);
    assert_eq!(g, b);
    assert_eq!(a, 255);
}

#[test]
fn fill_and_stroke_rectangles() {
    let mut drawing = SoftwareDrawing::new();
    let output = drawing
        .create_surface(32, 32, PixelFormat::Argb32, SurfaceUsage::OUTPUT)
        .unwrap();
    drawing.set_surface(Some(output.clone())).unwrap();
    drawing.clear(Color::BLACK);

    drawing
        .fill_rectangle(Rect::new(4.0, 4.0, 8.0, 8.0), Color::GREEN)
        .unwrap();
    drawing
        .draw_rectangle(Rect::new(16.0, 16.0, 10.0, 10.0), Color::BLUE, 2.0)
        .unwrap();

    let mapped = output.map().unwrap();
    assert_eq!(pixel(&mapped, 5, 5), [0, 255, 0, 255]);
    assert_eq!(pixel(&mapped, 0, 0), [0, 0, 0, 255]);
    // stroke covers the border, not the interior
    assert_eq!(pixel(&mapped, 16, 16), [0, 0, 255, 255]);
    assert_eq!(pixel(&mapped, 21, 21), [0, 0, 0, 255]);
}

#[test]
fn stroke_width_must_be_positive() {
    let mut drawing = SoftwareDrawing::new();
    let result = drawing.draw_rectangle(Rect::new(0.0, 0.0, 4.0, 4.0), Color::WHITE, -1.0);
    assert!(matches!(result, Err(DrawingError::InvalidParameter(_))));
}

#[test]
fn draws_without_output_are_noops() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = write_test_source(&dir);

    let mut drawing = SoftwareDrawing::new();
    let source = drawing.create_surface_from_file(&source_path, &[]).unwrap();
    drawing
        .draw_surface_at(source.as_ref(), 0.0, 0.0, Flip::None)
        .unwrap();
    assert!(drawing.surface().is_none());
}

#[test]
fn foreign_surfaces_are_rejected() {
    let mut software = SoftwareDrawing::new();
    let null = NullDrawing::new();
    let foreign: Arc<dyn Surface> = null
        .create_surface(8, 8, PixelFormat::Argb32, SurfaceUsage::INPUT)
        .unwrap();

    assert!(matches!(
        software.set_surface(Some(foreign.clone())),
        Err(DrawingError::InvalidSurface)
    ));
    assert!(matches!(
        software.draw_surface_at(foreign.as_ref(), 0.0, 0.0, Flip::None),
        Err(DrawingError::InvalidSurface)
    ));
}

#[test]
fn unsupported_draw_paths_signal_not_implemented() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = write_test_source(&dir);

    let mut drawing = SoftwareDrawing::new();
    let output = drawing
        .create_surface(16, 16, PixelFormat::Argb32, SurfaceUsage::OUTPUT)
        .unwrap();
    drawing.set_surface(Some(output)).unwrap();
    let source = drawing.create_surface_from_file(&source_path, &[]).unwrap();

    let gradient = drawing.draw_surface_gradient(
        source.as_ref(),
        Rect::new(0, 0, 16, 16),
        Rect::new(0.0, 0.0, 16.0, 16.0),
        [Color::RED, Color::GREEN, Color::BLUE, Color::WHITE],
    );
    assert!(matches!(gradient, Err(DrawingError::Unsupported(_))));

    let transformed = drawing.draw_surface_transformed(
        source.as_ref(),
        Rect::new(0, 0, 16, 16),
        Rect::new(0.0, 0.0, 16.0, 16.0),
        Color::WHITE,
        &vexel_render::SurfaceTransform::default(),
        Flip::None,
    );
    assert!(matches!(transformed, Err(DrawingError::Unsupported(_))));
}

#[test]
fn scaled_blit_with_vertical_flip() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = write_test_source(&dir);

    let mut drawing = SoftwareDrawing::new();
    let output = drawing
        .create_surface(32, 32, PixelFormat::Argb32, SurfaceUsage::OUTPUT)
        .unwrap();
    drawing.set_surface(Some(output.clone())).unwrap();
    drawing.clear(Color::BLACK);

    let source = drawing.create_surface_from_file(&source_path, &[]).unwrap();
    // 16x16 source doubled into 32x32, upside down
    drawing
        .draw_surface_dst(
            source.as_ref(),
            Rect::new(0.0, 0.0, 32.0, 32.0),
            Flip::Vertical,
        )
        .unwrap();

    let mapped = output.map().unwrap();
    // output row 0 samples source row 15, output row 31 samples source row 0
    assert_eq!(pixel(&mapped, 0, 0), [0, 240, 7, 255]);
    assert_eq!(pixel(&mapped, 0, 31), [0, 0, 7, 255]);
}
