//! CPU rasterization backend.
//!
//! A thin collaborator next to the batched GPU path: surfaces are plain
//! RGBA8 images and every draw is an immediate scanline loop. Blits sample
//! nearest-neighbor regardless of the stored filter.

use std::any::Any;
use std::path::Path;
use std::sync::{Arc, Mutex};

use image::RgbaImage;

use vexel_core::{bitmap, Color, PixelFormat, Rect};

use crate::drawing::{Drawing, Filter, Flip};
use crate::error::DrawingError;
use crate::surface::{MappedSurface, Surface, SurfaceUsage};

/// A surface held in CPU memory as tightly packed RGBA8 rows.
pub struct SoftwareSurface {
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    image: Mutex<RgbaImage>,
}

impl SoftwareSurface {
    fn new(image: RgbaImage, pixel_format: PixelFormat) -> Arc<Self> {
        let (width, height) = image.dimensions();
        Arc::new(Self {
            width,
            height,
            pixel_format,
            image: Mutex::new(image),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RgbaImage> {
        self.image.lock().expect("surface lock poisoned")
    }
}

impl Surface for SoftwareSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    fn map(&self) -> Result<MappedSurface, DrawingError> {
        let image = self.lock();
        Ok(MappedSurface::new(image.as_raw().clone(), self.width * 4))
    }

    fn save(&self, path: &Path) -> Result<(), DrawingError> {
        self.lock().save(path)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Source-over blend of a straight-alpha color onto one pixel.
fn blend_pixel(dst: &mut image::Rgba<u8>, src: [f32; 4]) {
    let sa = src[3].clamp(0.0, 1.0);
    for channel in 0..3 {
        let blended = src[channel].clamp(0.0, 1.0) * 255.0 * sa
            + dst.0[channel] as f32 * (1.0 - sa);
        dst.0[channel] = (blended + 0.5) as u8;
    }
    let alpha = sa * 255.0 + dst.0[3] as f32 * (1.0 - sa);
    dst.0[3] = (alpha + 0.5) as u8;
}

/// Nearest-neighbor scaled blit of `src` in `src_img` onto `dst` in
/// `dst_img`, tinted by `tint`, honoring the flip permutation.
fn blit(
    dst_img: &mut RgbaImage,
    src_img: &RgbaImage,
    src: Rect<i32>,
    dst: Rect<f32>,
    tint: Color,
    flip: Flip,
) {
    if src.width <= 0 || src.height <= 0 || dst.width <= 0.0 || dst.height <= 0.0 {
        return;
    }

    let dst_x = dst.x.round() as i64;
    let dst_y = dst.y.round() as i64;
    let dst_w = dst.width.round().max(1.0) as i64;
    let dst_h = dst.height.round().max(1.0) as i64;
    let tint = tint.clamped();

    for oy in 0..dst_h {
        let py = dst_y + oy;
        if py < 0 || py >= dst_img.height() as i64 {
            continue;
        }
        let mut sy = (oy * src.height as i64) / dst_h;
        if flip.mirrors_y() {
            sy = src.height as i64 - 1 - sy;
        }
        let sy = src.y as i64 + sy;
        if sy < 0 || sy >= src_img.height() as i64 {
            continue;
        }

        for ox in 0..dst_w {
            let px = dst_x + ox;
            if px < 0 || px >= dst_img.width() as i64 {
                continue;
            }
            let mut sx = (ox * src.width as i64) / dst_w;
            if flip.mirrors_x() {
                sx = src.width as i64 - 1 - sx;
            }
            let sx = src.x as i64 + sx;
            if sx < 0 || sx >= src_img.width() as i64 {
                continue;
            }

            let texel = src_img.get_pixel(sx as u32, sy as u32);
            let src_color = [
                texel.0[0] as f32 / 255.0 * tint.r,
                texel.0[1] as f32 / 255.0 * tint.g,
                texel.0[2] as f32 / 255.0 * tint.b,
                texel.0[3] as f32 / 255.0 * tint.a,
            ];
            blend_pixel(dst_img.get_pixel_mut(px as u32, py as u32), src_color);
        }
    }
}

/// Source-over fill of a clipped pixel rectangle.
fn fill(dst_img: &mut RgbaImage, rect: Rect<f32>, color: Color) {
    let color = color.clamped();
    let x0 = rect.x.round().max(0.0) as u32;
    let y0 = rect.y.round().max(0.0) as u32;
    let x1 = (rect.right().round().max(0.0) as u32).min(dst_img.width());
    let y1 = (rect.bottom().round().max(0.0) as u32).min(dst_img.height());

    for y in y0..y1 {
        for x in x0..x1 {
            blend_pixel(dst_img.get_pixel_mut(x, y), color.to_array());
        }
    }
}

/// A [`Drawing`] backend rasterizing on the CPU.
pub struct SoftwareDrawing {
    output: Option<Arc<dyn Surface>>,
    filter: Filter,
}

impl SoftwareDrawing {
    pub fn new() -> Self {
        Self {
            output: None,
            filter: Filter::Nearest,
        }
    }

    fn target(&self) -> Option<&SoftwareSurface> {
        self.output
            .as_deref()
            .and_then(|surface| surface.as_any().downcast_ref())
    }

    fn downcast<'a>(&self, surface: &'a dyn Surface) -> Result<&'a SoftwareSurface, DrawingError> {
        surface
            .as_any()
            .downcast_ref::<SoftwareSurface>()
            .ok_or(DrawingError::InvalidSurface)
    }
}

impl Default for SoftwareDrawing {
    fn default() -> Self {
        Self::new()
    }
}

impl Drawing for SoftwareDrawing {
    fn surface(&mut self) -> Option<Arc<dyn Surface>> {
        self.output.clone()
    }

    fn set_surface(&mut self, surface: Option<Arc<dyn Surface>>) -> Result<(), DrawingError> {
        if let Some(surface) = &surface {
            self.downcast(surface.as_ref())?;
        }
        self.output = surface;
        Ok(())
    }

    fn filter(&self) -> Filter {
        self.filter
    }

    fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    fn create_surface(
        &self,
        width: u32,
        height: u32,
        format: PixelFormat,
        _usage: SurfaceUsage,
    ) -> Result<Arc<dyn Surface>, DrawingError> {
        if width == 0 || height == 0 {
            return Err(DrawingError::InvalidParameter(
                "surface dimensions must be non-zero",
            ));
        }
        let surface: Arc<dyn Surface> = SoftwareSurface::new(RgbaImage::new(width, height), format);
        Ok(surface)
    }

    fn create_surface_from_file(
        &self,
        path: &Path,
        color_keys: &[Color],
    ) -> Result<Arc<dyn Surface>, DrawingError> {
        let mut image = image::open(path)?.to_rgba8();
        let (width, height) = image.dimensions();
        if !color_keys.is_empty() {
            bitmap::make_transparent(&mut image, width as usize * 4, height as usize, color_keys);
        }
        let surface: Arc<dyn Surface> = SoftwareSurface::new(image, PixelFormat::Argb32);
        Ok(surface)
    }

    fn flush(&mut self) -> Result<(), DrawingError> {
        // draws are immediate; nothing is ever staged
        Ok(())
    }

    fn clear(&mut self, color: Color) {
        let Some(target) = self.target() else {
            return;
        };
        let texel = image::Rgba(color.to_rgba_u8());
        let mut image = target.lock();
        for pixel in image.pixels_mut() {
            *pixel = texel;
        }
    }

    fn draw_rectangle(
        &mut self,
        rect: Rect<f32>,
        color: Color,
        stroke_width: f32,
    ) -> Result<(), DrawingError> {
        if !stroke_width.is_finite() || stroke_width <= 0.0 {
            return Err(DrawingError::InvalidParameter(
                "stroke width must be positive and finite",
            ));
        }
        let Some(target) = self.target() else {
            return Ok(());
        };

        let s = stroke_width.min(rect.width / 2.0).min(rect.height / 2.0);
        let mut image = target.lock();
        fill(&mut image, Rect::new(rect.x, rect.y, rect.width, s), color);
        fill(
            &mut image,
            Rect::new(rect.x, rect.bottom() - s, rect.width, s),
            color,
        );
        fill(
            &mut image,
            Rect::new(rect.x, rect.y + s, s, rect.height - 2.0 * s),
            color,
        );
        fill(
            &mut image,
            Rect::new(rect.right() - s, rect.y + s, s, rect.height - 2.0 * s),
            color,
        );
        Ok(())
    }

    fn fill_rectangle(&mut self, rect: Rect<f32>, color: Color) -> Result<(), DrawingError> {
        let Some(target) = self.target() else {
            return Ok(());
        };
        fill(&mut target.lock(), rect, color);
        Ok(())
    }

    fn draw_surface_gradient(
        &mut self,
        _surface: &dyn Surface,
        _src: Rect<i32>,
        _dst: Rect<f32>,
        _corners: [Color; 4],
    ) -> Result<(), DrawingError> {
        Err(DrawingError::Unsupported("four-corner gradient draw"))
    }

    fn draw_surface_tinted(
        &mut self,
        surface: &dyn Surface,
        src: Rect<i32>,
        dst: Rect<f32>,
        color: Color,
        flip: Flip,
    ) -> Result<(), DrawingError> {
        let source = self.downcast(surface)?;
        let Some(target) = self.target() else {
            return Ok(());
        };
        if std::ptr::eq(source, target) {
            return Err(DrawingError::InvalidParameter(
                "surface cannot be both draw source and bound output",
            ));
        }

        let src_image = source.lock();
        let mut dst_image = target.lock();
        blit(&mut dst_image, &src_image, src, dst, color, flip);
        Ok(())
    }
}
