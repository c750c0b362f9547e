//! No-op backend: every operation succeeds and draws nothing.

use std::any::Any;
use std::path::Path;
use std::sync::Arc;

use vexel_core::{Color, PixelFormat, Rect};

use crate::drawing::{Drawing, Filter, Flip};
use crate::error::DrawingError;
use crate::surface::{MappedSurface, Surface, SurfaceUsage};
use crate::transform::SurfaceTransform;

/// A surface that records its dimensions and nothing else.
pub struct NullSurface {
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
}

impl NullSurface {
    fn new(width: u32, height: u32, pixel_format: PixelFormat) -> Arc<Self> {
        Arc::new(Self {
            width,
            height,
            pixel_format,
        })
    }
}

impl Surface for NullSurface {
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
        Ok(MappedSurface::new(Vec::new(), 0))
    }

    fn save(&self, _path: &Path) -> Result<(), DrawingError> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A [`Drawing`] backend with no output at all.
#[derive(Default)]
pub struct NullDrawing {
    filter: Filter,
}

impl NullDrawing {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Drawing for NullDrawing {
    fn surface(&mut self) -> Option<Arc<dyn Surface>> {
        None
    }

    fn set_surface(&mut self, _surface: Option<Arc<dyn Surface>>) -> Result<(), DrawingError> {
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
        Ok(NullSurface::new(width, height, format))
    }

    fn create_surface_from_file(
        &self,
        _path: &Path,
        _color_keys: &[Color],
    ) -> Result<Arc<dyn Surface>, DrawingError> {
        Ok(NullSurface::new(0, 0, PixelFormat::Undefined))
    }

    fn flush(&mut self) -> Result<(), DrawingError> {
        Ok(())
    }

    fn clear(&mut self, _color: Color) {}

    fn draw_rectangle(
        &mut self,
        _rect: Rect<f32>,
        _color: Color,
        _stroke_width: f32,
    ) -> Result<(), DrawingError> {
        Ok(())
    }

    fn fill_rectangle(&mut self, _rect: Rect<f32>, _color: Color) -> Result<(), DrawingError> {
        Ok(())
    }

    fn draw_surface_gradient(
        &mut self,
        _surface: &dyn Surface,
        _src: Rect<i32>,
        _dst: Rect<f32>,
        _corners: [Color; 4],
    ) -> Result<(), DrawingError> {
        Ok(())
    }

    fn draw_surface_tinted(
        &mut self,
        _surface: &dyn Surface,
        _src: Rect<i32>,
        _dst: Rect<f32>,
        _color: Color,
        _flip: Flip,
    ) -> Result<(), DrawingError> {
        Ok(())
    }

    fn draw_surface_transformed(
        &mut self,
        _surface: &dyn Surface,
        _src: Rect<i32>,
        _dst: Rect<f32>,
        _color: Color,
        _transform: &SurfaceTransform,
        _flip: Flip,
    ) -> Result<(), DrawingError> {
        Ok(())
    }
}
