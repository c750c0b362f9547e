//! The uniform drawing façade implemented by every backend.

use std::path::Path;
use std::sync::Arc;

use vexel_core::{Color, PixelFormat, Rect};

use crate::error::DrawingError;
use crate::surface::{Surface, SurfaceUsage};
use crate::transform::SurfaceTransform;

/// Sampling filter applied to subsequent surface draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Filter {
    #[default]
    Nearest,
    Linear,
    Cubic,
}

/// Axis mirroring applied to the source-to-destination corner mapping.
///
/// The set is closed; each variant selects one of four fixed UV corner
/// permutations rather than a matrix multiply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Flip {
    #[default]
    None,
    Horizontal,
    Vertical,
    Both,
}

impl Flip {
    /// Whether the left/right source columns are swapped.
    pub fn mirrors_x(self) -> bool {
        matches!(self, Flip::Horizontal | Flip::Both)
    }

    /// Whether the top/bottom source rows are swapped.
    pub fn mirrors_y(self) -> bool {
        matches!(self, Flip::Vertical | Flip::Both)
    }
}

/// A pixel-surface renderer: one uniform draw-call contract, satisfied
/// independently by the batched GPU backend, the software rasterizer and
/// the null backend.
///
/// Renderers are single-threaded and immediate-mode; callers serialize all
/// access to one instance. Destination coordinates are pixels in the bound
/// output surface, source coordinates are pixels in the drawn surface.
pub trait Drawing {
    /// The currently bound output surface.
    ///
    /// Reading the output forces a flush of uncommitted draw commands, so
    /// the returned surface reflects everything drawn so far.
    fn surface(&mut self) -> Option<Arc<dyn Surface>>;

    /// Bind an output surface (or unbind with `None`).
    ///
    /// Pending work against the previous target is flushed first; the
    /// viewport is recomputed from the new target's pixel dimensions.
    fn set_surface(&mut self, surface: Option<Arc<dyn Surface>>) -> Result<(), DrawingError>;

    fn filter(&self) -> Filter;

    /// Change the sampling filter for subsequent draws.
    fn set_filter(&mut self, filter: Filter);

    fn create_surface(
        &self,
        width: u32,
        height: u32,
        format: PixelFormat,
        usage: SurfaceUsage,
    ) -> Result<Arc<dyn Surface>, DrawingError>;

    /// Decode an image file into a surface, replacing exact matches of
    /// `color_keys` with transparent pixels.
    fn create_surface_from_file(
        &self,
        path: &Path,
        color_keys: &[Color],
    ) -> Result<Arc<dyn Surface>, DrawingError>;

    /// Submit all staged draw commands to the device.
    fn flush(&mut self) -> Result<(), DrawingError>;

    /// Clear the bound output to `color`. No-op when no output is bound.
    fn clear(&mut self, color: Color);

    /// Stroke the outline of `rect`.
    fn draw_rectangle(
        &mut self,
        rect: Rect<f32>,
        color: Color,
        stroke_width: f32,
    ) -> Result<(), DrawingError>;

    fn fill_rectangle(&mut self, rect: Rect<f32>, color: Color) -> Result<(), DrawingError>;

    /// Blit `src` of `surface` onto `dst` of the bound output, modulated
    /// per-corner by `corners` (top-left, top-right, bottom-left,
    /// bottom-right).
    fn draw_surface_gradient(
        &mut self,
        surface: &dyn Surface,
        src: Rect<i32>,
        dst: Rect<f32>,
        corners: [Color; 4],
    ) -> Result<(), DrawingError>;

    /// Blit `src` of `surface` onto `dst`, uniformly tinted by `color`.
    fn draw_surface_tinted(
        &mut self,
        surface: &dyn Surface,
        src: Rect<i32>,
        dst: Rect<f32>,
        color: Color,
        flip: Flip,
    ) -> Result<(), DrawingError>;

    /// Blit `src` of `surface` onto `dst`.
    fn draw_surface(
        &mut self,
        surface: &dyn Surface,
        src: Rect<i32>,
        dst: Rect<f32>,
        flip: Flip,
    ) -> Result<(), DrawingError> {
        self.draw_surface_tinted(surface, src, dst, Color::WHITE, flip)
    }

    /// Blit with a uniform opacity in `0.0..=1.0`.
    fn draw_surface_alpha(
        &mut self,
        surface: &dyn Surface,
        src: Rect<i32>,
        dst: Rect<f32>,
        alpha: f32,
        flip: Flip,
    ) -> Result<(), DrawingError> {
        self.draw_surface_tinted(surface, src, dst, Color::rgba(1.0, 1.0, 1.0, alpha), flip)
    }

    /// Draw the whole surface at `(x, y)` without scaling.
    fn draw_surface_at(
        &mut self,
        surface: &dyn Surface,
        x: f32,
        y: f32,
        flip: Flip,
    ) -> Result<(), DrawingError> {
        let src = Rect::new(0, 0, surface.width() as i32, surface.height() as i32);
        let dst = Rect::new(x, y, src.width as f32, src.height as f32);
        self.draw_surface(surface, src, dst, flip)
    }

    /// Draw the whole surface scaled into `(x, y, width, height)`.
    fn draw_surface_at_size(
        &mut self,
        surface: &dyn Surface,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        flip: Flip,
    ) -> Result<(), DrawingError> {
        let src = Rect::new(0, 0, surface.width() as i32, surface.height() as i32);
        self.draw_surface(surface, src, Rect::new(x, y, width, height), flip)
    }

    /// Draw the whole surface scaled into `dst`.
    fn draw_surface_dst(
        &mut self,
        surface: &dyn Surface,
        dst: Rect<f32>,
        flip: Flip,
    ) -> Result<(), DrawingError> {
        let src = Rect::new(0, 0, surface.width() as i32, surface.height() as i32);
        self.draw_surface(surface, src, dst, flip)
    }

    /// Draw `src` at `(x, y)` without scaling.
    fn draw_surface_src_at(
        &mut self,
        surface: &dyn Surface,
        src: Rect<i32>,
        x: f32,
        y: f32,
        flip: Flip,
    ) -> Result<(), DrawingError> {
        let dst = Rect::new(x, y, src.width as f32, src.height as f32);
        self.draw_surface(surface, src, dst, flip)
    }

    /// Blit with a full rotation/scale/pivot transform applied in
    /// destination space.
    ///
    /// This is a distinct draw path from the axis-aligned fast path and is
    /// not implemented by every backend.
    fn draw_surface_transformed(
        &mut self,
        _surface: &dyn Surface,
        _src: Rect<i32>,
        _dst: Rect<f32>,
        _color: Color,
        _transform: &SurfaceTransform,
        _flip: Flip,
    ) -> Result<(), DrawingError> {
        Err(DrawingError::Unsupported("transformed surface draw"))
    }
}
