//! The surface abstraction shared by every backend.

use std::any::Any;
use std::path::Path;

use vexel_core::{PixelFormat, Size};

use crate::error::DrawingError;

bitflags::bitflags! {
    /// How a surface will be used by the renderer.
    ///
    /// `INPUT` surfaces are optimized for sampling, `OUTPUT` surfaces for
    /// being drawn into (and are not directly readable — reading one goes
    /// through a staging copy). `INPUT_OUTPUT` allows both, typically at
    /// some cost.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SurfaceUsage: u32 {
        const INPUT = 1 << 0;
        const OUTPUT = 1 << 1;
        const INPUT_OUTPUT = Self::INPUT.bits() | Self::OUTPUT.bits();
    }
}

/// A CPU-visible snapshot of a surface's pixel data.
///
/// The snapshot owns its bytes, so whatever lock or staging copy produced
/// it has already been released by the time the value exists — there is no
/// unlock step to forget on any exit path. Rows are `stride` bytes apart;
/// `stride` may exceed `width * bytes_per_pixel` for padded layouts.
pub struct MappedSurface {
    data: Vec<u8>,
    stride: u32,
}

impl MappedSurface {
    pub(crate) fn new(data: Vec<u8>, stride: u32) -> Self {
        Self { data, stride }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Distance between the starts of consecutive rows, in bytes.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Total length of the snapshot in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// An owned 2D pixel buffer usable as a draw source and/or destination.
///
/// Surfaces are created by a [`Drawing`](crate::Drawing) backend and must
/// only be used with the backend that created them; passing a foreign
/// surface yields [`DrawingError::InvalidSurface`]. Using a surface as
/// both the bound input and the active output of the same draw is
/// undefined.
pub trait Surface: 'static {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn size(&self) -> Size<u32> {
        Size::new(self.width(), self.height())
    }

    fn pixel_format(&self) -> PixelFormat;

    /// Copy the surface's pixels into a CPU-visible snapshot.
    ///
    /// For GPU render targets this goes through a staging copy; the
    /// intermediate is cached and only reallocated when its size no longer
    /// matches the surface.
    fn map(&self) -> Result<MappedSurface, DrawingError>;

    /// Encode the surface as a PNG file at `path`.
    fn save(&self, path: &Path) -> Result<(), DrawingError>;

    /// Backend downcast hook.
    fn as_any(&self) -> &dyn Any;
}
