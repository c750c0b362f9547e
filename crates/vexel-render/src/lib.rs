//! A pixel-surface drawing layer with a GPU quad-batching core.
//!
//! One uniform draw-call contract — clear, rectangles, surface blits with
//! flipping, alpha, tinting and transforms — satisfied by three backends
//! selected at construction time:
//!
//! | Backend | Strategy |
//! |---------|----------|
//! | [`BatchedDrawing`] | Quads staged into a shared vertex buffer, flushed as one indexed draw per texture run |
//! | [`SoftwareDrawing`] | Immediate CPU scanline blits |
//! | [`NullDrawing`] | Accepts everything, draws nothing |
//!
//! The batched backend is the interesting one: consecutive draws of the
//! same source surface coalesce into a single GPU submission, and a flush
//! only happens when the staging array fills, the bound texture changes,
//! or the caller asks for one.

pub mod batched;
pub mod context;
pub mod drawing;
pub mod error;
pub mod format;
pub mod null;
pub mod readback;
mod sampler;
pub mod software;
pub mod surface;
pub mod transform;

pub use batched::{BatchedDrawing, BatchedSurface, RenderStats};
pub use context::{GraphicsContext, GraphicsError};
pub use drawing::{Drawing, Filter, Flip};
pub use error::DrawingError;
pub use null::{NullDrawing, NullSurface};
pub use readback::ReadbackError;
pub use software::{SoftwareDrawing, SoftwareSurface};
pub use surface::{MappedSurface, Surface, SurfaceUsage};
pub use transform::SurfaceTransform;

pub use vexel_core::{Color, PixelFormat, Pos, Rect, Size};
