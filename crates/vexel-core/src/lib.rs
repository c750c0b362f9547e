//! Foundation types shared by every vexel backend.
//!
//! This crate is GPU-agnostic: colors, geometry, the canonical pixel-format
//! enum, raw-bitmap helpers and the logging bootstrap live here so that both
//! the batched GPU renderer and the software rasterizer can depend on them
//! without pulling in `wgpu`.

pub mod bitmap;
pub mod color;
pub mod geometry;
pub mod logging;
pub mod pixel;

pub use color::Color;
pub use geometry::{Pos, Rect, Size};
pub use pixel::PixelFormat;
