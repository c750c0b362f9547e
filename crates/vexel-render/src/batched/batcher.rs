//! Vertex staging and batching for the GPU backend.
//!
//! Draw calls accumulate quads into a fixed-capacity CPU staging array;
//! device submission is deferred until the array fills, the bound texture
//! changes, or the caller flushes. The decision logic lives in
//! [`BatchQueue`] and is device-free; the buffer lifecycle and the actual
//! submission live in [`super::BatchedDrawing`].

use bytemuck::{Pod, Zeroable};
use vexel_core::{Color, Rect, Size};

use crate::drawing::Flip;

/// Quads the staging array holds when full; also the size the immutable
/// index buffer is built for.
pub(crate) const MAX_QUADS: usize = 16384;

/// Capacity of the vertex staging array.
pub(crate) const MAX_VERTICES: usize = MAX_QUADS * 4;

/// One corner of a batched quad.
///
/// `position` is in normalized device coordinates, `uv` in normalized
/// texture space, `color` a straight-alpha RGBA multiplier.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

static_assertions::const_assert_eq!(std::mem::size_of::<Vertex>(), 32);

impl Vertex {
    /// Vertex buffer layout matching the WGSL input struct.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRS: &[wgpu::VertexAttribute] = &wgpu::vertex_attr_array![
            0 => Float32x2,
            1 => Float32x2,
            2 => Float32x4,
        ];

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: ATTRS,
        }
    }
}

/// Pixel dimensions of the bound output surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Viewport {
    pub width: f32,
    pub height: f32,
}

/// Map a destination pixel coordinate into normalized device space.
///
/// Pixel-space Y grows downward while device space grows upward, so the Y
/// axis is inverted.
pub(crate) fn to_ndc(x: f32, y: f32, viewport: Viewport) -> [f32; 2] {
    [
        x / viewport.width * 2.0 - 1.0,
        y / viewport.height * -2.0 + 1.0,
    ]
}

/// UV corners for `src` of a `texture`-sized surface, in vertex order
/// top-left, top-right, bottom-left, bottom-right, after flip remapping.
///
/// Each flip variant is a fixed permutation of the source columns/rows,
/// not a matrix multiply.
pub(crate) fn quad_uvs(src: Rect<i32>, texture: Size<u32>, flip: Flip) -> [[f32; 2]; 4] {
    let tex_w = texture.width as f32;
    let tex_h = texture.height as f32;

    let mut u_left = src.left() as f32 / tex_w;
    let mut u_right = src.right() as f32 / tex_w;
    let mut v_top = src.top() as f32 / tex_h;
    let mut v_bottom = src.bottom() as f32 / tex_h;

    if flip.mirrors_x() {
        std::mem::swap(&mut u_left, &mut u_right);
    }
    if flip.mirrors_y() {
        std::mem::swap(&mut v_top, &mut v_bottom);
    }

    [
        [u_left, v_top],
        [u_right, v_top],
        [u_left, v_bottom],
        [u_right, v_bottom],
    ]
}

/// Build the four vertices of an axis-aligned quad.
///
/// `colors` are per-corner in the same top-left, top-right, bottom-left,
/// bottom-right order as the output vertices.
pub(crate) fn quad_vertices(
    src: Rect<i32>,
    dst: Rect<f32>,
    texture: Size<u32>,
    viewport: Viewport,
    colors: [Color; 4],
    flip: Flip,
) -> [Vertex; 4] {
    let uvs = quad_uvs(src, texture, flip);
    let corners = [
        to_ndc(dst.left(), dst.top(), viewport),
        to_ndc(dst.right(), dst.top(), viewport),
        to_ndc(dst.left(), dst.bottom(), viewport),
        to_ndc(dst.right(), dst.bottom(), viewport),
    ];

    std::array::from_fn(|i| Vertex {
        position: corners[i],
        uv: uvs[i],
        color: colors[i].to_array(),
    })
}

/// Index data for `quads` quads: two triangles per quad over the shared
/// 4-vertex base, `{+1, +0, +2, +1, +2, +3}` offset by 4 per quad.
pub(crate) fn quad_indices(quads: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(quads * 6);
    for quad in 0..quads as u32 {
        let base = quad * 4;
        indices.extend_from_slice(&[base + 1, base, base + 2, base + 1, base + 2, base + 3]);
    }
    indices
}

/// The CPU side of the batch: staging array, pending count and the
/// identity of the bound source texture.
///
/// Invariants: `0 <= pending <= capacity`, `pending` is always a multiple
/// of 4. The queue never submits by itself; callers consult
/// [`needs_flush_for`](Self::needs_flush_for) and
/// [`must_flush_on_bind`](Self::must_flush_on_bind) and reset after
/// submitting.
pub(crate) struct BatchQueue {
    staging: Vec<Vertex>,
    pending: usize,
    bound_texture: Option<u64>,
}

impl BatchQueue {
    /// `capacity` is in vertices and must be a positive multiple of 4.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0 && capacity % 4 == 0);
        Self {
            staging: vec![Vertex::zeroed(); capacity],
            pending: 0,
            bound_texture: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.staging.len()
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn pending_quads(&self) -> usize {
        self.pending / 4
    }

    pub fn is_empty(&self) -> bool {
        self.pending == 0
    }

    /// Whether staging `count` more vertices requires a flush first.
    pub fn needs_flush_for(&self, count: usize) -> bool {
        self.pending + count > self.staging.len()
    }

    pub fn bound_texture(&self) -> Option<u64> {
        self.bound_texture
    }

    /// Whether binding `texture` requires flushing the pending batch:
    /// the bound texture is draw-call-wide GPU state, so consecutive
    /// draws coalesce only while it stays unchanged.
    pub fn must_flush_on_bind(&self, texture: u64) -> bool {
        self.bound_texture != Some(texture) && !self.is_empty()
    }

    /// Record `texture` as bound. Returns false if it already was.
    pub fn bind_texture(&mut self, texture: u64) -> bool {
        if self.bound_texture == Some(texture) {
            return false;
        }
        self.bound_texture = Some(texture);
        true
    }

    /// Forget the bound texture so the next draw rebinds, e.g. after the
    /// sampling filter changed.
    pub fn invalidate_binding(&mut self) {
        self.bound_texture = None;
    }

    /// Reserve `count` vertices and return the index to write them at.
    ///
    /// `count` must be a positive multiple of 4 strictly below capacity,
    /// and the caller must already have flushed if
    /// [`needs_flush_for`](Self::needs_flush_for) said so; both are
    /// programming errors, not runtime conditions.
    pub fn request(&mut self, count: usize) -> usize {
        debug_assert!(count > 0 && count % 4 == 0 && count < self.staging.len());
        debug_assert!(!self.needs_flush_for(count));

        let index = self.pending;
        self.pending += count;
        index
    }

    /// Write vertices previously reserved with [`request`](Self::request).
    pub fn write(&mut self, index: usize, vertices: &[Vertex]) {
        self.staging[index..index + vertices.len()].copy_from_slice(vertices);
    }

    /// The staged vertices awaiting submission.
    pub fn staged(&self) -> &[Vertex] {
        &self.staging[..self.pending]
    }

    /// Drop all staged vertices. The texture binding survives a flush.
    pub fn reset(&mut self) {
        self.pending = 0;
    }
}

/// Counters over the batcher's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Indexed draw submissions issued by flushes.
    pub submissions: u64,
    /// Quads carried by those submissions.
    pub quads: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_size() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        assert_eq!(MAX_VERTICES, MAX_QUADS * 4);
    }

    #[test]
    fn test_index_pattern() {
        let indices = quad_indices(3);
        assert_eq!(indices.len(), 18);
        for quad in 0..3u32 {
            let i = quad as usize * 6;
            let b = quad * 4;
            assert_eq!(
                &indices[i..i + 6],
                &[b + 1, b, b + 2, b + 1, b + 2, b + 3]
            );
        }
    }

    #[test]
    fn test_ndc_mapping() {
        let viewport = Viewport {
            width: 64.0,
            height: 64.0,
        };
        assert_eq!(to_ndc(0.0, 0.0, viewport), [-1.0, 1.0]);
        assert_eq!(to_ndc(64.0, 64.0, viewport), [1.0, -1.0]);
        assert_eq!(to_ndc(32.0, 32.0, viewport), [0.0, 0.0]);
    }

    #[test]
    fn test_uv_corners_no_flip() {
        let uvs = quad_uvs(Rect::new(4, 8, 8, 16), Size::new(32, 32), Flip::None);
        assert_eq!(
            uvs,
            [
                [0.125, 0.25],
                [0.375, 0.25],
                [0.125, 0.75],
                [0.375, 0.75],
            ]
        );
    }

    #[test]
    fn test_uv_corners_flip_horizontal() {
        let base = quad_uvs(Rect::new(4, 8, 8, 16), Size::new(32, 32), Flip::None);
        let uvs = quad_uvs(Rect::new(4, 8, 8, 16), Size::new(32, 32), Flip::Horizontal);
        // left/right columns swapped, rows unchanged
        assert_eq!(uvs, [base[1], base[0], base[3], base[2]]);
    }

    #[test]
    fn test_uv_corners_flip_vertical() {
        let base = quad_uvs(Rect::new(4, 8, 8, 16), Size::new(32, 32), Flip::None);
        let uvs = quad_uvs(Rect::new(4, 8, 8, 16), Size::new(32, 32), Flip::Vertical);
        assert_eq!(uvs, [base[2], base[3], base[0], base[1]]);
    }

    #[test]
    fn test_uv_corners_flip_both() {
        let base = quad_uvs(Rect::new(4, 8, 8, 16), Size::new(32, 32), Flip::None);
        let uvs = quad_uvs(Rect::new(4, 8, 8, 16), Size::new(32, 32), Flip::Both);
        assert_eq!(uvs, [base[3], base[2], base[1], base[0]]);
    }

    #[test]
    fn test_quad_vertex_order_and_colors() {
        let viewport = Viewport {
            width: 16.0,
            height: 16.0,
        };
        let colors = [Color::RED, Color::GREEN, Color::BLUE, Color::WHITE];
        let verts = quad_vertices(
            Rect::new(0, 0, 16, 16),
            Rect::new(0.0, 0.0, 16.0, 16.0),
            Size::new(16, 16),
            viewport,
            colors,
            Flip::None,
        );
        // TL, TR, BL, BR
        assert_eq!(verts[0].position, [-1.0, 1.0]);
        assert_eq!(verts[1].position, [1.0, 1.0]);
        assert_eq!(verts[2].position, [-1.0, -1.0]);
        assert_eq!(verts[3].position, [1.0, -1.0]);
        for (vertex, color) in verts.iter().zip(colors) {
            assert_eq!(vertex.color, color.to_array());
        }
    }

    #[test]
    fn test_queue_fills_to_exact_capacity() {
        let mut queue = BatchQueue::new(16);
        for _ in 0..4 {
            assert!(!queue.needs_flush_for(4));
            queue.request(4);
        }
        assert_eq!(queue.pending(), 16);
        assert_eq!(queue.pending_quads(), 4);
        // the fifth quad overflows
        assert!(queue.needs_flush_for(4));
    }

    #[test]
    fn test_overflow_submission_counts() {
        // stage capacity + 4 vertices; the implicit flush carries a full
        // buffer (capacity/4 quads) and the explicit one the remainder
        let mut queue = BatchQueue::new(16);
        let mut flushes: Vec<usize> = Vec::new();

        for _ in 0..5 {
            if queue.needs_flush_for(4) {
                flushes.push(queue.pending_quads());
                queue.reset();
            }
            queue.request(4);
        }
        flushes.push(queue.pending_quads());
        queue.reset();

        assert_eq!(flushes, vec![4, 1]);
    }

    #[test]
    fn test_texture_change_forces_flush() {
        let mut queue = BatchQueue::new(1024);
        let mut submissions = 0;

        for texture in [1u64, 2] {
            if queue.must_flush_on_bind(texture) {
                submissions += 1;
                queue.reset();
            }
            queue.bind_texture(texture);
            queue.request(4);
        }
        if !queue.is_empty() {
            submissions += 1;
            queue.reset();
        }

        // one submission per surface even though both fit comfortably
        assert_eq!(submissions, 2);
    }

    #[test]
    fn test_same_texture_coalesces() {
        let mut queue = BatchQueue::new(1024);
        let mut submissions = 0;

        for _ in 0..100 {
            if queue.must_flush_on_bind(7) {
                submissions += 1;
                queue.reset();
            }
            queue.bind_texture(7);
            if queue.needs_flush_for(4) {
                submissions += 1;
                queue.reset();
            }
            queue.request(4);
        }
        if !queue.is_empty() {
            submissions += 1;
            queue.reset();
        }

        // 100 quads of one texture in a 256-quad buffer: a single submission
        assert_eq!(submissions, 1);
    }

    #[test]
    fn test_binding_survives_reset() {
        let mut queue = BatchQueue::new(16);
        queue.bind_texture(3);
        queue.request(4);
        queue.reset();
        assert!(!queue.must_flush_on_bind(3));
        assert_eq!(queue.bound_texture(), Some(3));
    }
}
