//! The batched GPU backend.
//!
//! Draw calls stage quads into a fixed-capacity vertex array; device
//! submission is deferred until the array fills, the bound source surface
//! changes, or the caller flushes. Each flush is a single indexed draw of
//! all pending quads against a precomputed, immutable index buffer.

mod batcher;
mod pipeline;
mod surface;

pub use batcher::RenderStats;
pub use surface::BatchedSurface;

use std::path::Path;
use std::sync::Arc;

use glam::Vec3;
use wgpu::util::DeviceExt;

use vexel_core::{Color, PixelFormat, Rect, Size};

use crate::context::GraphicsContext;
use crate::drawing::{Drawing, Filter, Flip};
use crate::error::DrawingError;
use crate::sampler::SamplerCache;
use crate::surface::{Surface, SurfaceUsage};
use crate::transform::SurfaceTransform;

use batcher::{quad_indices, quad_uvs, quad_vertices, to_ndc, BatchQueue, Vertex, Viewport};
use pipeline::BatchPipeline;

fn to_wgpu_color(color: Color) -> wgpu::Color {
    let c = color.clamped();
    wgpu::Color {
        r: c.r as f64,
        g: c.g as f64,
        b: c.b as f64,
        a: c.a as f64,
    }
}

/// The currently bound output surface and everything derived from it.
struct OutputBinding {
    surface: Arc<dyn Surface>,
    view: wgpu::TextureView,
    format: wgpu::TextureFormat,
    viewport: Viewport,
}

/// A [`Drawing`] backend that batches quads and submits them to a wgpu
/// device.
///
/// Single-threaded and immediate-mode; one instance exclusively owns its
/// staging array and GPU buffers. The graphics context is an explicit
/// handle that must outlive the renderer.
pub struct BatchedDrawing {
    context: Arc<GraphicsContext>,
    pipeline: BatchPipeline,
    samplers: SamplerCache,
    white: Arc<BatchedSurface>,
    queue: BatchQueue,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    bind_group: Option<wgpu::BindGroup>,
    output: Option<OutputBinding>,
    filter: Filter,
    invalidated: bool,
    stats: RenderStats,
}

impl BatchedDrawing {
    pub fn new(context: Arc<GraphicsContext>) -> Result<Self, DrawingError> {
        let pipeline = BatchPipeline::new(context.device());
        let white = BatchedSurface::from_rgba8(
            context.clone(),
            1,
            1,
            &[255, 255, 255, 255],
            SurfaceUsage::INPUT,
        )?;

        Ok(Self {
            context,
            pipeline,
            samplers: SamplerCache::new(),
            white,
            queue: BatchQueue::new(batcher::MAX_VERTICES),
            vertex_buffer: None,
            index_buffer: None,
            bind_group: None,
            output: None,
            filter: Filter::Nearest,
            invalidated: false,
            stats: RenderStats::default(),
        })
    }

    /// Lifetime counters for submissions and quads.
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Rebind the sampled source surface, flushing the pending batch when
    /// it actually changes. No-op for the already-bound surface: this is
    /// what coalesces consecutive same-surface draws into one submission.
    fn set_texture_to_draw(&mut self, surface: &BatchedSurface) {
        if self.queue.bound_texture() == Some(surface.id()) {
            return;
        }

        self.flush_batch();

        let device = self.context.device();
        let sampler = self.samplers.get(device, self.filter);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Quad Batch Bind Group"),
            layout: self.pipeline.bind_group_layout(),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(surface.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        self.bind_group = Some(bind_group);
        self.queue.bind_texture(surface.id());
    }

    /// Submit all pending quads as one indexed draw and reset the stage.
    ///
    /// No-op with nothing pending. The vertex buffer (full capacity) and
    /// the index buffer are created together on the first flush; the index
    /// buffer content is independent of the pending quads and is never
    /// touched again.
    fn flush_batch(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        // draws are no-ops without an output, so pending is only ever
        // non-empty while a target is bound
        let Some(output) = &self.output else {
            return;
        };

        let device = self.context.device();
        let capacity = self.queue.capacity();

        let vertex_buffer = self.vertex_buffer.get_or_insert_with(|| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Quad Batch Vertex Buffer"),
                size: (capacity * std::mem::size_of::<Vertex>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });
        let index_buffer = self.index_buffer.get_or_insert_with(|| {
            let indices = quad_indices(capacity / 4);
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Quad Batch Index Buffer"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });

        self.context
            .queue()
            .write_buffer(vertex_buffer, 0, bytemuck::cast_slice(self.queue.staged()));

        let pipeline = self.pipeline.get(device, output.format);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Quad Batch Flush"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Quad Batch Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &output.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            pass.set_pipeline(pipeline);
            if let Some(bind_group) = &self.bind_group {
                pass.set_bind_group(0, bind_group, &[]);
            }
            pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..(self.queue.pending_quads() * 6) as u32, 0, 0..1);
        }
        self.context.queue().submit(Some(encoder.finish()));

        tracing::trace!("Flushed {} quads", self.queue.pending_quads());
        self.stats.submissions += 1;
        self.stats.quads += self.queue.pending_quads() as u64;
        self.queue.reset();
    }

    /// Stage one axis-aligned quad, flushing first on rebind or overflow.
    fn draw_quad(
        &mut self,
        surface: &BatchedSurface,
        src: Rect<i32>,
        dst: Rect<f32>,
        colors: [Color; 4],
        flip: Flip,
    ) {
        let Some(viewport) = self.output.as_ref().map(|output| output.viewport) else {
            tracing::trace!("Draw call ignored: no output surface bound");
            return;
        };

        self.set_texture_to_draw(surface);
        if self.queue.needs_flush_for(4) {
            self.flush_batch();
        }

        let vertices = quad_vertices(
            src,
            dst,
            Size::new(surface.width(), surface.height()),
            viewport,
            colors,
            flip,
        );
        let index = self.queue.request(4);
        self.queue.write(index, &vertices);
        self.invalidated = true;
    }

    fn downcast<'a>(&self, surface: &'a dyn Surface) -> Result<&'a BatchedSurface, DrawingError> {
        surface
            .as_any()
            .downcast_ref::<BatchedSurface>()
            .ok_or(DrawingError::InvalidSurface)
    }
}

impl Drawing for BatchedDrawing {
    fn surface(&mut self) -> Option<Arc<dyn Surface>> {
        if self.invalidated {
            self.flush_batch();
            self.invalidated = false;
        }
        self.output.as_ref().map(|output| output.surface.clone())
    }

    fn set_surface(&mut self, surface: Option<Arc<dyn Surface>>) -> Result<(), DrawingError> {
        // commit anything outstanding against the previous target
        self.flush_batch();
        self.invalidated = false;

        let Some(surface) = surface else {
            self.output = None;
            return Ok(());
        };

        let batched = self.downcast(surface.as_ref())?;
        if !batched.usage().contains(SurfaceUsage::OUTPUT) {
            return Err(DrawingError::InvalidParameter(
                "surface was not created for output",
            ));
        }

        let view = batched
            .texture()
            .create_view(&wgpu::TextureViewDescriptor::default());
        let binding = OutputBinding {
            view,
            format: batched.texture().format(),
            viewport: Viewport {
                width: batched.width() as f32,
                height: batched.height() as f32,
            },
            surface,
        };
        self.output = Some(binding);
        Ok(())
    }

    fn filter(&self) -> Filter {
        self.filter
    }

    fn set_filter(&mut self, filter: Filter) {
        if self.filter == filter {
            return;
        }
        // the sampler is bound alongside the texture, so pending quads
        // must go out with the old one
        self.flush_batch();
        self.queue.invalidate_binding();
        self.bind_group = None;
        self.filter = filter;
    }

    fn create_surface(
        &self,
        width: u32,
        height: u32,
        format: PixelFormat,
        usage: SurfaceUsage,
    ) -> Result<Arc<dyn Surface>, DrawingError> {
        let surface = BatchedSurface::new(self.context.clone(), width, height, format, usage)?;
        Ok(surface)
    }

    fn create_surface_from_file(
        &self,
        path: &Path,
        color_keys: &[Color],
    ) -> Result<Arc<dyn Surface>, DrawingError> {
        let surface = BatchedSurface::from_file(self.context.clone(), path, color_keys)?;
        Ok(surface)
    }

    fn flush(&mut self) -> Result<(), DrawingError> {
        self.flush_batch();
        self.invalidated = false;
        Ok(())
    }

    fn clear(&mut self, color: Color) {
        let Some(output) = &self.output else {
            return;
        };

        // immediate: staged-but-unflushed quads survive a clear and land
        // on top at the next flush
        let mut encoder =
            self.context
                .device()
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Clear Encoder"),
                });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &output.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(to_wgpu_color(color)),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }
        self.context.queue().submit(Some(encoder.finish()));
        self.invalidated = true;
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

        let s = stroke_width
            .min(rect.width / 2.0)
            .min(rect.height / 2.0);
        let bands = [
            Rect::new(rect.x, rect.y, rect.width, s),
            Rect::new(rect.x, rect.bottom() - s, rect.width, s),
            Rect::new(rect.x, rect.y + s, s, rect.height - 2.0 * s),
            Rect::new(rect.right() - s, rect.y + s, s, rect.height - 2.0 * s),
        ];
        for band in bands {
            self.fill_rectangle(band, color)?;
        }
        Ok(())
    }

    fn fill_rectangle(&mut self, rect: Rect<f32>, color: Color) -> Result<(), DrawingError> {
        let white = self.white.clone();
        self.draw_quad(&white, Rect::new(0, 0, 1, 1), rect, [color; 4], Flip::None);
        Ok(())
    }

    fn draw_surface_gradient(
        &mut self,
        surface: &dyn Surface,
        src: Rect<i32>,
        dst: Rect<f32>,
        corners: [Color; 4],
    ) -> Result<(), DrawingError> {
        let batched = self.downcast(surface)?;
        // per-corner colors, no flip remapping
        self.draw_quad_checked(batched, src, dst, corners, Flip::None)
    }

    fn draw_surface_tinted(
        &mut self,
        surface: &dyn Surface,
        src: Rect<i32>,
        dst: Rect<f32>,
        color: Color,
        flip: Flip,
    ) -> Result<(), DrawingError> {
        let batched = self.downcast(surface)?;
        self.draw_quad_checked(batched, src, dst, [color; 4], flip)
    }

    fn draw_surface_transformed(
        &mut self,
        surface: &dyn Surface,
        src: Rect<i32>,
        dst: Rect<f32>,
        color: Color,
        transform: &SurfaceTransform,
        flip: Flip,
    ) -> Result<(), DrawingError> {
        let batched = self.downcast(surface)?;
        let Some(viewport) = self.output.as_ref().map(|output| output.viewport) else {
            tracing::trace!("Transformed draw ignored: no output surface bound");
            return Ok(());
        };

        self.set_texture_to_draw(batched);
        // distinct path: a transformed quad never coalesces with staged
        // axis-aligned quads
        self.flush_batch();

        let matrix = transform.matrix();
        let corners = [
            (dst.left(), dst.top()),
            (dst.right(), dst.top()),
            (dst.left(), dst.bottom()),
            (dst.right(), dst.bottom()),
        ]
        .map(|(x, y)| matrix.transform_point3(Vec3::new(x, y, 0.0)));

        let uvs = quad_uvs(src, Size::new(batched.width(), batched.height()), flip);
        let vertices: [Vertex; 4] = std::array::from_fn(|i| Vertex {
            position: to_ndc(corners[i].x, corners[i].y, viewport),
            uv: uvs[i],
            color: color.to_array(),
        });

        let index = self.queue.request(4);
        self.queue.write(index, &vertices);
        self.invalidated = true;
        Ok(())
    }
}

impl BatchedDrawing {
    /// Downcast already done; shared by the tinted and gradient paths.
    fn draw_quad_checked(
        &mut self,
        surface: &BatchedSurface,
        src: Rect<i32>,
        dst: Rect<f32>,
        colors: [Color; 4],
        flip: Flip,
    ) -> Result<(), DrawingError> {
        self.draw_quad(surface, src, dst, colors, flip);
        Ok(())
    }
}
