//! GPU-resident surfaces for the batched backend.

use std::any::Any;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use vexel_core::{bitmap, Color, PixelFormat};

use crate::context::GraphicsContext;
use crate::error::DrawingError;
use crate::format;
use crate::readback::{self, ReadbackError};
use crate::surface::{MappedSurface, Surface, SurfaceUsage};

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// A surface backed by a wgpu texture.
///
/// Each surface carries a process-unique id; the batcher coalesces
/// consecutive draws whose source id is unchanged. Render targets are not
/// directly readable: [`map`](Surface::map) copies into a CPU-visible
/// staging buffer cached on the surface, reallocated only when its size no
/// longer matches.
pub struct BatchedSurface {
    id: u64,
    context: Arc<GraphicsContext>,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    usage: SurfaceUsage,
    staging: Mutex<Option<wgpu::Buffer>>,
}

impl BatchedSurface {
    pub(crate) fn new(
        context: Arc<GraphicsContext>,
        width: u32,
        height: u32,
        pixel_format: PixelFormat,
        usage: SurfaceUsage,
    ) -> Result<Arc<Self>, DrawingError> {
        let native = format::to_texture_format(pixel_format)
            .ok_or(DrawingError::UnsupportedFormat(pixel_format))?;
        Self::with_native_format(context, width, height, native, pixel_format, usage)
    }

    fn with_native_format(
        context: Arc<GraphicsContext>,
        width: u32,
        height: u32,
        native: wgpu::TextureFormat,
        pixel_format: PixelFormat,
        usage: SurfaceUsage,
    ) -> Result<Arc<Self>, DrawingError> {
        if width == 0 || height == 0 {
            return Err(DrawingError::InvalidParameter(
                "surface dimensions must be non-zero",
            ));
        }

        let mut texture_usage = wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::COPY_DST;
        if usage.contains(SurfaceUsage::INPUT) {
            texture_usage |= wgpu::TextureUsages::TEXTURE_BINDING;
        }
        if usage.contains(SurfaceUsage::OUTPUT) {
            texture_usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }

        let texture = context.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("vexel surface"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: native,
            usage: texture_usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Arc::new(Self {
            id: NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed),
            context,
            texture,
            view,
            width,
            height,
            pixel_format,
            usage,
            staging: Mutex::new(None),
        }))
    }

    /// Create an input surface from tightly packed RGBA8 rows.
    pub(crate) fn from_rgba8(
        context: Arc<GraphicsContext>,
        width: u32,
        height: u32,
        data: &[u8],
        usage: SurfaceUsage,
    ) -> Result<Arc<Self>, DrawingError> {
        let surface = Self::with_native_format(
            context,
            width,
            height,
            wgpu::TextureFormat::Rgba8Unorm,
            PixelFormat::Argb32,
            usage,
        )?;
        surface.upload(data);
        Ok(surface)
    }

    /// Decode an image file, apply the color-key transparency pass and
    /// upload the result.
    pub(crate) fn from_file(
        context: Arc<GraphicsContext>,
        path: &Path,
        color_keys: &[Color],
    ) -> Result<Arc<Self>, DrawingError> {
        let mut image = image::open(path)?.to_rgba8();
        let (width, height) = image.dimensions();
        if !color_keys.is_empty() {
            bitmap::make_transparent(
                &mut image,
                width as usize * 4,
                height as usize,
                color_keys,
            );
        }
        Self::from_rgba8(context, width, height, &image, SurfaceUsage::INPUT)
    }

    /// Write tightly packed texel rows covering the whole surface.
    pub(crate) fn upload(&self, data: &[u8]) {
        let bytes_per_pixel = self.texture.format().block_copy_size(None).unwrap_or(4);
        self.context.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.width * bytes_per_pixel),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub(crate) fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub(crate) fn usage(&self) -> SurfaceUsage {
        self.usage
    }
}

impl Surface for BatchedSurface {
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
        let needed = readback::staging_size(&self.texture).map_err(DrawingError::Readback)?;

        let mut staging = self
            .staging
            .lock()
            .map_err(|_| DrawingError::Readback(ReadbackError::MapFailed(
                "staging cache poisoned".to_string(),
            )))?;

        if staging.as_ref().map(|buffer| buffer.size()) != Some(needed) {
            *staging = Some(readback::create_staging(self.context.device(), needed));
        }
        let buffer = staging.as_ref().ok_or(DrawingError::Readback(
            ReadbackError::InvalidDimensions,
        ))?;

        let data = readback::read_texture_into(&self.context, &self.texture, buffer)
            .map_err(DrawingError::Readback)?;
        let stride =
            self.width * readback::bytes_per_pixel(self.texture.format()).map_err(DrawingError::Readback)?;
        Ok(MappedSurface::new(data, stride))
    }

    fn save(&self, path: &Path) -> Result<(), DrawingError> {
        let mapped = self.map()?;
        let mut data = mapped.data().to_vec();

        match self.texture.format() {
            wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => {}
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => {
                for px in data.chunks_exact_mut(4) {
                    px.swap(0, 2);
                }
            }
            _ => return Err(DrawingError::Readback(ReadbackError::UnsupportedFormat)),
        }

        let image = image::RgbaImage::from_raw(self.width, self.height, data).ok_or(
            DrawingError::Readback(ReadbackError::InvalidDimensions),
        )?;
        image.save(path)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
