//! GPU-to-CPU readback of texture contents.
//!
//! Render targets are never mapped directly: the texture is copied into a
//! 256-byte-row-aligned staging buffer, the buffer is mapped, and the row
//! padding is stripped on the way out.

use crate::context::GraphicsContext;

/// GPU readback error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadbackError {
    /// Buffer mapping failed.
    MapFailed(String),
    /// Waiting for the device failed.
    PollFailed(String),
    /// Zero-sized texture.
    InvalidDimensions,
    /// The texture format cannot be read back.
    UnsupportedFormat,
}

impl std::fmt::Display for ReadbackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MapFailed(msg) => write!(f, "Buffer mapping failed: {}", msg),
            Self::PollFailed(msg) => write!(f, "Device poll failed: {}", msg),
            Self::InvalidDimensions => write!(f, "Invalid dimensions for readback"),
            Self::UnsupportedFormat => write!(f, "Unsupported texture format for readback"),
        }
    }
}

impl std::error::Error for ReadbackError {}

/// Bytes per texel for the formats readback supports.
pub(crate) fn bytes_per_pixel(format: wgpu::TextureFormat) -> Result<u32, ReadbackError> {
    match format {
        wgpu::TextureFormat::Rgba8Unorm
        | wgpu::TextureFormat::Rgba8UnormSrgb
        | wgpu::TextureFormat::Bgra8Unorm
        | wgpu::TextureFormat::Bgra8UnormSrgb => Ok(4),
        wgpu::TextureFormat::R16Unorm => Ok(2),
        wgpu::TextureFormat::Rgba16Unorm => Ok(8),
        _ => Err(ReadbackError::UnsupportedFormat),
    }
}

/// Row stride rounded up to the copy alignment wgpu requires.
pub(crate) fn padded_bytes_per_row(width: u32, bytes_per_pixel: u32) -> u32 {
    let unpadded = width * bytes_per_pixel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Size in bytes of the staging buffer needed to read `texture` back.
pub(crate) fn staging_size(texture: &wgpu::Texture) -> Result<u64, ReadbackError> {
    let size = texture.size();
    if size.width == 0 || size.height == 0 {
        return Err(ReadbackError::InvalidDimensions);
    }
    let bpp = bytes_per_pixel(texture.format())?;
    Ok(padded_bytes_per_row(size.width, bpp) as u64 * size.height as u64)
}

pub(crate) fn create_staging(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback_staging"),
        size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    })
}

/// Copy `texture` into `staging` and read the texels out, stripping row
/// padding. `staging` must be at least [`staging_size`] bytes.
///
/// Blocks until the device has finished the copy.
pub(crate) fn read_texture_into(
    context: &GraphicsContext,
    texture: &wgpu::Texture,
    staging: &wgpu::Buffer,
) -> Result<Vec<u8>, ReadbackError> {
    let size = texture.size();
    let bpp = bytes_per_pixel(texture.format())?;
    let bytes_per_row = padded_bytes_per_row(size.width, bpp);

    let mut encoder = context
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("readback_encoder"),
        });

    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(size.height),
            },
        },
        size,
    );

    context.queue().submit(Some(encoder.finish()));

    let slice = staging.slice(..staging_size(texture)?);
    let (sender, receiver) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });

    context
        .device()
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|err| ReadbackError::PollFailed(err.to_string()))?;

    receiver
        .recv()
        .map_err(|_| ReadbackError::MapFailed("map callback dropped".to_string()))?
        .map_err(|err| ReadbackError::MapFailed(err.to_string()))?;

    let data = slice.get_mapped_range();
    let row_len = (size.width * bpp) as usize;
    let mut result = Vec::with_capacity(row_len * size.height as usize);
    for y in 0..size.height {
        let start = (y * bytes_per_row) as usize;
        result.extend_from_slice(&data[start..start + row_len]);
    }

    drop(data);
    staging.unmap();

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_per_row_alignment() {
        // width 100 at 4 bytes per pixel pads from 400 to 512
        assert_eq!(padded_bytes_per_row(100, 4), 512);
        assert_eq!(padded_bytes_per_row(64, 4), 256);
        assert_eq!(padded_bytes_per_row(128, 4), 512);
    }

    #[test]
    fn test_readback_error_display() {
        let err = ReadbackError::MapFailed("test".to_string());
        assert!(format!("{}", err).contains("Buffer mapping failed"));

        let err = ReadbackError::InvalidDimensions;
        assert!(format!("{}", err).contains("Invalid dimensions"));
    }

    #[test]
    fn test_unsupported_format() {
        assert_eq!(
            bytes_per_pixel(wgpu::TextureFormat::Depth32Float),
            Err(ReadbackError::UnsupportedFormat)
        );
    }
}
