//! Fixed mapping between [`PixelFormat`] and wgpu texture formats.
//!
//! The table is bidirectional for the representable subset; everything the
//! device cannot express maps forward to `None` and backward to
//! [`PixelFormat::Undefined`]. Premultiplied variants share storage with
//! their straight-alpha counterparts (blending state, not the texel
//! layout, carries the distinction), so the reverse direction reports the
//! straight-alpha format.

use vexel_core::PixelFormat;

/// The wgpu format a surface with the given pixel format is stored in.
pub fn to_texture_format(format: PixelFormat) -> Option<wgpu::TextureFormat> {
    match format {
        PixelFormat::Rgb32 => Some(wgpu::TextureFormat::Bgra8Unorm),
        PixelFormat::Argb32 => Some(wgpu::TextureFormat::Bgra8Unorm),
        PixelFormat::PArgb32 => Some(wgpu::TextureFormat::Bgra8Unorm),
        PixelFormat::GrayScale16 => Some(wgpu::TextureFormat::R16Unorm),
        PixelFormat::Argb64 => Some(wgpu::TextureFormat::Rgba16Unorm),
        PixelFormat::PArgb64 => Some(wgpu::TextureFormat::Rgba16Unorm),
        _ => None,
    }
}

/// The pixel format advertised for a texture of the given wgpu format.
pub fn to_pixel_format(format: wgpu::TextureFormat) -> PixelFormat {
    match format {
        wgpu::TextureFormat::Bgra8Unorm
        | wgpu::TextureFormat::Bgra8UnormSrgb
        | wgpu::TextureFormat::Rgba8Unorm
        | wgpu::TextureFormat::Rgba8UnormSrgb => PixelFormat::Argb32,
        wgpu::TextureFormat::R16Unorm => PixelFormat::GrayScale16,
        wgpu::TextureFormat::Rgba16Unorm => PixelFormat::Argb64,
        _ => PixelFormat::Undefined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_for_representable_formats() {
        for format in [
            PixelFormat::Argb32,
            PixelFormat::GrayScale16,
            PixelFormat::Argb64,
        ] {
            let native = to_texture_format(format).unwrap();
            assert_eq!(to_pixel_format(native), format);
        }
    }

    #[test]
    fn test_premultiplied_share_storage() {
        assert_eq!(
            to_texture_format(PixelFormat::PArgb32),
            to_texture_format(PixelFormat::Argb32)
        );
    }

    #[test]
    fn test_unrepresentable_formats() {
        assert_eq!(to_texture_format(PixelFormat::Indexed8), None);
        assert_eq!(to_texture_format(PixelFormat::Rgb24), None);
        assert_eq!(to_texture_format(PixelFormat::Rgb565), None);
        assert_eq!(
            to_pixel_format(wgpu::TextureFormat::Depth32Float),
            PixelFormat::Undefined
        );
    }
}
