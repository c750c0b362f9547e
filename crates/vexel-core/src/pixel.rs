//! The canonical pixel-format enum exchanged at backend boundaries.
//!
//! Each backend keeps a fixed mapping between this enum and its native
//! format type; formats a backend cannot express map to [`PixelFormat::Undefined`].

/// Pixel layouts a surface can advertise.
///
/// The set is closed: indexed/palette formats, the 16-bit packed RGB
/// variants, and the wide (48/64-bit) formats exist so that decoded images
/// can report what they contained, even when a given backend stores texels
/// in a single native layout internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// Sentinel for formats no backend mapping recognizes.
    #[default]
    Undefined,
    Indexed1,
    Indexed4,
    Indexed8,
    Rgb555,
    Rgb565,
    GrayScale16,
    Argb1555,
    Rgb24,
    Rgb32,
    Argb32,
    PArgb32,
    Rgb48,
    Argb64,
    PArgb64,
}

impl PixelFormat {
    /// Storage bits per pixel, 0 for `Undefined`.
    pub fn bits_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Undefined => 0,
            PixelFormat::Indexed1 => 1,
            PixelFormat::Indexed4 => 4,
            PixelFormat::Indexed8 => 8,
            PixelFormat::Rgb555
            | PixelFormat::Rgb565
            | PixelFormat::GrayScale16
            | PixelFormat::Argb1555 => 16,
            PixelFormat::Rgb24 => 24,
            PixelFormat::Rgb32 | PixelFormat::Argb32 | PixelFormat::PArgb32 => 32,
            PixelFormat::Rgb48 => 48,
            PixelFormat::Argb64 | PixelFormat::PArgb64 => 64,
        }
    }

    /// Whether the format carries an alpha channel.
    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            PixelFormat::Argb1555
                | PixelFormat::Argb32
                | PixelFormat::PArgb32
                | PixelFormat::Argb64
                | PixelFormat::PArgb64
        )
    }

    /// Whether the format is palette-indexed.
    pub fn is_indexed(self) -> bool {
        matches!(
            self,
            PixelFormat::Indexed1 | PixelFormat::Indexed4 | PixelFormat::Indexed8
        )
    }

    /// Whether the color channels are premultiplied by alpha.
    pub fn is_premultiplied(self) -> bool {
        matches!(self, PixelFormat::PArgb32 | PixelFormat::PArgb64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_per_pixel() {
        assert_eq!(PixelFormat::Undefined.bits_per_pixel(), 0);
        assert_eq!(PixelFormat::Indexed4.bits_per_pixel(), 4);
        assert_eq!(PixelFormat::Rgb565.bits_per_pixel(), 16);
        assert_eq!(PixelFormat::Argb32.bits_per_pixel(), 32);
        assert_eq!(PixelFormat::PArgb64.bits_per_pixel(), 64);
    }

    #[test]
    fn test_alpha_and_premultiplied() {
        assert!(PixelFormat::Argb32.has_alpha());
        assert!(!PixelFormat::Rgb32.has_alpha());
        assert!(PixelFormat::PArgb32.is_premultiplied());
        assert!(!PixelFormat::Argb32.is_premultiplied());
    }
}
