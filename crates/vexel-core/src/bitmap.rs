//! In-place passes over raw decoded pixel rows.

use crate::color::Color;

/// Replace every pixel that exactly matches one of `keys` with a fully
/// transparent one.
///
/// `data` is tightly packed RGBA8 rows of `stride` bytes each
/// (`stride >= width * 4`); trailing padding bytes in a row are compared
/// too, matching the original stride-wide scan. Each key is compared at
/// full opacity (alpha = 255), and a matching pixel is overwritten with
/// all four bytes zero — not just the alpha channel. Downstream consumers
/// rely on this exact behavior; see DESIGN.md before changing it.
pub fn make_transparent(data: &mut [u8], stride: usize, height: usize, keys: &[Color]) {
    let mut replaced = 0usize;
    for key in keys {
        let [r, g, b, _] = key.to_rgba_u8();
        let from = [r, g, b, 0xFF];
        replaced += make_transparent_key(data, stride, height, from);
    }
    if replaced > 0 {
        tracing::trace!("Color-keyed {} pixels to transparent", replaced);
    }
}

fn make_transparent_key(data: &mut [u8], stride: usize, height: usize, from: [u8; 4]) -> usize {
    let mut replaced = 0;
    for row in data.chunks_exact_mut(stride).take(height) {
        for px in row.chunks_exact_mut(4) {
            if *px == from {
                px.copy_from_slice(&[0, 0, 0, 0]);
                replaced += 1;
            }
        }
    }
    replaced
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_pixel_is_fully_zeroed() {
        // magenta key: the color bytes must be zeroed along with alpha
        let mut data = vec![255, 0, 255, 255, 10, 20, 30, 255];
        make_transparent(&mut data, 8, 1, &[Color::MAGENTA]);
        assert_eq!(&data[..4], &[0, 0, 0, 0]);
        assert_eq!(&data[4..], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_non_opaque_pixels_do_not_match() {
        let mut data = vec![255, 0, 255, 254];
        make_transparent(&mut data, 4, 1, &[Color::MAGENTA]);
        assert_eq!(&data[..], &[255, 0, 255, 254]);
    }

    #[test]
    fn test_multiple_keys() {
        let mut data = vec![255, 0, 255, 255, 0, 255, 0, 255];
        make_transparent(&mut data, 8, 1, &[Color::MAGENTA, Color::GREEN]);
        assert_eq!(&data[..], &[0u8; 8]);
    }
}
