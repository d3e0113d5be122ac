//! Per-pixel alpha blending.
//!
//! Both the text and the bitmap pipeline funnel every sample through the
//! same straight-alpha "over" operator. The stored overlay format is BGRA32
//! with 8 bits per channel and straight (non-premultiplied) alpha; all
//! intermediate arithmetic is integer fixed-point so the hot loop stays
//! branch-light.

/// Bytes per overlay pixel (BGRA, 8 bits per channel).
pub const BYTES_PER_PIXEL: usize = 4;

/// Blend one straight-alpha source sample over a destination BGRA pixel.
///
/// Implements the standard "over" operator per channel:
/// `out_c = src_c * a + dst_c * (1 - a)` and
/// `out_a = a + dst_a * (1 - a)`, with results rounded to 8 bits.
///
/// A fully opaque source (`a == 255`) replaces the destination exactly; a
/// fully transparent source (`a == 0`) leaves it untouched. Inputs are never
/// rejected, so the function has no failure modes.
///
/// # Panics
///
/// Panics if `dst` is shorter than [`BYTES_PER_PIXEL`].
///
/// # Example
///
/// ```
/// use subrender::blend::blend_pixel;
///
/// let mut dst = [0u8, 0, 0, 0];
/// blend_pixel(&mut dst, 0, 0, 255, 255);
/// assert_eq!(dst, [0, 0, 255, 255]); // opaque red replaces the pixel
/// ```
#[inline]
pub fn blend_pixel(dst: &mut [u8], b: u8, g: u8, r: u8, a: u8) {
    let a = u32::from(a);
    let inv = 255 - a;
    dst[0] = ((u32::from(b) * a + u32::from(dst[0]) * inv + 127) / 255) as u8;
    dst[1] = ((u32::from(g) * a + u32::from(dst[1]) * inv + 127) / 255) as u8;
    dst[2] = ((u32::from(r) * a + u32::from(dst[2]) * inv + 127) / 255) as u8;
    dst[3] = ((a * 255 + u32::from(dst[3]) * inv + 127) / 255) as u8;
}

/// Combine a coverage sample with a colour's alpha.
///
/// Coverage masks store per-pixel opacity separately from the run colour;
/// the effective sample alpha is the rounded product of the two.
#[inline]
pub fn coverage_alpha(coverage: u8, colour_alpha: u8) -> u8 {
    ((u32::from(coverage) * u32::from(colour_alpha) + 127) / 255) as u8
}

/// Blend a coverage mask into a BGRA buffer with clipping.
///
/// `mask` is `mask_width * mask_height` coverage bytes placed with its
/// top-left corner at `(origin_x, origin_y)` in buffer coordinates, coloured
/// with the straight-alpha RGBA `colour`. Samples falling outside the
/// `buffer_width * buffer_height` buffer are skipped, never written.
pub fn blend_mask(
    buffer: &mut [u8],
    buffer_width: u32,
    buffer_height: u32,
    origin_x: i32,
    origin_y: i32,
    mask: &[u8],
    mask_width: u32,
    mask_height: u32,
    colour: [u8; 4],
) {
    let [r, g, b, colour_alpha] = colour;
    if colour_alpha == 0 {
        return;
    }

    // Clip the mask rectangle against the buffer once, outside the pixel loop.
    let x0 = origin_x.max(0);
    let y0 = origin_y.max(0);
    let x1 = (origin_x + mask_width as i32).min(buffer_width as i32);
    let y1 = (origin_y + mask_height as i32).min(buffer_height as i32);
    if x1 <= x0 || y1 <= y0 {
        return;
    }

    for y in y0..y1 {
        let mask_row = ((y - origin_y) as usize) * mask_width as usize;
        let buffer_row = (y as usize) * buffer_width as usize;
        for x in x0..x1 {
            let coverage = mask[mask_row + (x - origin_x) as usize];
            if coverage == 0 {
                continue;
            }
            let alpha = coverage_alpha(coverage, colour_alpha);
            let offset = (buffer_row + x as usize) * BYTES_PER_PIXEL;
            blend_pixel(&mut buffer[offset..offset + BYTES_PER_PIXEL], b, g, r, alpha);
        }
    }
}
