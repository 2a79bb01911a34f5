//! Source sampling at fractional coordinates.
//!
//! Inverse-mapping filters walk the destination raster and look up a
//! source position for every pixel; these helpers turn that position
//! into a pixel value.

use crate::buffer::{Pixel, PixelBuffer};

/// Sample `src` at (x, y), bilinear when `antialias` is set.
#[inline]
pub fn sample(src: &PixelBuffer, x: f64, y: f64, antialias: bool) -> Pixel {
    if antialias {
        sample_bilinear(src, x, y)
    } else {
        sample_nearest(src, x, y)
    }
}

/// Nearest pixel to (x, y), clamped into the buffer.
#[inline]
pub fn sample_nearest(src: &PixelBuffer, x: f64, y: f64) -> Pixel {
    let ix = if x.is_finite() { x.round() as i64 } else { 0 };
    let iy = if y.is_finite() { y.round() as i64 } else { 0 };
    src.pixel_clamped(ix, iy)
}

/// Weighted average of the four pixels surrounding (x, y).
///
/// Neighbors outside the buffer are clamped to the nearest edge pixel.
/// All four channels are interpolated.
pub fn sample_bilinear(src: &PixelBuffer, x: f64, y: f64) -> Pixel {
    if !x.is_finite() || !y.is_finite() {
        return src.pixel_clamped(0, 0);
    }

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let p00 = src.pixel_clamped(x0, y0);
    let p10 = src.pixel_clamped(x0 + 1, y0);
    let p01 = src.pixel_clamped(x0, y0 + 1);
    let p11 = src.pixel_clamped(x0 + 1, y0 + 1);

    let max = src.depth().max_value() as f64;
    let lerp = |a: u16, b: u16, c: u16, d: u16| -> u16 {
        let v = a as f64 * (1.0 - fx) * (1.0 - fy)
            + b as f64 * fx * (1.0 - fy)
            + c as f64 * (1.0 - fx) * fy
            + d as f64 * fx * fy;
        v.clamp(0.0, max).round() as u16
    };

    Pixel::new(
        lerp(p00.r, p10.r, p01.r, p11.r),
        lerp(p00.g, p10.g, p01.g, p11.g),
        lerp(p00.b, p10.b, p01.b, p11.b),
        lerp(p00.a, p10.a, p01.a, p11.a),
    )
}
