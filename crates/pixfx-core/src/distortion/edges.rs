//! Neon and Find Edges.

use crate::buffer::{Pixel, PixelBuffer};
use crate::error::FilterResult;
use crate::task::Progress;

/// Highlight edges by the gradient against the right and lower neighbor.
///
/// # Arguments
/// * `intensity` - Gradient gain as a power of two, clamped to `[0, 5]`
/// * `border_width` - Neighbor distance, clamped to `[1, 5]`
/// * `invert` - Find Edges (dark edges on white) instead of Neon
///
/// Neighbor distance shrinks near the right and bottom edges so the last
/// column and row compare against themselves. Alpha is preserved.
pub fn edges(
    src: &PixelBuffer,
    intensity: i32,
    border_width: i32,
    invert: bool,
    progress: &mut Progress<'_>,
) -> FilterResult<PixelBuffer> {
    let intensity = intensity.clamp(0, 5);
    let border_width = border_width.clamp(1, 5) as i64;
    let gain = ((1u32 << intensity) as f64).sqrt();
    let max = src.depth().max_value();

    let (width, height) = (src.width(), src.height());
    let mut out = src.blank_like();

    let edge = |a: u16, b: u16, c: u16| -> u16 {
        let d1 = a as f64 - b as f64;
        let d2 = a as f64 - c as f64;
        let v = ((d1 * d1 + d2 * d2).sqrt() * gain) as i64;
        let v = v.clamp(0, max as i64) as u16;
        if invert {
            max - v
        } else {
            v
        }
    };

    for y in 0..height {
        progress.check()?;
        let below = y + neighbor_offset(y as i64, border_width, height as i64) as u32;
        for x in 0..width {
            let right = x + neighbor_offset(x as i64, border_width, width as i64) as u32;
            let p = src.pixel(x, y);
            let p1 = src.pixel(right, y);
            let p2 = src.pixel(x, below);
            out.set_pixel(
                x,
                y,
                Pixel::new(
                    edge(p.r, p1.r, p2.r),
                    edge(p.g, p1.g, p2.g),
                    edge(p.b, p1.b, p2.b),
                    p.a,
                ),
            );
        }
        progress.update(y as u64 + 1, height as u64);
    }

    Ok(out)
}

/// Largest offset `<= wanted` that keeps `pos + offset` inside `len`.
fn neighbor_offset(pos: i64, wanted: i64, len: i64) -> i64 {
    (len - 1 - pos).clamp(0, wanted)
}
