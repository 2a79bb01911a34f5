//! Effects that move whole rows, columns or blocks of the source.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::buffer::PixelBuffer;
use crate::error::FilterResult;
use crate::task::Progress;

/// Shift each row (or column) sideways along a sine wave.
///
/// # Arguments
/// * `amplitude` - Maximum shift in pixels; negative counts as zero
/// * `frequency` - Wave frequency; negative counts as zero
/// * `fill_sides` - Wrap shifted-out pixels around to the other side
/// * `horizontal` - Shift rows (`true`) or columns (`false`)
///
/// Without `fill_sides`, uncovered pixels stay zero.
pub fn waves(
    src: &PixelBuffer,
    amplitude: i32,
    frequency: i32,
    fill_sides: bool,
    horizontal: bool,
    progress: &mut Progress<'_>,
) -> FilterResult<PixelBuffer> {
    if src.is_empty() {
        return Ok(src.clone());
    }
    let amplitude = amplitude.max(0) as f64;
    let frequency = frequency.max(0) as f64;
    let shift_at = |i: u32| -> i64 {
        (amplitude * (frequency * 2.0 * i as f64 * PI / 180.0).sin()).round() as i64
    };

    let (width, height) = (src.width(), src.height());
    let mut out = src.blank_like();

    if horizontal {
        for y in 0..height {
            progress.check()?;
            let tx = shift_at(y);
            if fill_sides {
                let s = tx.rem_euclid(width as i64);
                out.blit(src, 0, y as i64, width - s as u32, 1, s, y as i64);
                out.blit(src, width as i64 - s, y as i64, s as u32, 1, 0, y as i64);
            } else {
                out.blit(src, 0, y as i64, width, 1, tx, y as i64);
            }
            progress.update(y as u64 + 1, height as u64);
        }
    } else {
        let shifts: Vec<i64> = (0..width).map(shift_at).collect();
        for y in 0..height {
            progress.check()?;
            for (x, &ty) in shifts.iter().enumerate() {
                let sy = y as i64 - ty;
                let sy = if fill_sides {
                    sy.rem_euclid(height as i64)
                } else if (0..height as i64).contains(&sy) {
                    sy
                } else {
                    continue;
                };
                out.set_pixel(x as u32, y, src.pixel(x as u32, sy as u32));
            }
            progress.update(y as u64 + 1, height as u64);
        }
    }

    Ok(out)
}

/// Displace every pixel by a sine of its position (or of its offset from
/// the center with `from_center`), reading the source clamped to bounds.
pub fn block_waves(
    src: &PixelBuffer,
    amplitude: i32,
    frequency: i32,
    from_center: bool,
    progress: &mut Progress<'_>,
) -> FilterResult<PixelBuffer> {
    if src.is_empty() {
        return Ok(src.clone());
    }
    let amplitude = amplitude.max(0) as f64;
    let frequency = frequency.max(0) as f64;
    let half_w = (src.width() / 2) as f64;
    let half_h = (src.height() / 2) as f64;
    let height = src.height();
    let mut out = src.blank_like();

    for y in 0..height {
        progress.check()?;
        let fy = y as f64;
        for x in 0..src.width() {
            let fx = x as f64;
            let (ax, ay) = if from_center {
                (half_w - fx, half_h - fy)
            } else {
                (fx, fy)
            };
            let nw = fx + amplitude * (frequency * ax * PI / 180.0).sin();
            let nh = fy + amplitude * (frequency * ay * PI / 180.0).cos();
            out.set_pixel(x, y, src.pixel_clamped(nw as i64, nh as i64));
        }
        progress.update(y as u64 + 1, height as u64);
    }

    Ok(out)
}

/// Cut the image into `tile_width`×`tile_height` blocks and move each one
/// by a random offset in `[-random/2, random/2]` on both axes.
///
/// Sizes and `random` are raised to at least 1. The same `seed` always
/// produces the same output. Uncovered pixels stay zero.
pub fn tile(
    src: &PixelBuffer,
    tile_width: i32,
    tile_height: i32,
    random: i32,
    seed: u64,
    progress: &mut Progress<'_>,
) -> FilterResult<PixelBuffer> {
    if src.is_empty() {
        return Ok(src.clone());
    }
    let tile_width = tile_width.max(1) as u32;
    let tile_height = tile_height.max(1) as u32;
    let half = (random.max(1) / 2) as i64;
    trace!(tile_width, tile_height, half, seed, "tile");

    let mut rng = StdRng::seed_from_u64(seed);
    let (width, height) = (src.width(), src.height());
    let mut out = src.blank_like();

    for by in (0..height).step_by(tile_height as usize) {
        progress.check()?;
        for bx in (0..width).step_by(tile_width as usize) {
            let tx = rng.gen_range(-half..=half);
            let ty = rng.gen_range(-half..=half);
            out.blit(
                src,
                bx as i64,
                by as i64,
                tile_width,
                tile_height,
                bx as i64 + tx,
                by as i64 + ty,
            );
        }
        progress.update((by + tile_height).min(height) as u64, height as u64);
    }

    Ok(out)
}
