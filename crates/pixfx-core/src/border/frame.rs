//! Solid, two-tone and beveled frames.

use crate::buffer::{Pixel, PixelBuffer, Rgba8};
use crate::error::FilterResult;
use crate::task::Progress;

/// Build a `(w + 2·border) × (h + 2·border)` canvas one row at a time.
///
/// `paint` draws the frame part of canvas row `y`; the matching source row
/// is then copied over the center. Cancellation is checked before every
/// row and progress reported after it.
pub(crate) fn compose_rows<F>(
    src: &PixelBuffer,
    border: u32,
    progress: &mut Progress<'_>,
    mut paint: F,
) -> FilterResult<PixelBuffer>
where
    F: FnMut(&mut PixelBuffer, i64),
{
    let mut out = PixelBuffer::blank(
        src.width() + 2 * border,
        src.height() + 2 * border,
        src.depth(),
        src.has_alpha(),
    );
    let height = out.height();
    let b = border as i64;

    for y in 0..height {
        progress.check()?;
        let row = y as i64;
        paint(&mut out, row);
        let sy = row - b;
        if (0..src.height() as i64).contains(&sy) {
            out.blit(src, 0, sy, src.width(), 1, b, row);
        }
        progress.update(y as u64 + 1, height as u64);
    }

    Ok(out)
}

/// Surround `src` with a `width`-pixel band of `color`.
///
/// The result is `(w + 2·width) × (h + 2·width)` with `src` copied
/// unchanged at `(width, width)`.
pub fn solid(
    src: &PixelBuffer,
    color: Rgba8,
    width: u32,
    progress: &mut Progress<'_>,
) -> FilterResult<PixelBuffer> {
    let fill = color.to_pixel(src.depth());
    let canvas_w = (src.width() + 2 * width) as i64;
    compose_rows(src, width, progress, |out, y| {
        fill_span(out, y, 0, canvas_w, fill)
    })
}

/// A thin `line_color` line directly around the image inside a wide
/// `border_color` band.
///
/// The canvas grows by `border_width + line_width` on every side.
pub fn niepce(
    src: &PixelBuffer,
    border_color: Rgba8,
    border_width: u32,
    line_color: Rgba8,
    line_width: u32,
    progress: &mut Progress<'_>,
) -> FilterResult<PixelBuffer> {
    let depth = src.depth();
    let band = border_color.to_pixel(depth);
    let line = line_color.to_pixel(depth);
    let total = border_width + line_width;
    let canvas_w = src.width() + 2 * total;
    let canvas_h = src.height() + 2 * total;
    let inset = border_width as i64;

    compose_rows(src, total, progress, |out, y| {
        fill_span(out, y, 0, canvas_w as i64, band);
        frame_row(
            out,
            y,
            inset,
            inset,
            canvas_w - 2 * border_width,
            canvas_h - 2 * border_width,
            line_width,
            line,
        );
    })
}

/// Beveled frame: `top_color` on the top and left bands, `bottom_color`
/// on the bottom and right bands, split along the diagonals at the
/// top-right and bottom-left corners.
pub fn bevel(
    src: &PixelBuffer,
    top_color: Rgba8,
    bottom_color: Rgba8,
    width: u32,
    progress: &mut Progress<'_>,
) -> FilterResult<PixelBuffer> {
    let depth = src.depth();
    let top = top_color.to_pixel(depth);
    let bottom = bottom_color.to_pixel(depth);

    let b = width as i64;
    let w = (src.width() + 2 * width) as i64;
    let h = (src.height() + 2 * width) as i64;

    compose_rows(src, width, progress, |out, y| {
        let split = if y < b {
            // Top band: light up to the wedge at the right end.
            w - 1 - y
        } else if y >= h - b {
            // Bottom band: light only inside the wedge at the left end.
            b - (y - (h - b))
        } else {
            fill_span(out, y, 0, b, top);
            fill_span(out, y, w - b, w, bottom);
            return;
        };
        let split = split.clamp(0, w);
        fill_span(out, y, 0, split, top);
        fill_span(out, y, split, w, bottom);
    })
}

fn fill_span(out: &mut PixelBuffer, y: i64, from: i64, to: i64, pixel: Pixel) {
    if to > from {
        out.fill_rect(from, y, (to - from) as u32, 1, pixel);
    }
}

/// Paint row `y` of a `thickness`-wide frame lying just inside the
/// rectangle `(x, top, width, height)`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn frame_row(
    out: &mut PixelBuffer,
    y: i64,
    x: i64,
    top: i64,
    width: u32,
    height: u32,
    thickness: u32,
    pixel: Pixel,
) {
    if thickness == 0 || y < top || y >= top + height as i64 {
        return;
    }
    let t = thickness.min(width).min(height) as i64;
    let right = x + width as i64;
    if y < top + t || y >= top + height as i64 - t {
        fill_span(out, y, x, right, pixel);
    } else {
        fill_span(out, y, x, x + t, pixel);
        fill_span(out, y, right - t, right, pixel);
    }
}
