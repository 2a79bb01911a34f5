//! Histogram computation from pixel buffers.
//!
//! The histogram feeds auto levels and the clipping indicators.

use crate::buffer::PixelBuffer;
use crate::Histogram;

/// Compute per-channel and luminosity histograms of a buffer.
///
/// # Arguments
/// * `buffer` - Source pixels, 8 or 16 bits per channel
///
/// # Returns
/// A `Histogram` with one bin per sample value of the buffer's depth.
/// Buffers without alpha count every pixel as fully opaque.
pub fn compute_histogram(buffer: &PixelBuffer) -> Histogram {
    let depth = buffer.depth();
    let mut hist = Histogram::new(depth);

    if buffer.is_empty() {
        return hist;
    }

    let max = depth.max_value();
    for y in 0..buffer.height() {
        for x in 0..buffer.width() {
            let p = buffer.pixel(x, y);
            hist.red[p.r as usize] += 1;
            hist.green[p.g as usize] += 1;
            hist.blue[p.b as usize] += 1;
            hist.alpha[p.a as usize] += 1;

            let lum = calculate_luminance(p.r, p.g, p.b, max);
            hist.luminosity[lum as usize] += 1;
        }
    }

    hist
}

/// Calculate luminance from RGB using ITU-R BT.709 coefficients.
#[inline]
fn calculate_luminance(r: u16, g: u16, b: u16, max: u16) -> u16 {
    let lum = 0.2126 * r as f64 + 0.7152 * g as f64 + 0.0722 * b as f64;
    lum.clamp(0.0, max as f64).round() as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{BitDepth, Pixel};

    #[test]
    fn test_empty_histogram() {
        let buf = PixelBuffer::blank(0, 0, BitDepth::Eight, true);
        let hist = compute_histogram(&buf);
        assert_eq!(hist.max_value(), 0);
        assert_eq!(hist.total(), 0);
    }

    #[test]
    fn test_single_red_pixel() {
        let buf = PixelBuffer::filled(1, 1, BitDepth::Eight, true, Pixel::new(255, 0, 0, 255));
        let hist = compute_histogram(&buf);
        assert_eq!(hist.red[255], 1);
        assert_eq!(hist.green[0], 1);
        assert_eq!(hist.blue[0], 1);
        assert_eq!(hist.alpha[255], 1);
        assert!(hist.has_highlight_clipping());
        assert!(hist.has_shadow_clipping());
    }

    #[test]
    fn test_luminance_of_white_and_gray() {
        let mut buf = PixelBuffer::blank(2, 1, BitDepth::Eight, false);
        buf.set_pixel(0, 0, Pixel::new(255, 255, 255, 255));
        buf.set_pixel(1, 0, Pixel::new(128, 128, 128, 255));
        let hist = compute_histogram(&buf);
        assert_eq!(hist.luminosity[255], 1);
        assert_eq!(hist.luminosity[128], 1);
        // No alpha channel reads as opaque.
        assert_eq!(hist.alpha[255], 2);
    }

    #[test]
    fn test_sixteen_bit_bins() {
        let buf = PixelBuffer::filled(
            3,
            2,
            BitDepth::Sixteen,
            true,
            Pixel::new(1000, 40000, 65535, 65535),
        );
        let hist = compute_histogram(&buf);
        assert_eq!(hist.red.len(), 65536);
        assert_eq!(hist.red[1000], 6);
        assert_eq!(hist.green[40000], 6);
        assert_eq!(hist.total(), 6);
        assert!(hist.has_highlight_clipping());
        assert!(!hist.has_shadow_clipping());
    }
}
