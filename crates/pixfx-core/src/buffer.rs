//! Raw pixel buffer shared by every filter.
//!
//! Pixels are stored interleaved in B, G, R[, A] order, rows top to bottom
//! with no padding. 16-bit samples are little-endian.

use serde::{Deserialize, Serialize};

use crate::error::{FilterError, FilterResult};

/// Bits per channel of a pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BitDepth {
    /// 8 bits per channel.
    #[default]
    Eight,
    /// 16 bits per channel.
    Sixteen,
}

impl BitDepth {
    /// Largest representable sample value.
    #[inline]
    pub fn max_value(self) -> u16 {
        match self {
            BitDepth::Eight => u8::MAX as u16,
            BitDepth::Sixteen => u16::MAX,
        }
    }

    /// Bytes used by one channel sample.
    #[inline]
    pub fn bytes_per_sample(self) -> usize {
        match self {
            BitDepth::Eight => 1,
            BitDepth::Sixteen => 2,
        }
    }

    /// Number of entries in a lookup table covering every sample value.
    #[inline]
    pub fn lut_size(self) -> usize {
        self.max_value() as usize + 1
    }

    /// Bits per channel (8 or 16).
    pub fn bits(self) -> u32 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
        }
    }

    /// Parse a bit count, returning `None` for anything but 8 or 16.
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(BitDepth::Eight),
            16 => Some(BitDepth::Sixteen),
            _ => None,
        }
    }
}

/// One pixel in its buffer's native sample scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pixel {
    pub r: u16,
    pub g: u16,
    pub b: u16,
    pub a: u16,
}

impl Pixel {
    pub const fn new(r: u16, g: u16, b: u16, a: u16) -> Self {
        Self { r, g, b, a }
    }

    /// Samples in storage order (B, G, R, A).
    #[inline]
    pub(crate) fn to_bgra(self) -> [u16; 4] {
        [self.b, self.g, self.r, self.a]
    }

    #[inline]
    pub(crate) fn from_bgra(s: [u16; 4]) -> Self {
        Self {
            b: s[0],
            g: s[1],
            r: s[2],
            a: s[3],
        }
    }
}

/// An 8-bit RGBA color as chosen by a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BLACK: Rgba8 = Rgba8::new(0, 0, 0, 255);
    pub const WHITE: Rgba8 = Rgba8::new(255, 255, 255, 255);
    pub const TRANSPARENT: Rgba8 = Rgba8::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully opaque color.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Convert to a pixel in the sample scale of `depth`.
    pub fn to_pixel(self, depth: BitDepth) -> Pixel {
        let scale = |v: u8| match depth {
            BitDepth::Eight => v as u16,
            BitDepth::Sixteen => v as u16 * 257,
        };
        Pixel::new(scale(self.r), scale(self.g), scale(self.b), scale(self.a))
    }
}

impl Default for Rgba8 {
    fn default() -> Self {
        Self::BLACK
    }
}

/// An image held as raw interleaved channel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    depth: BitDepth,
    has_alpha: bool,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap existing channel data, checking its length against the layout.
    ///
    /// # Errors
    /// `InvalidBuffer` for a zero width or height, or a data length that
    /// does not match the layout.
    pub fn new(
        width: u32,
        height: u32,
        depth: BitDepth,
        has_alpha: bool,
        data: Vec<u8>,
    ) -> FilterResult<Self> {
        if width == 0 || height == 0 {
            return Err(FilterError::InvalidBuffer(format!(
                "zero-sized buffer {}x{}",
                width, height
            )));
        }
        let expected = byte_len(width, height, depth, has_alpha);
        if data.len() != expected {
            return Err(FilterError::InvalidBuffer(format!(
                "expected {} bytes for {}x{} ({}-bit, alpha={}), got {}",
                expected,
                width,
                height,
                depth.bits(),
                has_alpha,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            depth,
            has_alpha,
            data,
        })
    }

    /// Buffer with every sample set to zero.
    pub fn blank(width: u32, height: u32, depth: BitDepth, has_alpha: bool) -> Self {
        Self {
            width,
            height,
            depth,
            has_alpha,
            data: vec![0u8; byte_len(width, height, depth, has_alpha)],
        }
    }

    /// Buffer with every pixel set to `pixel`.
    pub fn filled(width: u32, height: u32, depth: BitDepth, has_alpha: bool, pixel: Pixel) -> Self {
        let mut buffer = Self::blank(width, height, depth, has_alpha);
        buffer.fill(pixel);
        buffer
    }

    /// Empty buffer with the same layout and size as `self`.
    pub fn blank_like(&self) -> Self {
        Self::blank(self.width, self.height, self.depth, self.has_alpha)
    }

    /// Build an 8-bit BGRA buffer from an `image::RgbaImage`.
    pub fn from_rgba_image(img: &image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let mut data = Vec::with_capacity(img.as_raw().len());
        for px in img.pixels() {
            let [r, g, b, a] = px.0;
            data.extend_from_slice(&[b, g, r, a]);
        }
        Self {
            width,
            height,
            depth: BitDepth::Eight,
            has_alpha: true,
            data,
        }
    }

    /// Build a 16-bit BGRA buffer from a 16-bit RGBA image.
    pub fn from_rgba16_image(img: &image::ImageBuffer<image::Rgba<u16>, Vec<u16>>) -> Self {
        let (width, height) = img.dimensions();
        let mut buffer = Self::blank(width, height, BitDepth::Sixteen, true);
        for (x, y, px) in img.enumerate_pixels() {
            let [r, g, b, a] = px.0;
            buffer.set_pixel(x, y, Pixel::new(r, g, b, a));
        }
        buffer
    }

    /// Convert to an 8-bit `image::RgbaImage` (16-bit samples are reduced).
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        let shift = match self.depth {
            BitDepth::Eight => 0,
            BitDepth::Sixteen => 8,
        };
        image::RgbaImage::from_fn(self.width, self.height, |x, y| {
            let p = self.pixel(x, y);
            image::Rgba([
                (p.r >> shift) as u8,
                (p.g >> shift) as u8,
                (p.b >> shift) as u8,
                (p.a >> shift) as u8,
            ])
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> BitDepth {
        self.depth
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Raw channel data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer, returning its channel data.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Channels per pixel (3 or 4).
    #[inline]
    pub fn channels(&self) -> usize {
        if self.has_alpha {
            4
        } else {
            3
        }
    }

    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        self.channels() * self.depth.bytes_per_sample()
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * self.bytes_per_pixel()
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Check if this buffer has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether `other` has the same dimensions, depth and alpha layout.
    pub fn same_layout(&self, other: &PixelBuffer) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.depth == other.depth
            && self.has_alpha == other.has_alpha
    }

    /// Byte offset of pixel (x, y).
    #[inline]
    pub fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride() + x as usize * self.bytes_per_pixel()
    }

    /// Row `y` as raw bytes.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride();
        &self.data[start..start + self.stride()]
    }

    /// Row `y` as mutable raw bytes.
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &mut self.data[start..start + stride]
    }

    #[inline]
    fn read_sample(&self, offset: usize) -> u16 {
        match self.depth {
            BitDepth::Eight => self.data[offset] as u16,
            BitDepth::Sixteen => u16::from_le_bytes([self.data[offset], self.data[offset + 1]]),
        }
    }

    #[inline]
    fn write_sample(&mut self, offset: usize, value: u16) {
        match self.depth {
            BitDepth::Eight => self.data[offset] = value.min(255) as u8,
            BitDepth::Sixteen => {
                let [lo, hi] = value.to_le_bytes();
                self.data[offset] = lo;
                self.data[offset + 1] = hi;
            }
        }
    }

    /// Read pixel (x, y). Buffers without alpha report an opaque alpha.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Pixel {
        let base = self.offset(x, y);
        let step = self.depth.bytes_per_sample();
        let mut s = [0u16, 0, 0, self.depth.max_value()];
        for (c, sample) in s.iter_mut().enumerate().take(self.channels()) {
            *sample = self.read_sample(base + c * step);
        }
        Pixel::from_bgra(s)
    }

    /// Read a pixel with coordinates clamped into the buffer.
    #[inline]
    pub fn pixel_clamped(&self, x: i64, y: i64) -> Pixel {
        let cx = x.clamp(0, self.width as i64 - 1) as u32;
        let cy = y.clamp(0, self.height as i64 - 1) as u32;
        self.pixel(cx, cy)
    }

    /// Write pixel (x, y). Alpha is dropped for buffers without alpha.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Pixel) {
        let base = self.offset(x, y);
        let step = self.depth.bytes_per_sample();
        let s = pixel.to_bgra();
        for (c, &sample) in s.iter().enumerate().take(self.channels()) {
            self.write_sample(base + c * step, sample);
        }
    }

    /// Set every pixel to `pixel`.
    pub fn fill(&mut self, pixel: Pixel) {
        let (w, h) = (self.width, self.height);
        self.fill_rect(0, 0, w, h, pixel);
    }

    /// Fill a rectangle, clipped to the buffer.
    pub fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, pixel: Pixel) {
        if self.is_empty() {
            return;
        }
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + width as i64).min(self.width as i64);
        let y1 = (y + height as i64).min(self.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        // Encode the pixel once, then replicate its bytes.
        let bpp = self.bytes_per_pixel();
        let mut encoded = PixelBuffer::blank(1, 1, self.depth, self.has_alpha);
        encoded.set_pixel(0, 0, pixel);
        let bytes = encoded.data;

        for py in y0..y1 {
            let start = self.offset(x0 as u32, py as u32);
            let end = start + (x1 - x0) as usize * bpp;
            for chunk in self.data[start..end].chunks_exact_mut(bpp) {
                chunk.copy_from_slice(&bytes);
            }
        }
    }

    /// Copy a `width`×`height` block of `src` at (sx, sy) to (dx, dy).
    ///
    /// Both rectangles are clipped; `src` must share this buffer's depth and
    /// alpha layout.
    #[allow(clippy::too_many_arguments)]
    pub fn blit(
        &mut self,
        src: &PixelBuffer,
        sx: i64,
        sy: i64,
        width: u32,
        height: u32,
        dx: i64,
        dy: i64,
    ) {
        debug_assert!(
            src.depth == self.depth && src.has_alpha == self.has_alpha,
            "blit between different pixel layouts"
        );

        // Clip against the source.
        let mut sx = sx;
        let mut sy = sy;
        let mut dx = dx;
        let mut dy = dy;
        let mut w = width as i64;
        let mut h = height as i64;
        if sx < 0 {
            w += sx;
            dx -= sx;
            sx = 0;
        }
        if sy < 0 {
            h += sy;
            dy -= sy;
            sy = 0;
        }
        w = w.min(src.width as i64 - sx);
        h = h.min(src.height as i64 - sy);

        // Clip against the destination.
        if dx < 0 {
            w += dx;
            sx -= dx;
            dx = 0;
        }
        if dy < 0 {
            h += dy;
            sy -= dy;
            dy = 0;
        }
        w = w.min(self.width as i64 - dx);
        h = h.min(self.height as i64 - dy);

        if w <= 0 || h <= 0 {
            return;
        }

        let bpp = self.bytes_per_pixel();
        let row_bytes = w as usize * bpp;
        for row in 0..h {
            let s = src.offset(sx as u32, (sy + row) as u32);
            let d = self.offset(dx as u32, (dy + row) as u32);
            self.data[d..d + row_bytes].copy_from_slice(&src.data[s..s + row_bytes]);
        }
    }
}

/// Bytes needed for a buffer of the given layout.
fn byte_len(width: u32, height: u32, depth: BitDepth, has_alpha: bool) -> usize {
    let channels = if has_alpha { 4 } else { 3 };
    width as usize * height as usize * channels * depth.bytes_per_sample()
}
