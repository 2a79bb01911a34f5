//! WASM-compatible wrapper types for pixel buffers.
//!
//! Buffers cross the boundary as raw bytes in the core layout (interleaved
//! B, G, R[, A], little-endian samples for 16-bit). Canvas `ImageData`
//! uses RGBA order instead; `from_rgba` / `to_rgba` convert.

use pixfx_core::{BitDepth, Filter, FilterResult, FilterTask, PixelBuffer, Rgba8};
use wasm_bindgen::prelude::*;

/// A pixel buffer held in WASM memory.
///
/// # Memory Management
///
/// `data()` copies the bytes into JavaScript. Call `free()` to release a
/// large buffer early; otherwise wasm-bindgen's finalizer reclaims it.
#[wasm_bindgen]
pub struct JsPixelBuffer {
    inner: PixelBuffer,
}

#[wasm_bindgen]
impl JsPixelBuffer {
    /// Wrap raw bytes in the core layout.
    ///
    /// # Errors
    /// Returns an error if `data` does not match the declared layout.
    #[wasm_bindgen(constructor)]
    pub fn new(
        width: u32,
        height: u32,
        sixteen_bit: bool,
        has_alpha: bool,
        data: Vec<u8>,
    ) -> Result<JsPixelBuffer, JsValue> {
        let depth = if sixteen_bit {
            BitDepth::Sixteen
        } else {
            BitDepth::Eight
        };
        PixelBuffer::new(width, height, depth, has_alpha, data)
            .map(Self::from_core)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Build an 8-bit buffer with alpha from canvas RGBA bytes.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<JsPixelBuffer, JsValue> {
        let img = image::RgbaImage::from_raw(width, height, rgba)
            .ok_or_else(|| JsValue::from_str("RGBA data does not match dimensions"))?;
        Ok(Self::from_core(PixelBuffer::from_rgba_image(&img)))
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    #[wasm_bindgen(getter)]
    pub fn sixteen_bit(&self) -> bool {
        self.inner.depth() == BitDepth::Sixteen
    }

    #[wasm_bindgen(getter)]
    pub fn has_alpha(&self) -> bool {
        self.inner.has_alpha()
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.inner.data().len()
    }

    /// Raw bytes in the core layout (copied).
    pub fn data(&self) -> Vec<u8> {
        self.inner.data().to_vec()
    }

    /// 8-bit RGBA bytes for a canvas `ImageData` (copied).
    pub fn to_rgba(&self) -> Vec<u8> {
        self.inner.to_rgba_image().into_raw()
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {}
}

impl JsPixelBuffer {
    pub(crate) fn from_core(inner: PixelBuffer) -> Self {
        Self { inner }
    }

    pub(crate) fn as_core(&self) -> &PixelBuffer {
        &self.inner
    }
}

/// Run `filter` over a copy of `image` on the calling thread.
pub(crate) fn run_filter(image: &JsPixelBuffer, filter: impl Filter + 'static) -> FilterResult<JsPixelBuffer> {
    FilterTask::new(image.as_core().clone(), filter)
        .run()
        .into_result()
        .map(JsPixelBuffer::from_core)
}

/// Parse a color given as 3 (opaque) or 4 bytes.
pub(crate) fn color_from_bytes(bytes: &[u8]) -> Result<Rgba8, String> {
    match *bytes {
        [r, g, b] => Ok(Rgba8::opaque(r, g, b)),
        [r, g, b, a] => Ok(Rgba8::new(r, g, b, a)),
        _ => Err(format!("color needs 3 or 4 components, got {}", bytes.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_pixel_buffer_creation() {
        let buf = JsPixelBuffer::new(4, 2, false, true, vec![0u8; 4 * 2 * 4]).unwrap();
        assert_eq!(buf.width(), 4);
        assert_eq!(buf.height(), 2);
        assert!(!buf.sixteen_bit());
        assert!(buf.has_alpha());
        assert_eq!(buf.byte_length(), 32);
    }

    #[test]
    fn test_sixteen_bit_layout() {
        let buf = JsPixelBuffer::new(3, 1, true, false, vec![7u8; 3 * 3 * 2]).unwrap();
        assert!(buf.sixteen_bit());
        assert_eq!(buf.data(), vec![7u8; 18]);
    }

    #[test]
    fn test_rgba_round_trip() {
        let rgba = vec![10, 20, 30, 255, 40, 50, 60, 128];
        let buf = JsPixelBuffer::from_rgba(2, 1, rgba.clone()).unwrap();
        // Stored as BGRA.
        assert_eq!(buf.data(), vec![30, 20, 10, 255, 60, 50, 40, 128]);
        assert_eq!(buf.to_rgba(), rgba);
    }

    #[test]
    fn test_color_from_bytes() {
        assert_eq!(color_from_bytes(&[1, 2, 3]), Ok(Rgba8::opaque(1, 2, 3)));
        assert_eq!(color_from_bytes(&[1, 2, 3, 4]), Ok(Rgba8::new(1, 2, 3, 4)));
        assert!(color_from_bytes(&[1, 2]).is_err());
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_length_mismatch_errors() {
        assert!(JsPixelBuffer::new(4, 4, false, true, vec![0u8; 10]).is_err());
    }

    #[wasm_bindgen_test]
    fn test_rgba_length_mismatch_errors() {
        assert!(JsPixelBuffer::from_rgba(2, 2, vec![0u8; 3]).is_err());
    }
}
