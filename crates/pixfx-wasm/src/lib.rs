//! pixfx WASM - WebAssembly bindings for the pixfx filters
//!
//! This crate exposes the pixfx-core filters to JavaScript/TypeScript.
//! Every filter takes a `JsPixelBuffer` and returns a new one; the input
//! is never modified.
//!
//! # Module Structure
//!
//! - `types` - Pixel buffer wrapper and canvas RGBA conversion
//! - `levels` - Levels, auto levels and histograms
//! - `distortion` - Distortion effects
//! - `transform` - Perspective warping
//! - `border` - Solid, niepce, beveled and textured borders
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsPixelBuffer, apply_distortion } from '@pixfx/wasm';
//!
//! await init();
//!
//! const data = ctx.getImageData(0, 0, w, h);
//! const image = JsPixelBuffer.from_rgba(w, h, data.data);
//! const result = apply_distortion(image, "fish-eye", 50, 0, true, 0);
//! ctx.putImageData(new ImageData(new Uint8ClampedArray(result.to_rgba()), w, h), 0, 0);
//! ```

use wasm_bindgen::prelude::*;

mod border;
mod distortion;
mod levels;
mod transform;
mod types;

// Re-export public types
pub use border::{apply_border, apply_pattern_border, border_styles};
pub use distortion::{apply_distortion, distortion_effects};
pub use levels::{apply_levels, auto_levels, compute_histogram, JsHistogram, JsLevels};
pub use transform::{apply_perspective, perspective_center};
pub use types::JsPixelBuffer;

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
