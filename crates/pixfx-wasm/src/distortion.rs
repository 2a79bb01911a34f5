//! Distortion effect WASM bindings.

use crate::types::{run_filter, JsPixelBuffer};
use pixfx_core::{DistortionEffect, DistortionFilter, DistortionParams};
use wasm_bindgen::prelude::*;

/// Names accepted by `apply_distortion`, in menu order.
#[wasm_bindgen]
pub fn distortion_effects() -> Vec<String> {
    DistortionEffect::ALL
        .iter()
        .map(|effect| effect.name().to_string())
        .collect()
}

/// Apply a distortion effect.
///
/// # Arguments
/// * `image` - Source image (not modified)
/// * `effect` - Effect name, e.g. `"fish-eye"` or `"waves-horizontal"`
/// * `level` - Effect strength
/// * `iteration` - Frequency or size, depending on the effect
/// * `antialias` - Bilinear sampling for the remapping effects
/// * `seed` - Random seed for `"tile"`
///
/// # Example (TypeScript)
/// ```typescript
/// const result = apply_distortion(image, "twirl", 60, 0, true, 0);
/// ```
#[wasm_bindgen]
pub fn apply_distortion(
    image: &JsPixelBuffer,
    effect: &str,
    level: i32,
    iteration: i32,
    antialias: bool,
    seed: u32,
) -> Result<JsPixelBuffer, JsValue> {
    let effect: DistortionEffect = effect
        .parse()
        .map_err(|e: pixfx_core::FilterError| JsValue::from_str(&e.to_string()))?;
    let params = DistortionParams {
        effect,
        level,
        iteration,
        antialias,
        seed: seed as u64,
    };
    run_filter(image, DistortionFilter::new(params)).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> JsPixelBuffer {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x * 10) as u8, (y * 10) as u8, 128, 255]);
            }
        }
        JsPixelBuffer::new(width, height, false, true, data).unwrap()
    }

    #[test]
    fn test_effect_names() {
        let names = distortion_effects();
        assert_eq!(names.len(), 18);
        assert_eq!(names[0], "fish-eye");
        assert!(names.iter().any(|n| n == "circular-waves2"));
    }

    #[test]
    fn test_every_effect_keeps_layout() {
        let src = gradient(12, 8);
        for name in distortion_effects() {
            let out = apply_distortion(&src, &name, 40, 20, true, 7).unwrap();
            assert_eq!((out.width(), out.height()), (12, 8), "{}", name);
            assert_eq!(out.byte_length(), src.byte_length(), "{}", name);
        }
    }

    #[test]
    fn test_tile_without_jitter_is_identity() {
        let src = gradient(9, 9);
        let out = apply_distortion(&src, "tile", 1, 206, false, 3).unwrap();
        assert_eq!(out.data(), src.data());
    }

    #[test]
    fn test_seed_is_reproducible() {
        let src = gradient(16, 16);
        let a = apply_distortion(&src, "tile", 30, 204, false, 11).unwrap();
        let b = apply_distortion(&src, "tile", 30, 204, false, 11).unwrap();
        assert_eq!(a.data(), b.data());
    }
}
