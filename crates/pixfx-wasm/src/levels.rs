//! Levels WASM bindings.
//!
//! `JsLevels` holds per-channel levels that TypeScript edits field by field,
//! stores as JSON or as a levels preset file, and applies with
//! `apply_levels`.

use crate::types::{run_filter, JsPixelBuffer};
use pixfx_core::levels::preset::{format_preset, parse_preset};
use pixfx_core::levels::DEFAULT_AUTO_CUTOFF;
use pixfx_core::{
    compute_histogram as core_histogram, BitDepth, Channel, LevelsFilter, LevelsParameters,
};
use wasm_bindgen::prelude::*;

/// Levels parameters for JavaScript.
///
/// Channels are addressed by index: 0 = luminosity, 1 = red, 2 = green,
/// 3 = blue, 4 = alpha.
#[wasm_bindgen]
pub struct JsLevels {
    inner: LevelsParameters,
}

#[wasm_bindgen]
impl JsLevels {
    /// Identity levels for 8-bit or 16-bit images.
    #[wasm_bindgen(constructor)]
    pub fn new(sixteen_bit: bool) -> Self {
        let depth = if sixteen_bit {
            BitDepth::Sixteen
        } else {
            BitDepth::Eight
        };
        Self {
            inner: LevelsParameters::new(depth),
        }
    }

    /// Set all five values of one channel.
    ///
    /// # Errors
    /// Returns an error for an unknown channel index. Out-of-range values
    /// are reported later by `apply_levels`.
    pub fn set_channel(
        &mut self,
        channel: u8,
        low_input: u16,
        high_input: u16,
        gamma: f64,
        low_output: u16,
        high_output: u16,
    ) -> Result<(), JsValue> {
        let channel = channel_from_index(channel)?;
        let levels = self.inner.channel_mut(channel);
        levels.low_input = low_input;
        levels.high_input = high_input;
        levels.gamma = gamma;
        levels.low_output = low_output;
        levels.high_output = high_output;
        Ok(())
    }

    /// `[low_input, high_input, gamma, low_output, high_output]` of one channel.
    pub fn channel(&self, channel: u8) -> Result<Vec<f64>, JsValue> {
        let levels = self.inner.channel(channel_from_index(channel)?);
        Ok(vec![
            levels.low_input as f64,
            levels.high_input as f64,
            levels.gamma,
            levels.low_output as f64,
            levels.high_output as f64,
        ])
    }

    pub fn reset(&mut self) {
        self.inner.reset_all();
    }

    pub fn is_identity(&self) -> bool {
        self.inner.is_identity()
    }

    /// Contents of a levels preset file.
    pub fn to_preset(&self) -> String {
        format_preset(&self.inner)
    }

    /// Parse a levels preset file.
    pub fn from_preset(text: &str) -> Result<JsLevels, JsValue> {
        let inner = parse_preset(text).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self { inner })
    }

    /// Serialize to JSON for storage
    pub fn to_json(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Deserialize from JSON
    pub fn from_json(value: JsValue) -> Result<JsLevels, JsValue> {
        let inner: LevelsParameters =
            serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self { inner })
    }
}

fn channel_from_index(index: u8) -> Result<Channel, JsValue> {
    Channel::ALL
        .get(index as usize)
        .copied()
        .ok_or_else(|| JsValue::from_str(&format!("unknown channel index {}", index)))
}

/// Apply levels to an image.
///
/// # Errors
/// Returns an error when the levels are out of range or were built for a
/// different bit depth than the image.
///
/// # Example (TypeScript)
/// ```typescript
/// const levels = new JsLevels(false);
/// levels.set_channel(0, 20, 235, 1.2, 0, 255);
/// const result = apply_levels(image, levels);
/// ```
#[wasm_bindgen]
pub fn apply_levels(image: &JsPixelBuffer, levels: &JsLevels) -> Result<JsPixelBuffer, JsValue> {
    let filter = LevelsFilter::new(&levels.inner).map_err(|e| JsValue::from_str(&e.to_string()))?;
    run_filter(image, filter).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Levels that stretch the image's histogram to the full range.
#[wasm_bindgen]
pub fn auto_levels(image: &JsPixelBuffer) -> JsLevels {
    let histogram = core_histogram(image.as_core());
    JsLevels {
        inner: pixfx_core::auto_levels(&histogram, DEFAULT_AUTO_CUTOFF),
    }
}

/// Histogram result accessible from JavaScript.
///
/// One bin per sample value: 256 for 8-bit images, 65536 for 16-bit.
#[wasm_bindgen]
pub struct JsHistogram {
    red: Vec<u32>,
    green: Vec<u32>,
    blue: Vec<u32>,
    alpha: Vec<u32>,
    luminosity: Vec<u32>,
    max_value: u32,
    has_highlight_clipping: bool,
    has_shadow_clipping: bool,
}

#[wasm_bindgen]
impl JsHistogram {
    pub fn red(&self) -> Vec<u32> {
        self.red.clone()
    }

    pub fn green(&self) -> Vec<u32> {
        self.green.clone()
    }

    pub fn blue(&self) -> Vec<u32> {
        self.blue.clone()
    }

    pub fn alpha(&self) -> Vec<u32> {
        self.alpha.clone()
    }

    pub fn luminosity(&self) -> Vec<u32> {
        self.luminosity.clone()
    }

    /// Largest RGB bin, for normalizing the display.
    #[wasm_bindgen(getter)]
    pub fn max_value(&self) -> u32 {
        self.max_value
    }

    #[wasm_bindgen(getter)]
    pub fn has_highlight_clipping(&self) -> bool {
        self.has_highlight_clipping
    }

    #[wasm_bindgen(getter)]
    pub fn has_shadow_clipping(&self) -> bool {
        self.has_shadow_clipping
    }
}

/// Compute per-channel histograms of an image.
#[wasm_bindgen]
pub fn compute_histogram(image: &JsPixelBuffer) -> JsHistogram {
    let hist = core_histogram(image.as_core());
    JsHistogram {
        max_value: hist.max_value(),
        has_highlight_clipping: hist.has_highlight_clipping(),
        has_shadow_clipping: hist.has_shadow_clipping(),
        red: hist.red,
        green: hist.green,
        blue: hist.blue,
        alpha: hist.alpha,
        luminosity: hist.luminosity,
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_unknown_channel_errors() {
        let mut levels = JsLevels::new(false);
        assert!(levels.set_channel(5, 0, 255, 1.0, 0, 255).is_err());
        assert!(levels.channel(9).is_err());
    }

    #[wasm_bindgen_test]
    fn test_invalid_levels_error() {
        let mut levels = JsLevels::new(false);
        levels.set_channel(1, 200, 100, 1.0, 0, 255).unwrap();
        let image = JsPixelBuffer::new(1, 1, false, true, vec![0, 0, 0, 255]).unwrap();
        assert!(apply_levels(&image, &levels).is_err());
    }

    #[wasm_bindgen_test]
    fn test_depth_mismatch_errors() {
        let levels = JsLevels::new(true);
        let image = JsPixelBuffer::new(1, 1, false, true, vec![0, 0, 0, 255]).unwrap();
        assert!(apply_levels(&image, &levels).is_err());
    }

    #[wasm_bindgen_test]
    fn test_json_round_trip() {
        let mut levels = JsLevels::new(false);
        levels.set_channel(3, 1, 254, 0.8, 2, 253).unwrap();
        let json = levels.to_json().unwrap();
        let restored = JsLevels::from_json(json).unwrap();
        assert_eq!(restored.channel(3).unwrap(), levels.channel(3).unwrap());
    }

    #[wasm_bindgen_test]
    fn test_bad_preset_errors() {
        assert!(JsLevels::from_preset("not a preset").is_err());
    }
}
