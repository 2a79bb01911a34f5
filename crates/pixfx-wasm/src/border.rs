//! Border WASM bindings.
//!
//! The browser has no tile directory, so named pattern styles passed to
//! `apply_border` leave the image unchanged. Use `apply_pattern_border`
//! with the tile's encoded bytes instead.

use crate::types::{color_from_bytes, run_filter, JsPixelBuffer};
use image::RgbaImage;
use pixfx_core::border::decode_pattern;
use pixfx_core::{
    BorderFilter, BorderParameters, BorderPattern, BorderStyle, FilterError, FilterResult,
    PatternSource,
};
use wasm_bindgen::prelude::*;

struct NoTiles;

impl PatternSource for NoTiles {
    fn load(&self, pattern: BorderPattern) -> FilterResult<RgbaImage> {
        Err(FilterError::ResourceUnavailable(format!(
            "no tile for {} in the browser",
            pattern.name()
        )))
    }
}

/// Style names accepted by `apply_border`.
#[wasm_bindgen]
pub fn border_styles() -> Vec<String> {
    let mut styles = vec![
        BorderStyle::Solid.to_string(),
        BorderStyle::Niepce.to_string(),
        BorderStyle::Beveled.to_string(),
    ];
    styles.extend(BorderPattern::ALL.iter().map(|p| p.name().to_string()));
    styles
}

fn border_params(
    style: BorderStyle,
    width: u32,
    first_color: &[u8],
    first_width: u32,
    second_color: &[u8],
    second_width: u32,
) -> Result<BorderParameters, JsValue> {
    Ok(BorderParameters {
        width,
        first_color: color_from_bytes(first_color).map_err(|e| JsValue::from_str(&e))?,
        first_width,
        second_color: color_from_bytes(second_color).map_err(|e| JsValue::from_str(&e))?,
        second_width,
        ..BorderParameters::for_style(style)
    })
}

/// Add a border around an image.
///
/// # Arguments
/// * `style` - `"solid"`, `"niepce"`, `"beveled"` or a pattern name
/// * `width` - Border width on every side
/// * `first_color`, `second_color` - RGB or RGBA bytes
/// * `first_width`, `second_width` - Line widths (pattern and niepce styles)
///
/// # Example (TypeScript)
/// ```typescript
/// const framed = apply_border(image, "niepce", 40, [255, 255, 255], 0, [0, 0, 0], 4);
/// ```
#[allow(clippy::too_many_arguments)]
#[wasm_bindgen]
pub fn apply_border(
    image: &JsPixelBuffer,
    style: &str,
    width: u32,
    first_color: &[u8],
    first_width: u32,
    second_color: &[u8],
    second_width: u32,
) -> Result<JsPixelBuffer, JsValue> {
    let style: BorderStyle = style
        .parse()
        .map_err(|e: FilterError| JsValue::from_str(&e.to_string()))?;
    let params = border_params(style, width, first_color, first_width, second_color, second_width)?;
    run_filter(image, BorderFilter::new(params, NoTiles)).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Add a textured border using a tile supplied as PNG or JPEG bytes.
///
/// # Errors
/// Returns an error if the tile cannot be decoded.
#[allow(clippy::too_many_arguments)]
#[wasm_bindgen]
pub fn apply_pattern_border(
    image: &JsPixelBuffer,
    tile: &[u8],
    width: u32,
    first_color: &[u8],
    first_width: u32,
    second_color: &[u8],
    second_width: u32,
) -> Result<JsPixelBuffer, JsValue> {
    let tile = decode_pattern(tile).map_err(|e| JsValue::from_str(&e.to_string()))?;
    // The in-memory tile serves every pattern name.
    let params = border_params(
        BorderStyle::Pattern(BorderPattern::Pine),
        width,
        first_color,
        first_width,
        second_color,
        second_width,
    )?;
    run_filter(image, BorderFilter::new(params, tile)).map_err(|e| JsValue::from_str(&e.to_string()))
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_unknown_style_errors() {
        let image = JsPixelBuffer::new(1, 1, false, true, vec![0, 0, 0, 255]).unwrap();
        assert!(apply_border(&image, "lace", 2, &[0, 0, 0], 0, &[0, 0, 0], 0).is_err());
    }

    #[wasm_bindgen_test]
    fn test_bad_tile_errors() {
        let image = JsPixelBuffer::new(1, 1, false, true, vec![0, 0, 0, 255]).unwrap();
        assert!(apply_pattern_border(&image, b"garbage", 2, &[0, 0, 0], 0, &[0, 0, 0], 0).is_err());
    }
}
