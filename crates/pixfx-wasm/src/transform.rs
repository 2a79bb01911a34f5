//! Perspective transform WASM bindings.
//!
//! Quads cross the boundary as 8 numbers: top-left, top-right,
//! bottom-left, bottom-right, each as `x, y`.

use crate::types::{color_from_bytes, run_filter, JsPixelBuffer};
use pixfx_core::{new_center, PerspectiveFilter, PerspectiveParams, Point, Quad, SourceRect};
use wasm_bindgen::prelude::*;

fn quad_from_corners(corners: &[f64]) -> Result<Quad, String> {
    match *corners {
        [tlx, tly, trx, try_, blx, bly, brx, bry] => Ok(Quad::new(
            Point::new(tlx, tly),
            Point::new(trx, try_),
            Point::new(blx, bly),
            Point::new(brx, bry),
        )),
        _ => Err(format!("quad needs 8 coordinates, got {}", corners.len())),
    }
}

/// Map the image rectangle onto a quadrilateral.
///
/// # Arguments
/// * `image` - Source image (not modified)
/// * `corners` - Destination quad, 8 values
/// * `antialias` - Bilinear sampling
/// * `inverse` - Straighten the quad back into the image rectangle instead
/// * `background` - RGB or RGBA fill for uncovered pixels; empty keeps the
///   core default (opaque black)
///
/// The output keeps the source dimensions.
///
/// # Example (TypeScript)
/// ```typescript
/// const corners = [10, 0, 90, 0, 0, 100, 100, 100];
/// const result = apply_perspective(image, corners, true, false, []);
/// ```
#[wasm_bindgen]
pub fn apply_perspective(
    image: &JsPixelBuffer,
    corners: &[f64],
    antialias: bool,
    inverse: bool,
    background: &[u8],
) -> Result<JsPixelBuffer, JsValue> {
    let params = perspective_params(corners, antialias, inverse, background)?;
    run_filter(image, PerspectiveFilter::new(params)).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn perspective_params(
    corners: &[f64],
    antialias: bool,
    inverse: bool,
    background: &[u8],
) -> Result<PerspectiveParams, JsValue> {
    let quad = quad_from_corners(corners).map_err(|e| JsValue::from_str(&e))?;
    let mut params = PerspectiveParams::new(quad);
    params.antialias = antialias;
    params.inverse = inverse;
    if !background.is_empty() {
        params.background = color_from_bytes(background).map_err(|e| JsValue::from_str(&e))?;
    }
    Ok(params)
}

/// Where the center of a `width`×`height` image lands under the quad
/// mapping, as `[x, y]`.
#[wasm_bindgen]
pub fn perspective_center(width: u32, height: u32, corners: &[f64]) -> Result<Vec<f64>, JsValue> {
    let quad = quad_from_corners(corners).map_err(|e| JsValue::from_str(&e))?;
    let source = SourceRect::new(0.0, 0.0, width as f64, height as f64);
    let center = new_center(&source, &quad).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(vec![center.x, center.y])
}
