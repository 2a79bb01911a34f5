//! Perspective transform.
//!
//! A source rectangle is mapped onto an arbitrary quadrilateral by a 3×3
//! projective [`Matrix3`]. [`warp_perspective`] walks the destination raster
//! and inverse-maps every pixel through that matrix.

pub mod matrix;
pub mod perspective;

use serde::{Deserialize, Serialize};

use crate::buffer::{PixelBuffer, Rgba8};

pub use matrix::Matrix3;
pub use perspective::{
    apply_perspective, new_center, perspective_matrix, warp_perspective, PerspectiveFilter,
};

/// A position in pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle that is mapped onto a [`Quad`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SourceRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole buffer.
    pub fn of(buffer: &PixelBuffer) -> Self {
        Self::new(0.0, 0.0, buffer.width() as f64, buffer.height() as f64)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Destination quadrilateral, one point per source corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
}

impl Quad {
    pub const fn new(top_left: Point, top_right: Point, bottom_left: Point, bottom_right: Point) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    /// The quad whose corners are the corners of `rect`.
    pub fn from_rect(rect: &SourceRect) -> Self {
        Self::new(
            Point::new(rect.x, rect.y),
            Point::new(rect.right(), rect.y),
            Point::new(rect.x, rect.bottom()),
            Point::new(rect.right(), rect.bottom()),
        )
    }

    pub fn corners(&self) -> [Point; 4] {
        [self.top_left, self.top_right, self.bottom_left, self.bottom_right]
    }

    /// Smallest rectangle containing all four corners.
    pub fn bounding_rect(&self) -> SourceRect {
        let corners = self.corners();
        let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        SourceRect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// Perspective warp settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveParams {
    /// Where the source rectangle's corners end up.
    pub quad: Quad,
    /// Rectangle that is mapped onto `quad`; the whole image when `None`.
    #[serde(default)]
    pub source: Option<SourceRect>,
    #[serde(default = "default_antialias")]
    pub antialias: bool,
    /// Map `quad` back onto its bounding rectangle instead.
    #[serde(default)]
    pub inverse: bool,
    /// Fill for pixels that map outside the source. Opaque black unless set,
    /// both here and in the wasm bindings.
    #[serde(default = "default_background")]
    pub background: Rgba8,
}

fn default_antialias() -> bool {
    true
}

fn default_background() -> Rgba8 {
    Rgba8::BLACK
}

impl PerspectiveParams {
    pub fn new(quad: Quad) -> Self {
        Self {
            quad,
            source: None,
            antialias: default_antialias(),
            inverse: false,
            background: default_background(),
        }
    }

    /// Parameters that leave `buffer` unchanged.
    pub fn identity_for(buffer: &PixelBuffer) -> Self {
        Self::new(Quad::from_rect(&SourceRect::of(buffer)))
    }
}
