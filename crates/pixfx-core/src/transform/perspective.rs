//! Rectangle-to-quad projective solve and the inverse-mapping warp.

use tracing::{debug, warn};

use super::{Matrix3, PerspectiveParams, Point, Quad, SourceRect};
use crate::buffer::PixelBuffer;
use crate::error::{FilterError, FilterResult};
use crate::sample::sample_bilinear;
use crate::task::{Filter, Progress};

// =============================================================================
// Matrix construction
// =============================================================================

impl Matrix3 {
    /// Matrix mapping `source` onto `quad`.
    ///
    /// The rectangle is first normalized to the unit square, then the unit
    /// square is mapped onto the quad. The solve is affine when the quad is
    /// a parallelogram.
    ///
    /// # Errors
    /// `DegenerateTransform` when the quad has no projective solution or
    /// collapses the rectangle to a line or point.
    pub fn perspective(source: &SourceRect, quad: &Quad) -> FilterResult<Matrix3> {
        let unit = unit_square_to_quad(quad)?;

        let scale_x = if source.width > 0.0 { 1.0 / source.width } else { 1.0 };
        let scale_y = if source.height > 0.0 { 1.0 / source.height } else { 1.0 };

        let mut m = Matrix3::identity();
        m.translate(-source.x, -source.y);
        m.scale(scale_x, scale_y);
        m.multiply(&unit);

        let det = m.determinant();
        if det == 0.0 || !det.is_finite() {
            return Err(FilterError::DegenerateTransform(
                "quad collapses the source rectangle".to_string(),
            ));
        }
        Ok(m)
    }
}

/// Map the unit square's corners (0,0), (1,0), (0,1), (1,1) onto the
/// quad's top-left, top-right, bottom-left and bottom-right.
fn unit_square_to_quad(quad: &Quad) -> FilterResult<Matrix3> {
    let [p1, p2, p3, p4] = quad.corners();

    let dx1 = p2.x - p4.x;
    let dx2 = p3.x - p4.x;
    let dx3 = p1.x - p2.x + p4.x - p3.x;
    let dy1 = p2.y - p4.y;
    let dy2 = p3.y - p4.y;
    let dy3 = p1.y - p2.y + p4.y - p3.y;

    if dx3 == 0.0 && dy3 == 0.0 {
        return Ok(Matrix3::from_rows([
            [p2.x - p1.x, p4.x - p2.x, p1.x],
            [p2.y - p1.y, p4.y - p2.y, p1.y],
            [0.0, 0.0, 1.0],
        ]));
    }

    let det = dx1 * dy2 - dy1 * dx2;
    if det == 0.0 {
        return Err(FilterError::DegenerateTransform(
            "quad corners admit no projective mapping".to_string(),
        ));
    }
    let g = (dx3 * dy2 - dy3 * dx2) / det;
    let h = (dx1 * dy3 - dy1 * dx3) / det;

    Ok(Matrix3::from_rows([
        [p2.x - p1.x + g * p2.x, p3.x - p1.x + h * p3.x, p1.x],
        [p2.y - p1.y + g * p2.y, p3.y - p1.y + h * p3.y, p1.y],
        [g, h, 1.0],
    ]))
}

/// The matrix [`warp_perspective`] should use for `params`.
///
/// In inverse mode the quad is mapped back onto the source rectangle and
/// then fitted into the quad's bounding rectangle.
pub fn perspective_matrix(source: &SourceRect, params: &PerspectiveParams) -> FilterResult<Matrix3> {
    let forward = Matrix3::perspective(source, &params.quad)?;
    if !params.inverse {
        return Ok(forward);
    }

    let mut matrix = forward.inverted()?;
    let target = params.quad.bounding_rect();
    let sx = if source.width > 0.0 { target.width / source.width } else { 1.0 };
    let sy = if source.height > 0.0 { target.height / source.height } else { 1.0 };

    let mut into_bounds = Matrix3::identity();
    into_bounds.scale(sx, sy);
    into_bounds.translate(target.x, target.y);
    matrix.multiply(&into_bounds);
    Ok(matrix)
}

/// Where the center of `source` lands after mapping it onto `quad`.
pub fn new_center(source: &SourceRect, quad: &Quad) -> FilterResult<Point> {
    let matrix = Matrix3::perspective(source, quad)?;
    let c = source.center();
    let (x, y) = matrix.transform_point(c.x, c.y)?;
    Ok(Point::new(x, y))
}

// =============================================================================
// Warp
// =============================================================================

/// Warp `src` through `matrix`.
///
/// # Arguments
/// * `src` - Source pixels, never modified
/// * `matrix` - Forward mapping from source to destination coordinates
/// * `params` - Antialiasing, inverse mode and background color
/// * `progress` - Cancellation and progress, checked once per row
///
/// # Returns
/// A buffer with the layout of `src`. Destination pixels whose preimage
/// falls outside the source get `params.background`.
pub fn warp_perspective(
    src: &PixelBuffer,
    matrix: &Matrix3,
    params: &PerspectiveParams,
    progress: &mut Progress<'_>,
) -> FilterResult<PixelBuffer> {
    let inv = matrix.inverted()?;
    let m = inv.coeff;
    let antialias = params.antialias || params.inverse;
    let background = params.background.to_pixel(src.depth());

    let (width, height) = (src.width(), src.height());
    let (fw, fh) = (width as f64, height as f64);
    let mut out = src.blank_like();

    for y in 0..height {
        progress.check()?;

        // Homogeneous source position of the first pixel center in the row.
        let cy = y as f64 + 0.5;
        let mut tu = m[0][0] * 0.5 + m[0][1] * cy + m[0][2];
        let mut tv = m[1][0] * 0.5 + m[1][1] * cy + m[1][2];
        let mut tw = m[2][0] * 0.5 + m[2][1] * cy + m[2][2];
        let mut degenerate = 0u32;

        for x in 0..width {
            let pixel = if tw == 0.0 {
                degenerate += 1;
                background
            } else {
                let u = tu / tw - 0.5;
                let v = tv / tw - 0.5;
                let (iu, iv) = (u.round(), v.round());
                if iu >= 0.0 && iu < fw && iv >= 0.0 && iv < fh {
                    if antialias {
                        sample_bilinear(src, u, v)
                    } else {
                        src.pixel(iu as u32, iv as u32)
                    }
                } else {
                    background
                }
            };
            out.set_pixel(x, y, pixel);

            tu += m[0][0];
            tv += m[1][0];
            tw += m[2][0];
        }

        if degenerate > 0 {
            warn!(row = y, pixels = degenerate, "zero homogeneous coordinate, using background");
        }
        progress.update(y as u64 + 1, height as u64);
    }

    Ok(out)
}

/// Build the matrix for `params` and warp `src` with it.
pub fn apply_perspective(
    src: &PixelBuffer,
    params: &PerspectiveParams,
    progress: &mut Progress<'_>,
) -> FilterResult<PixelBuffer> {
    debug!(
        width = src.width(),
        height = src.height(),
        inverse = params.inverse,
        antialias = params.antialias,
        "perspective"
    );

    if src.is_empty() {
        return Ok(src.clone());
    }

    let source = params.source.unwrap_or_else(|| SourceRect::of(src));
    let matrix = perspective_matrix(&source, params)?;
    warp_perspective(src, &matrix, params, progress)
}

/// Perspective warp as a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveFilter {
    pub params: PerspectiveParams,
}

impl PerspectiveFilter {
    pub fn new(params: PerspectiveParams) -> Self {
        Self { params }
    }
}

impl Filter for PerspectiveFilter {
    fn name(&self) -> &'static str {
        "perspective"
    }

    fn apply(&self, src: &PixelBuffer, progress: &mut Progress<'_>) -> FilterResult<PixelBuffer> {
        apply_perspective(src, &self.params, progress)
    }
}
