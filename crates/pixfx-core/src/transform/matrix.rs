//! 3×3 projective matrix.
//!
//! Builder operations (`translate`, `scale`, `multiply`) left-multiply, so
//! calls read in the order the transforms are applied to a point.

use std::ops::Mul;

use serde::{Deserialize, Serialize};

use crate::error::{FilterError, FilterResult};

/// Homogeneous 2D transform, `coeff[row][column]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix3 {
    pub coeff: [[f64; 3]; 3],
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix3 {
    pub const fn identity() -> Self {
        Self {
            coeff: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    pub const fn from_rows(coeff: [[f64; 3]; 3]) -> Self {
        Self { coeff }
    }

    /// Follow the current transform with a translation.
    pub fn translate(&mut self, x: f64, y: f64) {
        let [r0, r1, r2] = &mut self.coeff;
        for c in 0..3 {
            r0[c] += x * r2[c];
            r1[c] += y * r2[c];
        }
    }

    /// Follow the current transform with an axis scale.
    pub fn scale(&mut self, x: f64, y: f64) {
        for c in 0..3 {
            self.coeff[0][c] *= x;
            self.coeff[1][c] *= y;
        }
    }

    /// Follow the current transform with `other` (`self = other × self`).
    pub fn multiply(&mut self, other: &Matrix3) {
        *self = *other * *self;
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.coeff;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Inverse matrix, or `DegenerateTransform` when singular.
    pub fn inverted(&self) -> FilterResult<Matrix3> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return Err(FilterError::DegenerateTransform(format!(
                "matrix is not invertible (determinant {})",
                det
            )));
        }
        let m = &self.coeff;
        let inv_det = 1.0 / det;
        let mut out = [[0.0; 3]; 3];

        out[0][0] = (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det;
        out[1][0] = -(m[1][0] * m[2][2] - m[1][2] * m[2][0]) * inv_det;
        out[2][0] = (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det;
        out[0][1] = -(m[0][1] * m[2][2] - m[0][2] * m[2][1]) * inv_det;
        out[1][1] = (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det;
        out[2][1] = -(m[0][0] * m[2][1] - m[0][1] * m[2][0]) * inv_det;
        out[0][2] = (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det;
        out[1][2] = -(m[0][0] * m[1][2] - m[0][2] * m[1][0]) * inv_det;
        out[2][2] = (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det;

        Ok(Matrix3 { coeff: out })
    }

    /// Map (x, y), dividing by the homogeneous coordinate.
    ///
    /// Fails with `DegenerateTransform` when that coordinate is zero.
    pub fn transform_point(&self, x: f64, y: f64) -> FilterResult<(f64, f64)> {
        let m = &self.coeff;
        let w = m[2][0] * x + m[2][1] * y + m[2][2];
        if w == 0.0 {
            return Err(FilterError::DegenerateTransform(format!(
                "homogeneous coordinate is zero at ({}, {})",
                x, y
            )));
        }
        let tx = m[0][0] * x + m[0][1] * y + m[0][2];
        let ty = m[1][0] * x + m[1][1] * y + m[1][2];
        if w == 1.0 {
            Ok((tx, ty))
        } else {
            Ok((tx / w, ty / w))
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// No perspective terms.
    pub fn is_affine(&self) -> bool {
        self.coeff[2] == [0.0, 0.0, 1.0]
    }
}

impl Mul for Matrix3 {
    type Output = Matrix3;

    fn mul(self, rhs: Matrix3) -> Matrix3 {
        let mut out = [[0.0; 3]; 3];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.coeff[r][k] * rhs.coeff[k][c]).sum();
            }
        }
        Matrix3 { coeff: out }
    }
}
