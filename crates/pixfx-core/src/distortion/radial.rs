//! Inverse mappings around the image center.
//!
//! Radii are measured in aspect-corrected space: the shorter axis is
//! stretched by the image aspect ratio so that the effects stay circular
//! on non-square images.

use std::f64::consts::PI;

use tracing::trace;

use super::{remap, Geometry};
use crate::buffer::PixelBuffer;
use crate::error::FilterResult;
use crate::task::Progress;

/// Bulge (positive `coeff`) or pinch (negative `coeff`) around the center.
///
/// # Arguments
/// * `coeff` - Distortion strength; `0.0` returns a copy of `src`
/// * `antialias` - Bilinear sampling
///
/// Pixels outside the inscribed circle are copied unchanged.
pub fn fisheye(
    src: &PixelBuffer,
    coeff: f64,
    antialias: bool,
    progress: &mut Progress<'_>,
) -> FilterResult<PixelBuffer> {
    if coeff == 0.0 {
        return Ok(src.clone());
    }

    let g = Geometry::new(src.width(), src.height());
    let step = coeff / 1000.0;
    let k = g.radius / (step.abs() * g.radius + 1.0).ln();
    trace!(coeff, step, k, "fisheye");

    remap(src, antialias, progress, |x, y| {
        let tw = g.x_scale * (x - g.half_w);
        let th = g.y_scale * (y - g.half_h);
        let r = tw.hypot(th);
        if r >= g.radius {
            return None;
        }

        let angle = th.atan2(tw);
        let r = if coeff > 0.0 {
            ((r / k).exp() - 1.0) / step
        } else {
            k * (1.0 - step * r).ln()
        };

        Some((
            g.half_w + (r / g.x_scale) * angle.cos(),
            g.half_h + (r / g.y_scale) * angle.sin(),
        ))
    })
}

/// Spiral rotation that grows toward the center.
///
/// `distance / 10000` radians are added per unit of distance from the rim.
pub fn twirl(
    src: &PixelBuffer,
    distance: f64,
    antialias: bool,
    progress: &mut Progress<'_>,
) -> FilterResult<PixelBuffer> {
    if distance == 0.0 {
        return Ok(src.clone());
    }

    let g = Geometry::new(src.width(), src.height());
    let angle_step = distance / 10000.0;

    remap(src, antialias, progress, |x, y| {
        let tw = g.x_scale * (x - g.half_w);
        let th = g.y_scale * (y - g.half_h);
        let r = tw.hypot(th);
        if r >= g.radius {
            return None;
        }

        let angle = th.atan2(tw) + angle_step * (g.radius - r);
        Some((
            g.half_w + angle.cos() * (r / g.x_scale),
            g.half_h + angle.sin() * (r / g.y_scale),
        ))
    })
}

/// Fisheye-style log/exp remap applied per axis.
pub fn cylindrical(
    src: &PixelBuffer,
    coeff: f64,
    horizontal: bool,
    vertical: bool,
    antialias: bool,
    progress: &mut Progress<'_>,
) -> FilterResult<PixelBuffer> {
    let g = Geometry::new(src.width(), src.height());
    // An axis of length 1 has no room to bend.
    let horizontal = horizontal && g.half_w > 0.0;
    let vertical = vertical && g.half_h > 0.0;
    if coeff == 0.0 || !(horizontal || vertical) {
        return Ok(src.clone());
    }

    let step = coeff / 1000.0;
    let kx = g.half_w / (step.abs() * g.half_w + 1.0).ln();
    let ky = g.half_h / (step.abs() * g.half_h + 1.0).ln();
    let bend = |d: f64, k: f64| {
        if coeff > 0.0 {
            ((d / k).exp() - 1.0) / step
        } else {
            k * (1.0 - step * d).ln()
        }
    };

    remap(src, antialias, progress, |x, y| {
        let mut nw = (x - g.half_w).abs();
        let mut nh = (y - g.half_h).abs();
        if horizontal {
            nw = bend(nw, kx);
        }
        if vertical {
            nh = bend(nh, ky);
        }
        Some((
            g.half_w + if x >= g.half_w { nw } else { -nw },
            g.half_h + if y >= g.half_h { nh } else { -nh },
        ))
    })
}

/// Multiply the polar angle by `factor`, producing `factor`-fold symmetry.
pub fn multiple_corners(
    src: &PixelBuffer,
    factor: f64,
    antialias: bool,
    progress: &mut Progress<'_>,
) -> FilterResult<PixelBuffer> {
    if factor == 0.0 {
        return Ok(src.clone());
    }

    let g = Geometry::new(src.width(), src.height());
    let max_radius = (src.width() as f64).hypot(src.height() as f64) / 2.0;

    remap(src, antialias, progress, |x, y| {
        let nw = g.half_w - x;
        let nh = g.half_h - y;
        let r = nw.hypot(nh);
        let angle = nh.atan2(nw) * factor;
        let r = r * r / max_radius;
        Some((g.half_w - angle.cos() * r, g.half_h - angle.sin() * r))
    })
}

/// Ripples spreading from a center point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularWaves {
    pub center_x: f64,
    pub center_y: f64,
    /// Displacement in pixels
    pub amplitude: f64,
    /// Degrees of phase per pixel of radius
    pub frequency: f64,
    /// Phase offset in degrees
    pub phase: f64,
    /// Scale the amplitude with the distance from the center
    pub proportional: bool,
}

impl CircularWaves {
    /// Waves centered on the middle of `src`.
    pub fn centered(
        src: &PixelBuffer,
        amplitude: f64,
        frequency: f64,
        phase: f64,
        proportional: bool,
    ) -> Self {
        Self {
            center_x: (src.width() / 2) as f64,
            center_y: (src.height() / 2) as f64,
            amplitude,
            frequency,
            phase,
            proportional,
        }
    }
}

/// Radial sinusoidal displacement. Negative amplitude or frequency count as zero.
pub fn circular_waves(
    src: &PixelBuffer,
    wave: &CircularWaves,
    antialias: bool,
    progress: &mut Progress<'_>,
) -> FilterResult<PixelBuffer> {
    let amplitude = wave.amplitude.max(0.0);
    if amplitude == 0.0 {
        return Ok(src.clone());
    }

    let frequency = wave.frequency.max(0.0).to_radians();
    let phase = wave.phase.to_radians();
    let max_radius = (src.width() as f64).hypot(src.height() as f64);

    remap(src, antialias, progress, |x, y| {
        let r = (wave.center_x - x).hypot(wave.center_y - y);
        let amp = if wave.proportional {
            amplitude * r / max_radius
        } else {
            amplitude
        };
        let theta = frequency * r + phase;
        Some((x + amp * theta.sin(), y + amp * theta.cos()))
    })
}

/// Map between Cartesian and polar layouts.
///
/// With `forward`, each output column is an angle and each output row a
/// radius; the inverse direction unrolls such an image back.
pub fn polar(
    src: &PixelBuffer,
    forward: bool,
    antialias: bool,
    progress: &mut Progress<'_>,
) -> FilterResult<PixelBuffer> {
    let g = Geometry::new(src.width(), src.height());
    let (w, h) = (src.width() as f64, src.height() as f64);

    remap(src, antialias, progress, |x, y| {
        if forward {
            let tw = g.x_scale * (x - g.half_w);
            let th = g.y_scale * (y - g.half_h);
            let r = tw.hypot(th);
            let angle = tw.atan2(th);
            Some((g.half_w + angle * w / (2.0 * PI), r * h / g.radius))
        } else {
            let r = y * g.radius / h;
            let angle = x * 2.0 * PI / w;
            Some((
                g.half_w - (r / g.x_scale) * angle.sin(),
                g.half_h - (r / g.y_scale) * angle.cos(),
            ))
        }
    })
}
