//! Geometric distortion effects.
//!
//! Every effect walks the destination raster row by row and looks up a
//! source position through a closed-form inverse mapping (see [`radial`]),
//! or moves whole rows, columns or blocks of the source ([`waves`]).
//! [`edges`] holds the Neon and Find Edges effects, which share the
//! same parameter pair.
//!
//! # Parameters
//!
//! Effects are driven by two integer knobs, `level` and `iteration`, whose
//! meaning depends on the effect:
//!
//! | effect | level | iteration |
//! |---|---|---|
//! | FishEye / Caricature | coefficient × 5 | - |
//! | Twirl | twirl distance | - |
//! | Cylindrical* | coefficient | - |
//! | MultipleCorners | corner factor | - |
//! | Waves*, BlockWaves*, CircularWaves* | amplitude | frequency |
//! | Tile | random jitter | 210 − tile size |
//! | Neon / FindEdges | intensity | border width |

pub mod edges;
pub mod radial;
pub mod waves;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buffer::PixelBuffer;
use crate::error::{FilterError, FilterResult};
use crate::sample::sample;
use crate::task::{Filter, Progress};

pub use edges::edges;
pub use radial::{circular_waves, cylindrical, fisheye, multiple_corners, polar, twirl, CircularWaves};
pub use waves::{block_waves, tile, waves};

/// Distortion effect selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistortionEffect {
    #[default]
    FishEye,
    Twirl,
    CylindricalHorizontal,
    CylindricalVertical,
    CylindricalBoth,
    Caricature,
    MultipleCorners,
    WavesHorizontal,
    WavesVertical,
    BlockWaves1,
    BlockWaves2,
    CircularWaves1,
    CircularWaves2,
    PolarCoordinates,
    UnpolarCoordinates,
    Tile,
    Neon,
    FindEdges,
}

impl DistortionEffect {
    pub const ALL: [DistortionEffect; 18] = [
        DistortionEffect::FishEye,
        DistortionEffect::Twirl,
        DistortionEffect::CylindricalHorizontal,
        DistortionEffect::CylindricalVertical,
        DistortionEffect::CylindricalBoth,
        DistortionEffect::Caricature,
        DistortionEffect::MultipleCorners,
        DistortionEffect::WavesHorizontal,
        DistortionEffect::WavesVertical,
        DistortionEffect::BlockWaves1,
        DistortionEffect::BlockWaves2,
        DistortionEffect::CircularWaves1,
        DistortionEffect::CircularWaves2,
        DistortionEffect::PolarCoordinates,
        DistortionEffect::UnpolarCoordinates,
        DistortionEffect::Tile,
        DistortionEffect::Neon,
        DistortionEffect::FindEdges,
    ];

    /// Stable name, identical to the serde representation.
    pub fn name(self) -> &'static str {
        match self {
            DistortionEffect::FishEye => "fish-eye",
            DistortionEffect::Twirl => "twirl",
            DistortionEffect::CylindricalHorizontal => "cylindrical-horizontal",
            DistortionEffect::CylindricalVertical => "cylindrical-vertical",
            DistortionEffect::CylindricalBoth => "cylindrical-both",
            DistortionEffect::Caricature => "caricature",
            DistortionEffect::MultipleCorners => "multiple-corners",
            DistortionEffect::WavesHorizontal => "waves-horizontal",
            DistortionEffect::WavesVertical => "waves-vertical",
            DistortionEffect::BlockWaves1 => "block-waves1",
            DistortionEffect::BlockWaves2 => "block-waves2",
            DistortionEffect::CircularWaves1 => "circular-waves1",
            DistortionEffect::CircularWaves2 => "circular-waves2",
            DistortionEffect::PolarCoordinates => "polar-coordinates",
            DistortionEffect::UnpolarCoordinates => "unpolar-coordinates",
            DistortionEffect::Tile => "tile",
            DistortionEffect::Neon => "neon",
            DistortionEffect::FindEdges => "find-edges",
        }
    }
}

impl fmt::Display for DistortionEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DistortionEffect {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DistortionEffect::ALL
            .iter()
            .copied()
            .find(|e| e.name() == s)
            .ok_or_else(|| FilterError::InvalidSettings(format!("unknown distortion effect {:?}", s)))
    }
}

/// Parameters for one distortion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistortionParams {
    pub effect: DistortionEffect,
    pub level: i32,
    pub iteration: i32,
    /// Bilinear sampling instead of nearest pixel
    pub antialias: bool,
    /// Random seed for the Tile effect
    pub seed: u64,
}

impl Default for DistortionParams {
    fn default() -> Self {
        Self {
            effect: DistortionEffect::FishEye,
            level: 50,
            iteration: 10,
            antialias: true,
            seed: 0,
        }
    }
}

impl DistortionParams {
    pub fn new(effect: DistortionEffect, level: i32, iteration: i32) -> Self {
        Self {
            effect,
            level,
            iteration,
            ..Self::default()
        }
    }
}

/// Apply one distortion effect.
///
/// # Arguments
/// * `src` - Source pixels, never modified
/// * `params` - Effect selector and knobs
/// * `progress` - Cancellation and progress, checked once per row
///
/// # Returns
/// A new buffer of the same size and layout as `src`.
pub fn apply_distortion(
    src: &PixelBuffer,
    params: &DistortionParams,
    progress: &mut Progress<'_>,
) -> FilterResult<PixelBuffer> {
    debug!(
        width = src.width(),
        height = src.height(),
        effect = %params.effect,
        level = params.level,
        iteration = params.iteration,
        "distortion"
    );

    if src.is_empty() {
        return Ok(src.clone());
    }

    let l = params.level as f64;
    let f = params.iteration as f64;
    let aa = params.antialias;

    match params.effect {
        DistortionEffect::FishEye => fisheye(src, l / 5.0, aa, progress),
        DistortionEffect::Twirl => twirl(src, l, aa, progress),
        DistortionEffect::CylindricalHorizontal => cylindrical(src, l, true, false, aa, progress),
        DistortionEffect::CylindricalVertical => cylindrical(src, l, false, true, aa, progress),
        DistortionEffect::CylindricalBoth => cylindrical(src, l, true, true, aa, progress),
        DistortionEffect::Caricature => fisheye(src, -l / 5.0, aa, progress),
        DistortionEffect::MultipleCorners => multiple_corners(src, l, aa, progress),
        DistortionEffect::WavesHorizontal => {
            waves(src, params.level, params.iteration, true, true, progress)
        }
        DistortionEffect::WavesVertical => {
            waves(src, params.level, params.iteration, true, false, progress)
        }
        DistortionEffect::BlockWaves1 => {
            block_waves(src, params.level, params.iteration, false, progress)
        }
        DistortionEffect::BlockWaves2 => {
            block_waves(src, params.level, params.iteration, true, progress)
        }
        DistortionEffect::CircularWaves1 => {
            let wave = CircularWaves::centered(src, l, f, 0.0, false);
            circular_waves(src, &wave, aa, progress)
        }
        DistortionEffect::CircularWaves2 => {
            let wave = CircularWaves::centered(src, l, f, 25.0, true);
            circular_waves(src, &wave, aa, progress)
        }
        DistortionEffect::PolarCoordinates => polar(src, true, aa, progress),
        DistortionEffect::UnpolarCoordinates => polar(src, false, aa, progress),
        DistortionEffect::Tile => {
            let size = 210 - params.iteration;
            tile(src, size, size, params.level, params.seed, progress)
        }
        DistortionEffect::Neon => edges(src, params.level, params.iteration, false, progress),
        DistortionEffect::FindEdges => edges(src, params.level, params.iteration, true, progress),
    }
}

/// Inverse-map every destination pixel through `map`.
///
/// `map` returns the source position for (x, y), or `None` to keep the
/// source pixel unchanged.
pub(crate) fn remap<F>(
    src: &PixelBuffer,
    antialias: bool,
    progress: &mut Progress<'_>,
    map: F,
) -> FilterResult<PixelBuffer>
where
    F: Fn(f64, f64) -> Option<(f64, f64)>,
{
    let mut out = src.clone();
    let height = src.height();

    for y in 0..height {
        progress.check()?;
        for x in 0..src.width() {
            if let Some((sx, sy)) = map(x as f64, y as f64) {
                out.set_pixel(x, y, sample(src, sx, sy, antialias));
            }
        }
        progress.update(y as u64 + 1, height as u64);
    }

    Ok(out)
}

/// Center and aspect correction shared by the radial effects.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Geometry {
    pub half_w: f64,
    pub half_h: f64,
    pub x_scale: f64,
    pub y_scale: f64,
    /// Half of the longer side
    pub radius: f64,
}

impl Geometry {
    pub fn new(width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        let (x_scale, y_scale) = if width > height {
            (1.0, w / h)
        } else if height > width {
            (h / w, 1.0)
        } else {
            (1.0, 1.0)
        };
        Self {
            half_w: (width / 2) as f64,
            half_h: (height / 2) as f64,
            x_scale,
            y_scale,
            radius: w.max(h) / 2.0,
        }
    }
}

/// Distortion as a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistortionFilter {
    pub params: DistortionParams,
}

impl DistortionFilter {
    pub fn new(params: DistortionParams) -> Self {
        Self { params }
    }
}

impl Filter for DistortionFilter {
    fn name(&self) -> &'static str {
        self.params.effect.name()
    }

    fn apply(&self, src: &PixelBuffer, progress: &mut Progress<'_>) -> FilterResult<PixelBuffer> {
        apply_distortion(src, &self.params, progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{BitDepth, Pixel};
    use crate::task::{CancelToken, FilterOutcome, FilterTask};

    /// Image with a distinct value at every position.
    pub(crate) fn pattern_image(width: u32, height: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::blank(width, height, BitDepth::Eight, true);
        for y in 0..height {
            for x in 0..width {
                let v = ((x * 7 + y * 13) % 256) as u16;
                buf.set_pixel(x, y, Pixel::new(v, 255 - v, (x * 3 % 256) as u16, 255));
            }
        }
        buf
    }

    #[test]
    fn test_zero_level_is_identity() {
        let src = pattern_image(17, 11);
        let identity_at_zero = [
            DistortionEffect::FishEye,
            DistortionEffect::Twirl,
            DistortionEffect::CylindricalHorizontal,
            DistortionEffect::CylindricalVertical,
            DistortionEffect::CylindricalBoth,
            DistortionEffect::Caricature,
            DistortionEffect::MultipleCorners,
            DistortionEffect::WavesHorizontal,
            DistortionEffect::WavesVertical,
            DistortionEffect::BlockWaves1,
            DistortionEffect::BlockWaves2,
            DistortionEffect::CircularWaves1,
            DistortionEffect::CircularWaves2,
            DistortionEffect::Tile,
        ];
        for effect in identity_at_zero {
            for antialias in [false, true] {
                let params = DistortionParams {
                    effect,
                    level: 0,
                    iteration: 10,
                    antialias,
                    seed: 3,
                };
                let out = apply_distortion(&src, &params, &mut Progress::unobserved()).unwrap();
                assert_eq!(out, src, "{} (antialias={}) is not a no-op", effect, antialias);
            }
        }
    }

    #[test]
    fn test_every_effect_preserves_layout() {
        let src = pattern_image(20, 14);
        for effect in DistortionEffect::ALL {
            let params = DistortionParams::new(effect, 30, 20);
            let out = apply_distortion(&src, &params, &mut Progress::unobserved()).unwrap();
            assert!(out.same_layout(&src), "{} changed the layout", effect);
        }
    }

    #[test]
    fn test_sixteen_bit_buffers() {
        let mut src = PixelBuffer::blank(9, 9, BitDepth::Sixteen, false);
        for y in 0..9 {
            for x in 0..9 {
                src.set_pixel(x, y, Pixel::new(x as u16 * 7000, y as u16 * 7000, 1, 65535));
            }
        }
        for effect in DistortionEffect::ALL {
            let out = apply_distortion(
                &src,
                &DistortionParams::new(effect, 40, 5),
                &mut Progress::unobserved(),
            )
            .unwrap();
            assert!(out.same_layout(&src));
        }
    }

    #[test]
    fn test_empty_buffer() {
        let src = PixelBuffer::blank(0, 5, BitDepth::Eight, true);
        let out = apply_distortion(&src, &DistortionParams::default(), &mut Progress::unobserved())
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_cancelled_before_first_row() {
        let token = CancelToken::new();
        token.cancel();
        let mut progress = Progress::with_cancel(token);
        let result = apply_distortion(&pattern_image(8, 8), &DistortionParams::default(), &mut progress);
        assert!(matches!(result, Err(FilterError::Cancelled)));
    }

    #[test]
    fn test_filter_task_reports_progress() {
        let params = DistortionParams::new(DistortionEffect::Twirl, 40, 0);
        let mut task = FilterTask::new(pattern_image(16, 16), DistortionFilter::new(params));
        assert!(matches!(task.run(), FilterOutcome::Completed(_)));
        assert_eq!(task.progress(), 100);
    }

    #[test]
    fn test_effect_names_round_trip() {
        for effect in DistortionEffect::ALL {
            assert_eq!(effect.name().parse::<DistortionEffect>().unwrap(), effect);
        }
        assert!("sepia".parse::<DistortionEffect>().is_err());
    }

    #[test]
    fn test_params_serialize_by_effect_name() {
        let params = DistortionParams {
            effect: DistortionEffect::Tile,
            level: 12,
            iteration: 170,
            antialias: false,
            seed: 99,
        };
        let text = serde_yaml::to_string(&params).unwrap();
        assert!(text.contains("effect: tile"));
        assert_eq!(serde_yaml::from_str::<DistortionParams>(&text).unwrap(), params);

        for effect in DistortionEffect::ALL {
            let yaml = serde_yaml::to_string(&effect).unwrap();
            assert_eq!(yaml.trim(), effect.name());
        }
    }

    #[test]
    fn test_geometry_aspect_scales() {
        let wide = Geometry::new(200, 100);
        assert_eq!(wide.y_scale, 2.0);
        assert_eq!(wide.x_scale, 1.0);
        assert_eq!(wide.radius, 100.0);

        let tall = Geometry::new(50, 100);
        assert_eq!(tall.x_scale, 2.0);
        assert_eq!(tall.half_w, 25.0);
    }
}
