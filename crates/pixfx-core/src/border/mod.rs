//! Border compositing.
//!
//! Every border grows the canvas by its width on each side and places the
//! source unchanged at the center. Pattern borders need a texture tile,
//! supplied through a [`PatternSource`].

pub mod frame;
pub mod pattern;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::buffer::{PixelBuffer, Rgba8};
use crate::error::{FilterError, FilterResult};
use crate::task::{Filter, Progress};

pub use frame::{bevel, niepce, solid};
pub use pattern::{decode_pattern, load_pattern_file, pattern, PatternDirectory, PatternSource};

// =============================================================================
// Styles
// =============================================================================

/// Named texture for pattern borders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BorderPattern {
    Pine,
    Wood,
    Paper,
    Parque,
    Ice,
    Leaf,
    Marble,
    Rain,
    Craters,
    Dried,
    Pink,
    Stone,
    Chalk,
    Granite,
    Rock,
    Wall,
}

impl BorderPattern {
    pub const ALL: [BorderPattern; 16] = [
        BorderPattern::Pine,
        BorderPattern::Wood,
        BorderPattern::Paper,
        BorderPattern::Parque,
        BorderPattern::Ice,
        BorderPattern::Leaf,
        BorderPattern::Marble,
        BorderPattern::Rain,
        BorderPattern::Craters,
        BorderPattern::Dried,
        BorderPattern::Pink,
        BorderPattern::Stone,
        BorderPattern::Chalk,
        BorderPattern::Granite,
        BorderPattern::Rock,
        BorderPattern::Wall,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BorderPattern::Pine => "pine",
            BorderPattern::Wood => "wood",
            BorderPattern::Paper => "paper",
            BorderPattern::Parque => "parque",
            BorderPattern::Ice => "ice",
            BorderPattern::Leaf => "leaf",
            BorderPattern::Marble => "marble",
            BorderPattern::Rain => "rain",
            BorderPattern::Craters => "craters",
            BorderPattern::Dried => "dried",
            BorderPattern::Pink => "pink",
            BorderPattern::Stone => "stone",
            BorderPattern::Chalk => "chalk",
            BorderPattern::Granite => "granite",
            BorderPattern::Rock => "rock",
            BorderPattern::Wall => "wall",
        }
    }

    /// Tile file name, e.g. `wood-pattern.png`.
    pub fn file_name(self) -> String {
        // The granite texture ships under its historical short name.
        let stem = match self {
            BorderPattern::Granite => "granit",
            other => other.name(),
        };
        format!("{}-pattern.png", stem)
    }
}

/// Kind of border to draw.
///
/// Serialized by name, e.g. `beveled` or `granite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BorderStyle {
    #[default]
    Solid,
    Niepce,
    Beveled,
    Pattern(BorderPattern),
}

impl fmt::Display for BorderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BorderStyle::Solid => f.write_str("solid"),
            BorderStyle::Niepce => f.write_str("niepce"),
            BorderStyle::Beveled => f.write_str("beveled"),
            BorderStyle::Pattern(p) => f.write_str(p.name()),
        }
    }
}

impl FromStr for BorderStyle {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solid" => Ok(BorderStyle::Solid),
            "niepce" => Ok(BorderStyle::Niepce),
            "beveled" => Ok(BorderStyle::Beveled),
            other => BorderPattern::ALL
                .iter()
                .copied()
                .find(|p| p.name() == other)
                .map(BorderStyle::Pattern)
                .ok_or_else(|| FilterError::InvalidSettings(format!("unknown border style {:?}", s))),
        }
    }
}

impl TryFrom<String> for BorderStyle {
    type Error = FilterError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl From<BorderStyle> for String {
    fn from(style: BorderStyle) -> Self {
        style.to_string()
    }
}

// =============================================================================
// Parameters
// =============================================================================

/// Border settings.
///
/// How the two colors and line widths are used depends on the style:
///
/// | style | first color | second color | second width |
/// |---|---|---|---|
/// | Solid | band | - | - |
/// | Niepce | outer band | line around the image | line width |
/// | Beveled | top and left | bottom and right | - |
/// | Pattern | outer line | line around the image | inner line width |
///
/// `first_width` is only used by pattern borders.
///
/// When deserialized, fields left out take the defaults of the given
/// style (see [`BorderParameters::for_style`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BorderFields")]
pub struct BorderParameters {
    pub style: BorderStyle,
    pub width: u32,
    pub first_color: Rgba8,
    pub second_color: Rgba8,
    pub first_width: u32,
    pub second_width: u32,
    /// Tile image that replaces the pattern source's texture.
    pub pattern_path: Option<PathBuf>,
}

impl Default for BorderParameters {
    fn default() -> Self {
        Self::for_style(BorderStyle::Solid)
    }
}

impl BorderParameters {
    /// Default colors and widths for `style`.
    pub fn for_style(style: BorderStyle) -> Self {
        let (first_color, second_color) = match style {
            BorderStyle::Solid | BorderStyle::Pattern(_) => (Rgba8::BLACK, Rgba8::BLACK),
            BorderStyle::Niepce => (Rgba8::WHITE, Rgba8::BLACK),
            BorderStyle::Beveled => (Rgba8::opaque(192, 192, 192), Rgba8::opaque(128, 128, 128)),
        };
        let second_width = match style {
            BorderStyle::Niepce => 10,
            _ => 15,
        };
        Self {
            style,
            width: 100,
            first_color,
            second_color,
            first_width: 15,
            second_width,
            pattern_path: None,
        }
    }
}

/// Serialized form of [`BorderParameters`] before style defaults apply.
#[derive(Default, Deserialize)]
#[serde(default)]
struct BorderFields {
    style: BorderStyle,
    width: Option<u32>,
    first_color: Option<Rgba8>,
    second_color: Option<Rgba8>,
    first_width: Option<u32>,
    second_width: Option<u32>,
    pattern_path: Option<PathBuf>,
}

impl From<BorderFields> for BorderParameters {
    fn from(fields: BorderFields) -> Self {
        let defaults = Self::for_style(fields.style);
        Self {
            style: fields.style,
            width: fields.width.unwrap_or(defaults.width),
            first_color: fields.first_color.unwrap_or(defaults.first_color),
            second_color: fields.second_color.unwrap_or(defaults.second_color),
            first_width: fields.first_width.unwrap_or(defaults.first_width),
            second_width: fields.second_width.unwrap_or(defaults.second_width),
            pattern_path: fields.pattern_path,
        }
    }
}

// =============================================================================
// Compositing
// =============================================================================

/// Draw the border described by `params` around `src`.
///
/// # Arguments
/// * `src` - Source pixels, never modified
/// * `params` - Style, colors and widths
/// * `patterns` - Tile loader, consulted for pattern styles only
/// * `progress` - Checked and advanced once per output row
///
/// # Returns
/// A new buffer larger than `src` on every side.
///
/// # Errors
/// `ResourceUnavailable` when a pattern tile cannot be loaded, `Cancelled`
/// when `progress` is cancelled before the last row.
pub fn apply_border(
    src: &PixelBuffer,
    params: &BorderParameters,
    patterns: &dyn PatternSource,
    progress: &mut Progress<'_>,
) -> FilterResult<PixelBuffer> {
    debug!(
        width = src.width(),
        height = src.height(),
        style = %params.style,
        border = params.width,
        "border"
    );

    match params.style {
        BorderStyle::Solid => solid(src, params.first_color, params.width, progress),
        BorderStyle::Niepce => niepce(
            src,
            params.first_color,
            params.width,
            params.second_color,
            params.second_width,
            progress,
        ),
        BorderStyle::Beveled => {
            bevel(src, params.first_color, params.second_color, params.width, progress)
        }
        BorderStyle::Pattern(name) => {
            let tile = match &params.pattern_path {
                Some(path) => load_pattern_file(path)?,
                None => patterns.load(name)?,
            };
            pattern(
                src,
                &tile,
                params.width,
                params.first_color,
                params.first_width,
                params.second_color,
                params.second_width,
                progress,
            )
        }
    }
}

/// Border as a [`Filter`].
///
/// A pattern tile that cannot be loaded turns the run into a no-op that
/// returns the source unchanged.
pub struct BorderFilter {
    pub params: BorderParameters,
    patterns: Box<dyn PatternSource>,
}

impl BorderFilter {
    pub fn new(params: BorderParameters, patterns: impl PatternSource + 'static) -> Self {
        Self {
            params,
            patterns: Box::new(patterns),
        }
    }
}

impl Filter for BorderFilter {
    fn name(&self) -> &'static str {
        "border"
    }

    fn apply(&self, src: &PixelBuffer, progress: &mut Progress<'_>) -> FilterResult<PixelBuffer> {
        progress.check()?;
        match apply_border(src, &self.params, self.patterns.as_ref(), progress) {
            Err(FilterError::ResourceUnavailable(reason)) => {
                warn!(style = %self.params.style, %reason, "pattern tile unavailable, border skipped");
                progress.update(1, 1);
                Ok(src.clone())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{BitDepth, Pixel};
    use crate::task::{CancelToken, FilterOutcome, FilterTask};
    use image::{Rgba, RgbaImage};
    use std::sync::{Arc, Mutex};

    fn quiet() -> Progress<'static> {
        Progress::unobserved()
    }

    fn black(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::filled(width, height, BitDepth::Eight, true, Pixel::new(0, 0, 0, 255))
    }

    /// A source with no tiles at all.
    struct NoPatterns;

    impl PatternSource for NoPatterns {
        fn load(&self, pattern: BorderPattern) -> FilterResult<RgbaImage> {
            Err(FilterError::ResourceUnavailable(pattern.file_name()))
        }
    }

    #[test]
    fn test_style_names_round_trip() {
        for style in [BorderStyle::Solid, BorderStyle::Niepce, BorderStyle::Beveled]
            .into_iter()
            .chain(BorderPattern::ALL.into_iter().map(BorderStyle::Pattern))
        {
            assert_eq!(style.to_string().parse::<BorderStyle>().unwrap(), style);
        }
        assert!("granit".parse::<BorderStyle>().is_err());
        assert_eq!(BorderPattern::Wall.file_name(), "wall-pattern.png");
    }

    #[test]
    fn test_solid_border_dimensions() {
        let mut params = BorderParameters::for_style(BorderStyle::Solid);
        params.width = 2;
        params.first_color = Rgba8::opaque(255, 0, 0);
        let out = apply_border(&black(2, 2), &params, &NoPatterns, &mut quiet()).unwrap();
        assert_eq!((out.width(), out.height()), (6, 6));
        assert_eq!(out.pixel(0, 5), Pixel::new(255, 0, 0, 255));
        assert_eq!(out.pixel(2, 3), Pixel::new(0, 0, 0, 255));
    }

    #[test]
    fn test_every_style_grows_canvas() {
        let tile = RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255]));
        let src = black(7, 5);
        for style in [
            BorderStyle::Solid,
            BorderStyle::Beveled,
            BorderStyle::Pattern(BorderPattern::Marble),
        ] {
            let mut params = BorderParameters::for_style(style);
            params.width = 6;
            let out = apply_border(&src, &params, &tile, &mut quiet()).unwrap();
            assert_eq!((out.width(), out.height()), (19, 17), "{}", style);
            assert_eq!(out.pixel(6, 6), Pixel::new(0, 0, 0, 255));
        }

        let mut niepce = BorderParameters::for_style(BorderStyle::Niepce);
        niepce.width = 6;
        niepce.second_width = 2;
        let out = apply_border(&src, &niepce, &tile, &mut quiet()).unwrap();
        assert_eq!((out.width(), out.height()), (23, 21));
    }

    #[test]
    fn test_missing_tile_is_an_error() {
        let params = BorderParameters::for_style(BorderStyle::Pattern(BorderPattern::Pine));
        let result = apply_border(&black(3, 3), &params, &NoPatterns, &mut quiet());
        assert!(matches!(result, Err(FilterError::ResourceUnavailable(_))));
    }

    #[test]
    fn test_pattern_path_overrides_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.png");
        RgbaImage::from_pixel(2, 2, Rgba([40, 50, 60, 255])).save(&path).unwrap();

        let mut params = BorderParameters::for_style(BorderStyle::Pattern(BorderPattern::Ice));
        params.width = 4;
        params.first_width = 0;
        params.second_width = 0;
        params.pattern_path = Some(path);
        let out = apply_border(&black(2, 2), &params, &NoPatterns, &mut quiet()).unwrap();
        assert_eq!(out.pixel(0, 0), Pixel::new(40, 50, 60, 255));
    }

    #[test]
    fn test_filter_skips_unavailable_pattern() {
        let src = black(4, 3);
        let params = BorderParameters::for_style(BorderStyle::Pattern(BorderPattern::Rock));
        let mut task = FilterTask::new(src.clone(), BorderFilter::new(params, NoPatterns));
        match task.run() {
            FilterOutcome::Completed(out) => assert_eq!(out, src),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(task.progress(), 100);
    }

    #[test]
    fn test_filter_draws_border() {
        let mut params = BorderParameters::for_style(BorderStyle::Beveled);
        params.width = 3;
        let filter = BorderFilter::new(params, NoPatterns);
        let out = FilterTask::new(black(4, 4), filter).run().into_result().unwrap();
        assert_eq!((out.width(), out.height()), (10, 10));
        assert_eq!(out.pixel(0, 0), Pixel::new(192, 192, 192, 255));
    }

    #[test]
    fn test_filter_reports_rows_and_cancels() {
        let mut params = BorderParameters::for_style(BorderStyle::Beveled);
        params.width = 3;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let filter = BorderFilter::new(params.clone(), NoPatterns);
        let outcome = FilterTask::new(black(50, 400), filter)
            .with_sink(move |p: u8| recorder.lock().unwrap().push(p))
            .run();
        assert!(outcome.is_success());
        let expected: Vec<u8> = (1..=20).map(|i| i * 5).collect();
        assert_eq!(*seen.lock().unwrap(), expected);

        let token = CancelToken::new();
        let trigger = token.clone();
        let filter = BorderFilter::new(params, NoPatterns);
        let mut task = FilterTask::new(black(50, 400), filter)
            .with_cancel_token(token)
            .with_sink(move |p: u8| {
                if p >= 50 {
                    trigger.cancel();
                }
            });
        assert!(matches!(task.run(), FilterOutcome::Cancelled));
        assert_eq!(task.progress(), 50);
    }

    #[test]
    fn test_parameters_deserialize_with_style_defaults() {
        let params: BorderParameters = serde_yaml::from_str("style: beveled\nwidth: 7\n").unwrap();
        assert_eq!(params.width, 7);
        assert_eq!(params.first_color, Rgba8::opaque(192, 192, 192));
        assert_eq!(params.second_width, 15);

        let niepce: BorderParameters = serde_yaml::from_str("style: niepce\n").unwrap();
        assert_eq!(niepce, BorderParameters::for_style(BorderStyle::Niepce));

        let granite = BorderStyle::Pattern(BorderPattern::Granite);
        assert_eq!(serde_yaml::to_string(&granite).unwrap().trim(), "granite");
        assert!(serde_yaml::from_str::<BorderParameters>("style: velvet\n").is_err());
    }
}
