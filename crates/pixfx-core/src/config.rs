//! Saved filter parameters.
//!
//! Distortion and border parameters persist as one YAML document:
//!
//! ```yaml
//! distortion:
//!   effect: twirl
//!   level: 60
//! border:
//!   style: beveled
//!   width: 40
//! ```
//!
//! Missing sections and fields take their defaults. Border colors and line
//! widths default per style, so `style: niepce` alone yields a white band
//! with a black line.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::border::BorderParameters;
use crate::distortion::DistortionParams;
use crate::error::{FilterError, FilterResult};

/// Every persisted filter parameter group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub distortion: DistortionParams,
    pub border: BorderParameters,
}

impl FilterConfig {
    /// Parse a YAML document.
    pub fn from_yaml(text: &str) -> FilterResult<Self> {
        serde_yaml::from_str(text).map_err(|e| FilterError::InvalidSettings(e.to_string()))
    }

    pub fn to_yaml(&self) -> FilterResult<String> {
        serde_yaml::to_string(self).map_err(|e| FilterError::InvalidSettings(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> FilterResult<Self> {
        let path = path.as_ref();
        let config = Self::from_yaml(&std::fs::read_to_string(path)?)?;
        debug!(path = %path.display(), "filter config loaded");
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> FilterResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_yaml()?)?;
        debug!(path = %path.display(), "filter config saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::border::{BorderPattern, BorderStyle};
    use crate::buffer::Rgba8;
    use crate::distortion::DistortionEffect;
    use std::path::PathBuf;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(FilterConfig::from_yaml("{}").unwrap(), FilterConfig::default());
    }

    #[test]
    fn test_partial_distortion() {
        let config = FilterConfig::from_yaml("distortion:\n  effect: tile\n  seed: 99\n").unwrap();
        assert_eq!(config.distortion.effect, DistortionEffect::Tile);
        assert_eq!(config.distortion.seed, 99);
        assert_eq!(config.distortion.level, DistortionParams::default().level);
        assert_eq!(config.border, BorderParameters::default());
    }

    #[test]
    fn test_border_defaults_follow_style() {
        let config = FilterConfig::from_yaml("border:\n  style: beveled\n  width: 7\n").unwrap();
        assert_eq!(config.border.width, 7);
        assert_eq!(config.border.first_color, Rgba8::opaque(192, 192, 192));
        assert_eq!(config.border.second_color, Rgba8::opaque(128, 128, 128));

        let niepce = FilterConfig::from_yaml("border:\n  style: niepce\n").unwrap();
        assert_eq!(niepce.border, BorderParameters::for_style(BorderStyle::Niepce));
    }

    #[test]
    fn test_round_trip() {
        let mut config = FilterConfig::default();
        config.distortion.effect = DistortionEffect::CircularWaves2;
        config.distortion.antialias = false;
        config.border = BorderParameters::for_style(BorderStyle::Pattern(BorderPattern::Granite));
        config.border.second_color = Rgba8::new(1, 2, 3, 4);
        config.border.pattern_path = Some(PathBuf::from("/tmp/tiles/granit.png"));

        let text = config.to_yaml().unwrap();
        assert!(text.contains("circular-waves2"));
        assert_eq!(FilterConfig::from_yaml(&text).unwrap(), config);
    }

    #[test]
    fn test_rejects_unknown_values() {
        let bad_style = FilterConfig::from_yaml("border:\n  style: velvet\n");
        assert!(matches!(bad_style, Err(FilterError::InvalidSettings(_))));
        let bad_level = FilterConfig::from_yaml("distortion:\n  level: lots\n");
        assert!(matches!(bad_level, Err(FilterError::InvalidSettings(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters.yml");
        let mut config = FilterConfig::default();
        config.border.width = 12;
        config.save(&path).unwrap();
        assert_eq!(FilterConfig::load(&path).unwrap(), config);

        assert!(matches!(
            FilterConfig::load(dir.path().join("missing.yml")),
            Err(FilterError::Io(_))
        ));
    }
}
