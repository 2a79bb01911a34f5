//! Levels preset files.
//!
//! A preset is plain text: a header line, the bit depth, then five values
//! per channel (low input, high input, gamma, low output, high output) for
//! Luminosity, Red, Green, Blue and Alpha in that order.
//!
//! ```text
//! # Levels Configuration File
//! 8
//! 0
//! 255
//! 1
//! 0
//! 255
//! ...
//! ```

use std::path::Path;

use tracing::debug;

use super::{ChannelLevels, LevelsParameters};
use crate::buffer::BitDepth;
use crate::error::{FilterError, FilterResult};
use crate::Channel;

/// First line of every preset file.
pub const PRESET_HEADER: &str = "# Levels Configuration File";

const VALUES_PER_CHANNEL: usize = 5;

/// Parse preset text into validated parameters.
pub fn parse_preset(text: &str) -> FilterResult<LevelsParameters> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    match lines.next() {
        Some(PRESET_HEADER) => {}
        Some(other) => {
            return Err(FilterError::InvalidSettings(format!(
                "unexpected preset header {:?}",
                other
            )))
        }
        None => return Err(FilterError::InvalidSettings("empty preset".to_string())),
    }

    let depth_line = lines
        .next()
        .ok_or_else(|| FilterError::InvalidSettings("missing bit depth".to_string()))?;
    let depth = depth_line
        .parse::<u32>()
        .ok()
        .and_then(BitDepth::from_bits)
        .ok_or_else(|| {
            FilterError::InvalidSettings(format!("invalid bit depth {:?}", depth_line))
        })?;

    let values: Vec<&str> = lines.collect();
    let expected = Channel::ALL.len() * VALUES_PER_CHANNEL;
    if values.len() != expected {
        return Err(FilterError::InvalidSettings(format!(
            "expected {} values, found {}",
            expected,
            values.len()
        )));
    }

    let mut params = LevelsParameters::new(depth);
    for (channel, chunk) in Channel::ALL.iter().zip(values.chunks_exact(VALUES_PER_CHANNEL)) {
        *params.channel_mut(*channel) = ChannelLevels {
            low_input: parse_sample(chunk[0])?,
            high_input: parse_sample(chunk[1])?,
            gamma: parse_gamma(chunk[2])?,
            low_output: parse_sample(chunk[3])?,
            high_output: parse_sample(chunk[4])?,
        };
    }

    params
        .validate()
        .map_err(|e| FilterError::InvalidSettings(e.to_string()))?;
    Ok(params)
}

/// Render parameters as preset text.
pub fn format_preset(params: &LevelsParameters) -> String {
    let mut out = String::new();
    out.push_str(PRESET_HEADER);
    out.push('\n');
    out.push_str(&params.depth.bits().to_string());
    out.push('\n');
    for channel in Channel::ALL {
        let c = params.channel(channel);
        out.push_str(&format!(
            "{}\n{}\n{}\n{}\n{}\n",
            c.low_input, c.high_input, c.gamma, c.low_output, c.high_output
        ));
    }
    out
}

/// Read a preset file.
pub fn load_preset(path: impl AsRef<Path>) -> FilterResult<LevelsParameters> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let params = parse_preset(&text)?;
    debug!(path = %path.display(), "levels preset loaded");
    Ok(params)
}

/// Write a preset file. Invalid parameters are rejected before writing.
pub fn save_preset(path: impl AsRef<Path>, params: &LevelsParameters) -> FilterResult<()> {
    params.validate()?;
    let path = path.as_ref();
    std::fs::write(path, format_preset(params))?;
    debug!(path = %path.display(), "levels preset saved");
    Ok(())
}

fn parse_sample(s: &str) -> FilterResult<u16> {
    s.parse::<u16>()
        .map_err(|_| FilterError::InvalidSettings(format!("invalid sample value {:?}", s)))
}

fn parse_gamma(s: &str) -> FilterResult<f64> {
    s.parse::<f64>()
        .map_err(|_| FilterError::InvalidSettings(format!("invalid gamma {:?}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_params() -> LevelsParameters {
        let mut params = LevelsParameters::new(BitDepth::Eight);
        params.set_low_input(Channel::Luminosity, 64);
        params.set_high_input(Channel::Luminosity, 192);
        params.set_gamma(Channel::Red, 0.75);
        params.set_high_output(Channel::Blue, 200);
        params
    }

    #[test]
    fn test_format_layout() {
        let text = format_preset(&LevelsParameters::new(BitDepth::Eight));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 27);
        assert_eq!(lines[0], PRESET_HEADER);
        assert_eq!(lines[1], "8");
        assert_eq!(&lines[2..7], &["0", "255", "1", "0", "255"]);
    }

    #[test]
    fn test_parse_formatted() {
        let params = sample_params();
        let parsed = parse_preset(&format_preset(&params)).unwrap();
        assert_eq!(parsed, params);
    }

    #[test]
    fn test_parse_sixteen_bit() {
        let params = LevelsParameters::new(BitDepth::Sixteen);
        let text = format_preset(&params);
        assert!(text.lines().nth(1) == Some("16"));
        assert_eq!(parse_preset(&text).unwrap().depth, BitDepth::Sixteen);
    }

    #[test]
    fn test_parse_rejects_bad_header() {
        let text = format_preset(&sample_params()).replace(PRESET_HEADER, "# Curves");
        assert!(matches!(parse_preset(&text), Err(FilterError::InvalidSettings(_))));
    }

    #[test]
    fn test_parse_rejects_wrong_count() {
        let mut text = format_preset(&sample_params());
        text.push_str("42\n");
        assert!(matches!(parse_preset(&text), Err(FilterError::InvalidSettings(_))));
        assert!(matches!(parse_preset(""), Err(FilterError::InvalidSettings(_))));
    }

    #[test]
    fn test_parse_rejects_garbage_and_ranges() {
        let text = format_preset(&sample_params()).replacen("192", "abc", 1);
        assert!(parse_preset(&text).is_err());

        // High input below low input.
        let text = format_preset(&sample_params()).replacen("192", "10", 1);
        assert!(matches!(parse_preset(&text), Err(FilterError::InvalidSettings(_))));

        let text = format_preset(&sample_params()).replacen("\n8\n", "\n12\n", 1);
        assert!(parse_preset(&text).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("levels.lev");
        let params = sample_params();
        save_preset(&path, &params).unwrap();
        assert_eq!(load_preset(&path).unwrap(), params);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_preset(dir.path().join("missing.lev"));
        assert!(matches!(result, Err(FilterError::Io(_))));
    }

    #[test]
    fn test_save_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let mut params = sample_params();
        params.set_gamma(Channel::Green, -1.0);
        let path = dir.path().join("bad.lev");
        assert!(matches!(save_preset(&path, &params), Err(FilterError::InvalidRange(_))));
        assert!(!path.exists());
    }
}
