//! pixfx Core - pixel-level image transformation library
//!
//! This crate provides levels adjustment, geometric distortion effects,
//! perspective warping, and border compositing over raw 8/16-bit pixel
//! buffers, all driven through a cancellable, progress-reporting task.

pub mod border;
pub mod buffer;
pub mod config;
pub mod distortion;
pub mod error;
pub mod histogram;
pub mod levels;
pub mod sample;
pub mod task;
pub mod transform;

pub use border::{
    apply_border, bevel, niepce, pattern, solid, BorderFilter, BorderParameters, BorderPattern,
    BorderStyle, PatternDirectory, PatternSource,
};
pub use buffer::{BitDepth, Pixel, PixelBuffer, Rgba8};
pub use config::FilterConfig;
pub use distortion::{apply_distortion, DistortionEffect, DistortionFilter, DistortionParams};
pub use error::{FilterError, FilterResult};
pub use histogram::compute_histogram;
pub use levels::{auto_levels, ChannelLevels, ChannelLut, LevelsFilter, LevelsLut, LevelsParameters};
pub use task::{CancelToken, Filter, FilterOutcome, FilterTask, NoopSink, Progress, ProgressSink};
pub use transform::{
    apply_perspective, new_center, warp_perspective, Matrix3, PerspectiveFilter,
    PerspectiveParams, Point, Quad, SourceRect,
};

/// Channel selector for levels adjustments and histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Channel {
    /// Applies to R, G and B after their own tables.
    Luminosity,
    Red,
    Green,
    Blue,
    Alpha,
}

impl Channel {
    /// Every channel, in preset file order.
    pub const ALL: [Channel; 5] = [
        Channel::Luminosity,
        Channel::Red,
        Channel::Green,
        Channel::Blue,
        Channel::Alpha,
    ];

    /// Position of this channel in [`Channel::ALL`].
    pub fn index(self) -> usize {
        match self {
            Channel::Luminosity => 0,
            Channel::Red => 1,
            Channel::Green => 2,
            Channel::Blue => 3,
            Channel::Alpha => 4,
        }
    }
}

/// Histogram data for an image
///
/// Each channel has one bin per sample value of the buffer's depth.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub depth: BitDepth,
    /// Luminosity histogram (BT.709)
    pub luminosity: Vec<u32>,
    pub red: Vec<u32>,
    pub green: Vec<u32>,
    pub blue: Vec<u32>,
    pub alpha: Vec<u32>,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new(BitDepth::Eight)
    }
}

impl Histogram {
    /// Create a new empty histogram
    pub fn new(depth: BitDepth) -> Self {
        let bins = depth.lut_size();
        Self {
            depth,
            luminosity: vec![0; bins],
            red: vec![0; bins],
            green: vec![0; bins],
            blue: vec![0; bins],
            alpha: vec![0; bins],
        }
    }

    /// Bins for one channel.
    pub fn channel(&self, channel: Channel) -> &[u32] {
        match channel {
            Channel::Luminosity => &self.luminosity,
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
            Channel::Alpha => &self.alpha,
        }
    }

    /// Number of samples counted (pixels in the source image).
    pub fn total(&self) -> u64 {
        self.red.iter().map(|&c| c as u64).sum()
    }

    /// Find the maximum value across all channels for normalization
    pub fn max_value(&self) -> u32 {
        let max_r = self.red.iter().copied().max().unwrap_or(0);
        let max_g = self.green.iter().copied().max().unwrap_or(0);
        let max_b = self.blue.iter().copied().max().unwrap_or(0);
        max_r.max(max_g).max(max_b)
    }

    /// Check for highlight clipping (values at the depth maximum)
    pub fn has_highlight_clipping(&self) -> bool {
        let top = self.depth.max_value() as usize;
        self.red[top] > 0 || self.green[top] > 0 || self.blue[top] > 0
    }

    /// Check for shadow clipping (values at 0)
    pub fn has_shadow_clipping(&self) -> bool {
        self.red[0] > 0 || self.green[0] > 0 || self.blue[0] > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_index_matches_all() {
        for (i, ch) in Channel::ALL.iter().enumerate() {
            assert_eq!(ch.index(), i);
        }
    }

    #[test]
    fn test_histogram_bins_follow_depth() {
        assert_eq!(Histogram::new(BitDepth::Eight).red.len(), 256);
        assert_eq!(Histogram::new(BitDepth::Sixteen).alpha.len(), 65536);
    }

    #[test]
    fn test_histogram_clipping() {
        let mut hist = Histogram::new(BitDepth::Eight);
        assert!(!hist.has_highlight_clipping());
        assert!(!hist.has_shadow_clipping());

        hist.red[255] = 100;
        assert!(hist.has_highlight_clipping());

        hist.blue[0] = 50;
        assert!(hist.has_shadow_clipping());
    }

    #[test]
    fn test_histogram_channel_accessor() {
        let mut hist = Histogram::default();
        hist.green[10] = 3;
        assert_eq!(hist.channel(Channel::Green)[10], 3);
        assert_eq!(hist.channel(Channel::Red)[10], 0);
    }
}
