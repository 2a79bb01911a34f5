//! Levels adjustment: per-channel black point, white point, gamma and
//! output range, compiled into lookup tables.
//!
//! Each color channel first goes through its own table, then through the
//! Luminosity table. Tables have one entry per sample value of the
//! buffer's bit depth, so 8-bit and 16-bit buffers follow the same math.
//!
//! Parameters store true bounds (`low_input < high_input`); any slider
//! inversion is left to the UI layer.

pub mod preset;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::buffer::{BitDepth, Pixel, PixelBuffer, Rgba8};
use crate::error::{FilterError, FilterResult};
use crate::task::{Filter, Progress};
use crate::{Channel, Histogram};

/// Smallest accepted gamma.
pub const MIN_GAMMA: f64 = 0.1;
/// Largest accepted gamma.
pub const MAX_GAMMA: f64 = 10.0;
/// Default fraction of samples ignored at each end by [`auto_levels`].
pub const DEFAULT_AUTO_CUTOFF: f64 = 0.005;

// =============================================================================
// Parameters
// =============================================================================

/// Levels settings for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelLevels {
    /// Input black point
    pub low_input: u16,
    /// Input white point
    pub high_input: u16,
    /// Exponent applied to the normalized input
    pub gamma: f64,
    /// Output black point
    pub low_output: u16,
    /// Output white point
    pub high_output: u16,
}

impl ChannelLevels {
    /// Settings that leave every sample unchanged.
    pub fn identity(depth: BitDepth) -> Self {
        let max = depth.max_value();
        Self {
            low_input: 0,
            high_input: max,
            gamma: 1.0,
            low_output: 0,
            high_output: max,
        }
    }

    pub fn is_identity(&self, depth: BitDepth) -> bool {
        *self == Self::identity(depth)
    }

    fn validate(&self, depth: BitDepth, channel: Channel) -> FilterResult<()> {
        let max = depth.max_value();
        let values = [
            ("low input", self.low_input),
            ("high input", self.high_input),
            ("low output", self.low_output),
            ("high output", self.high_output),
        ];
        for (name, value) in values {
            if value > max {
                return Err(FilterError::InvalidRange(format!(
                    "{:?} {} {} exceeds {}",
                    channel, name, value, max
                )));
            }
        }
        if self.high_input <= self.low_input {
            return Err(FilterError::InvalidRange(format!(
                "{:?} high input {} <= low input {}",
                channel, self.high_input, self.low_input
            )));
        }
        if self.low_output > self.high_output {
            return Err(FilterError::InvalidRange(format!(
                "{:?} low output {} > high output {}",
                channel, self.low_output, self.high_output
            )));
        }
        if !self.gamma.is_finite() || !(MIN_GAMMA..=MAX_GAMMA).contains(&self.gamma) {
            return Err(FilterError::InvalidRange(format!(
                "{:?} gamma {} outside [{}, {}]",
                channel, self.gamma, MIN_GAMMA, MAX_GAMMA
            )));
        }
        Ok(())
    }

    fn clamped(&self, depth: BitDepth) -> Self {
        let max = depth.max_value();
        let mut low_in = self.low_input.min(max);
        let mut high_in = self.high_input.min(max);
        if high_in < low_in {
            std::mem::swap(&mut low_in, &mut high_in);
        }
        if high_in == low_in {
            if high_in < max {
                high_in += 1;
            } else {
                low_in -= 1;
            }
        }

        let mut low_out = self.low_output.min(max);
        let mut high_out = self.high_output.min(max);
        if low_out > high_out {
            std::mem::swap(&mut low_out, &mut high_out);
        }

        let gamma = if self.gamma.is_finite() {
            self.gamma.clamp(MIN_GAMMA, MAX_GAMMA)
        } else {
            1.0
        };

        Self {
            low_input: low_in,
            high_input: high_in,
            gamma,
            low_output: low_out,
            high_output: high_out,
        }
    }
}

/// Levels settings for all five channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelsParameters {
    pub depth: BitDepth,
    /// Indexed by [`Channel::index`].
    pub channels: [ChannelLevels; 5],
}

impl Default for LevelsParameters {
    fn default() -> Self {
        Self::new(BitDepth::Eight)
    }
}

impl LevelsParameters {
    /// Identity levels for every channel.
    pub fn new(depth: BitDepth) -> Self {
        Self {
            depth,
            channels: [ChannelLevels::identity(depth); 5],
        }
    }

    pub fn channel(&self, channel: Channel) -> &ChannelLevels {
        &self.channels[channel.index()]
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut ChannelLevels {
        &mut self.channels[channel.index()]
    }

    pub fn set_low_input(&mut self, channel: Channel, value: u16) {
        self.channel_mut(channel).low_input = value;
    }

    pub fn set_high_input(&mut self, channel: Channel, value: u16) {
        self.channel_mut(channel).high_input = value;
    }

    pub fn set_gamma(&mut self, channel: Channel, value: f64) {
        self.channel_mut(channel).gamma = value;
    }

    pub fn set_low_output(&mut self, channel: Channel, value: u16) {
        self.channel_mut(channel).low_output = value;
    }

    pub fn set_high_output(&mut self, channel: Channel, value: u16) {
        self.channel_mut(channel).high_output = value;
    }

    /// Restore one channel to identity.
    pub fn reset_channel(&mut self, channel: Channel) {
        self.channels[channel.index()] = ChannelLevels::identity(self.depth);
    }

    pub fn reset_all(&mut self) {
        self.channels = [ChannelLevels::identity(self.depth); 5];
    }

    /// Check if all channels are at identity
    pub fn is_identity(&self) -> bool {
        self.channels.iter().all(|c| c.is_identity(self.depth))
    }

    /// Reject any channel whose ranges or gamma are out of domain.
    pub fn validate(&self) -> FilterResult<()> {
        for channel in Channel::ALL {
            self.channel(channel).validate(self.depth, channel)?;
        }
        Ok(())
    }

    /// Copy with every channel silently corrected into a valid state.
    ///
    /// Inverted ranges are swapped, empty input ranges widened by one
    /// sample, values clamped to the depth, and gamma clamped (or reset to
    /// 1.0 when not finite). The result always passes [`validate`](Self::validate).
    pub fn clamped(&self) -> Self {
        let mut out = self.clone();
        for levels in out.channels.iter_mut() {
            *levels = levels.clamped(self.depth);
        }
        out
    }

    /// Set the black point of `channel` so `color` maps to black.
    ///
    /// Luminosity sets the Red, Green and Blue black points from their own
    /// components.
    pub fn adjust_black_point(&mut self, channel: Channel, color: Pixel) {
        for (ch, value) in picker_targets(channel, color) {
            self.set_low_input(ch, value);
        }
    }

    /// Set the white point of `channel` so `color` maps to white.
    pub fn adjust_white_point(&mut self, channel: Channel, color: Pixel) {
        for (ch, value) in picker_targets(channel, color) {
            self.set_high_input(ch, value);
        }
    }

    /// Set the gamma of `channel` so `color` maps to the middle of the
    /// output range. Channels where the color lies outside the open input
    /// range are left unchanged.
    pub fn adjust_gray_point(&mut self, channel: Channel, color: Pixel) {
        for (ch, value) in picker_targets(channel, color) {
            let levels = self.channel(ch);
            if levels.high_input <= levels.low_input || value <= levels.low_input {
                continue;
            }
            let x = (value - levels.low_input) as f64
                / (levels.high_input - levels.low_input) as f64;
            if x >= 1.0 {
                continue;
            }
            let gamma = (0.5f64.ln() / x.ln()).clamp(MIN_GAMMA, MAX_GAMMA);
            self.set_gamma(ch, gamma);
        }
    }
}

/// Channels a tone picker writes to and the sample value each receives.
fn picker_targets(channel: Channel, color: Pixel) -> Vec<(Channel, u16)> {
    match channel {
        Channel::Luminosity => vec![
            (Channel::Red, color.r),
            (Channel::Green, color.g),
            (Channel::Blue, color.b),
        ],
        Channel::Red => vec![(Channel::Red, color.r)],
        Channel::Green => vec![(Channel::Green, color.g)],
        Channel::Blue => vec![(Channel::Blue, color.b)],
        Channel::Alpha => vec![(Channel::Alpha, color.a)],
    }
}

// =============================================================================
// Lookup tables
// =============================================================================

/// Lookup table for one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelLut {
    /// table[input] = output
    pub table: Vec<u16>,
    /// Inputs above the white point; empty unless built with clipping.
    overexposed: Vec<bool>,
}

impl ChannelLut {
    /// Compile `levels` into a table covering every sample value of `depth`.
    ///
    /// Inputs below the black point clip to `low_output`; inputs above the
    /// white point clip to `high_output` and, with `clip_overexposed`, are
    /// flagged for the over-exposure indicator.
    pub fn build(levels: &ChannelLevels, depth: BitDepth, clip_overexposed: bool) -> Self {
        let size = depth.lut_size();
        let max = depth.max_value() as f64;
        let low_in = levels.low_input as f64;
        let span = levels.high_input as f64 - low_in;
        let low_out = levels.low_output as f64;
        let out_span = levels.high_output as f64 - low_out;

        let mut table = Vec::with_capacity(size);
        let mut overexposed = if clip_overexposed {
            Vec::with_capacity(size)
        } else {
            Vec::new()
        };

        for i in 0..size {
            let offset = i as f64 - low_in;
            // An empty input range degenerates to a hard threshold.
            let raw = if span != 0.0 { offset / span } else { offset };
            let x = raw.clamp(0.0, 1.0);
            let y = x.powf(levels.gamma);
            let out = (low_out + y * out_span).round().clamp(0.0, max);
            table.push(out as u16);
            if clip_overexposed {
                overexposed.push(raw > 1.0);
            }
        }

        Self { table, overexposed }
    }

    /// Table that maps every value to itself.
    pub fn identity(depth: BitDepth) -> Self {
        Self {
            table: (0..depth.lut_size()).map(|i| i as u16).collect(),
            overexposed: Vec::new(),
        }
    }

    #[inline]
    pub fn lookup(&self, value: u16) -> u16 {
        self.table[value as usize]
    }

    /// Whether `value` lies above the white point (only when built with clipping).
    #[inline]
    pub fn is_overexposed(&self, value: u16) -> bool {
        self.overexposed
            .get(value as usize)
            .copied()
            .unwrap_or(false)
    }

    pub fn is_identity(&self) -> bool {
        self.table.iter().enumerate().all(|(i, &v)| v as usize == i)
    }
}

/// Compiled levels for a whole image.
#[derive(Debug, Clone)]
pub struct LevelsLut {
    depth: BitDepth,
    /// Indexed by [`Channel::index`].
    channels: Vec<ChannelLut>,
    /// Red, Green and Blue tables composed with Luminosity.
    composed: [Vec<u16>; 3],
}

impl LevelsLut {
    /// Validate `params` and compile all five channel tables.
    pub fn build(params: &LevelsParameters, clip_overexposed: bool) -> FilterResult<Self> {
        params.validate()?;
        let depth = params.depth;

        let channels: Vec<ChannelLut> = Channel::ALL
            .iter()
            .map(|&ch| ChannelLut::build(params.channel(ch), depth, clip_overexposed))
            .collect();

        let luminosity = &channels[Channel::Luminosity.index()];
        let compose = |ch: Channel| -> Vec<u16> {
            channels[ch.index()]
                .table
                .iter()
                .map(|&v| luminosity.lookup(v))
                .collect()
        };
        let composed = [
            compose(Channel::Red),
            compose(Channel::Green),
            compose(Channel::Blue),
        ];

        trace!(depth = depth.bits(), clip_overexposed, "levels lut built");
        Ok(Self {
            depth,
            channels,
            composed,
        })
    }

    pub fn depth(&self) -> BitDepth {
        self.depth
    }

    pub fn channel(&self, channel: Channel) -> &ChannelLut {
        &self.channels[channel.index()]
    }

    #[inline]
    fn map_pixel(&self, p: Pixel, include_alpha: bool) -> Pixel {
        let alpha = if include_alpha {
            self.channel(Channel::Alpha).lookup(p.a)
        } else {
            p.a
        };
        Pixel::new(
            self.composed[0][p.r as usize],
            self.composed[1][p.g as usize],
            self.composed[2][p.b as usize],
            alpha,
        )
    }

    #[inline]
    fn sample_overexposed(&self, channel: Channel, value: u16) -> bool {
        let color = self.channel(channel);
        color.is_overexposed(value)
            || self
                .channel(Channel::Luminosity)
                .is_overexposed(color.lookup(value))
    }

    fn check_depth(&self, src: &PixelBuffer) -> FilterResult<()> {
        if src.depth() != self.depth {
            return Err(FilterError::InvalidBuffer(format!(
                "{}-bit levels applied to a {}-bit buffer",
                self.depth.bits(),
                src.depth().bits()
            )));
        }
        Ok(())
    }

    /// Map every pixel of `src` through the tables.
    ///
    /// Alpha passes through unchanged unless `include_alpha` is set.
    pub fn apply(&self, src: &PixelBuffer, include_alpha: bool) -> FilterResult<PixelBuffer> {
        self.apply_with_progress(src, include_alpha, &mut Progress::unobserved())
    }

    /// [`apply`](Self::apply) with per-row cancellation and progress.
    pub fn apply_with_progress(
        &self,
        src: &PixelBuffer,
        include_alpha: bool,
        progress: &mut Progress<'_>,
    ) -> FilterResult<PixelBuffer> {
        self.check_depth(src)?;
        let mut out = src.blank_like();
        let height = src.height();

        for y in 0..height {
            progress.check()?;
            for x in 0..src.width() {
                out.set_pixel(x, y, self.map_pixel(src.pixel(x, y), include_alpha));
            }
            progress.update(y as u64 + 1, height as u64);
        }

        Ok(out)
    }

    /// Preview helper: apply the tables and paint every pixel with an
    /// over-exposed R, G or B sample in `indicator`.
    ///
    /// Only meaningful for tables built with `clip_overexposed`.
    pub fn apply_with_overexposure(
        &self,
        src: &PixelBuffer,
        indicator: Rgba8,
    ) -> FilterResult<PixelBuffer> {
        self.check_depth(src)?;
        let marker = indicator.to_pixel(self.depth);
        let mut out = src.blank_like();

        for y in 0..src.height() {
            for x in 0..src.width() {
                let p = src.pixel(x, y);
                let flagged = self.sample_overexposed(Channel::Red, p.r)
                    || self.sample_overexposed(Channel::Green, p.g)
                    || self.sample_overexposed(Channel::Blue, p.b);
                let mapped = if flagged {
                    marker
                } else {
                    self.map_pixel(p, false)
                };
                out.set_pixel(x, y, mapped);
            }
        }

        Ok(out)
    }
}

// =============================================================================
// Auto levels
// =============================================================================

/// Derive levels that stretch each color channel between its histogram
/// percentiles.
///
/// # Arguments
/// * `histogram` - Histogram of the image to correct
/// * `cutoff` - Fraction of samples ignored at each end, clamped to `[0, 0.5)`
///
/// # Returns
/// Parameters with Red, Green and Blue input ranges set and Luminosity and
/// Alpha at identity. A channel whose percentiles collapse stays identity.
pub fn auto_levels(histogram: &Histogram, cutoff: f64) -> LevelsParameters {
    let depth = histogram.depth;
    let mut params = LevelsParameters::new(depth);
    let total = histogram.total();
    if total == 0 {
        return params;
    }

    let cutoff = if cutoff.is_finite() {
        cutoff.clamp(0.0, 0.4999)
    } else {
        DEFAULT_AUTO_CUTOFF
    };
    let threshold = cutoff * total as f64;

    for channel in [Channel::Red, Channel::Green, Channel::Blue] {
        let bins = histogram.channel(channel);
        let (Some(low), Some(high)) = (
            percentile_from_bottom(bins, threshold),
            percentile_from_top(bins, threshold),
        ) else {
            continue;
        };
        if low < high {
            params.set_low_input(channel, low as u16);
            params.set_high_input(channel, high as u16);
        }
    }

    debug!(total, cutoff, "auto levels computed");
    params
}

fn percentile_from_bottom(bins: &[u32], threshold: f64) -> Option<usize> {
    let mut seen = 0u64;
    for (i, &count) in bins.iter().enumerate() {
        seen += count as u64;
        if seen as f64 > threshold {
            return Some(i);
        }
    }
    None
}

fn percentile_from_top(bins: &[u32], threshold: f64) -> Option<usize> {
    let mut seen = 0u64;
    for (i, &count) in bins.iter().enumerate().rev() {
        seen += count as u64;
        if seen as f64 > threshold {
            return Some(i);
        }
    }
    None
}

// =============================================================================
// Filter
// =============================================================================

/// Levels adjustment as a [`Filter`].
#[derive(Debug, Clone)]
pub struct LevelsFilter {
    lut: LevelsLut,
    include_alpha: bool,
}

impl LevelsFilter {
    /// Compile `params`. Alpha is remapped only when its channel is not identity.
    pub fn new(params: &LevelsParameters) -> FilterResult<Self> {
        let lut = LevelsLut::build(params, false)?;
        let include_alpha = !params.channel(Channel::Alpha).is_identity(params.depth);
        Ok(Self { lut, include_alpha })
    }
}

impl Filter for LevelsFilter {
    fn name(&self) -> &'static str {
        "levels"
    }

    fn apply(&self, src: &PixelBuffer, progress: &mut Progress<'_>) -> FilterResult<PixelBuffer> {
        debug!(
            width = src.width(),
            height = src.height(),
            depth = src.depth().bits(),
            "levels"
        );
        self.lut
            .apply_with_progress(src, self.include_alpha, progress)
    }
}
