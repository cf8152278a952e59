//! Frequency mapping — motion signal or fader position to an audible pitch.
//!
//! Every mapping lands on an integer frequency in [`MIN_FREQUENCY`, `MAX_FREQUENCY`].

use serde::{Deserialize, Serialize};

use crate::motion::filter::FilterStrategy;

pub const MIN_FREQUENCY: f64 = 100.0;
pub const MAX_FREQUENCY: f64 = 2000.0;
/// Pitch at rest and after a reset.
pub const DEFAULT_FREQUENCY: f64 = 440.0;
/// Pitch of a motionless device in magnitude mode.
const MAGNITUDE_BASE_FREQUENCY: f64 = 200.0;

/// How a signal is turned into a frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum MappingMode {
    /// `200 + movement * sensitivity`, floored.
    Magnitude { sensitivity: f64 },
    /// `440 - position * sensitivity`, rounded. Lowering the device
    /// (negative position) raises the pitch.
    Elevation { sensitivity: f64 },
    /// Fader fraction in [0, 1], bottom to top, rounded.
    Fader,
}

impl MappingMode {
    /// The mode that consumes a filter strategy's output.
    pub fn for_strategy(strategy: FilterStrategy, sensitivity: f64) -> Self {
        if strategy.integrates() {
            MappingMode::Elevation { sensitivity }
        } else {
            MappingMode::Magnitude { sensitivity }
        }
    }
}

pub fn clamp_frequency(freq: f64) -> f64 {
    if freq.is_nan() {
        return DEFAULT_FREQUENCY;
    }
    freq.clamp(MIN_FREQUENCY, MAX_FREQUENCY)
}

/// Map `signal` to a frequency in Hz under `mode`.
pub fn map_to_frequency(signal: f64, mode: MappingMode) -> f64 {
    match mode {
        MappingMode::Magnitude { sensitivity } => {
            clamp_frequency(MAGNITUDE_BASE_FREQUENCY + signal * sensitivity).floor()
        }
        MappingMode::Elevation { sensitivity } => {
            clamp_frequency(DEFAULT_FREQUENCY - signal * sensitivity).round()
        }
        MappingMode::Fader => {
            let fraction = if signal.is_nan() { 0.0 } else { signal.clamp(0.0, 1.0) };
            clamp_frequency((MIN_FREQUENCY + fraction * (MAX_FREQUENCY - MIN_FREQUENCY)).round())
        }
    }
}

/// Screen geometry of a vertical fader track.
///
/// Screen coordinates grow downward, so the top edge has the smaller
/// coordinate and maps to the maximum frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaderTrack {
    pub top: f64,
    pub bottom: f64,
}

impl FaderTrack {
    pub fn new(top: f64, bottom: f64) -> Self {
        FaderTrack { top, bottom }
    }

    /// Fraction of the track below `pointer`: 1.0 at the top, 0.0 at the
    /// bottom. Pointers outside the track clamp to its ends.
    pub fn fraction(&self, pointer: f64) -> f64 {
        let height = self.bottom - self.top;
        if height <= 0.0 || !pointer.is_finite() {
            return 0.0;
        }
        ((self.bottom - pointer) / height).clamp(0.0, 1.0)
    }

    pub fn frequency_at(&self, pointer: f64) -> f64 {
        map_to_frequency(self.fraction(pointer), MappingMode::Fader)
    }

    /// Pointer position that shows `freq` on this track.
    pub fn position_of(&self, freq: f64) -> f64 {
        let fraction = (clamp_frequency(freq) - MIN_FREQUENCY) / (MAX_FREQUENCY - MIN_FREQUENCY);
        self.bottom - fraction * (self.bottom - self.top)
    }
}

/// Frequency as shown on the display: zero-padded to four digits.
pub fn format_frequency(freq: f64) -> String {
    format!("{:04}", clamp_frequency(freq).round() as u32)
}
