//! Anti-aliased oscillators using PolyBLEP.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported waveform shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ];

    /// Output gain for this shape. The harmonic-rich shapes sound much
    /// louder than a sine at the same peak level, so they get half the gain.
    pub fn amplitude(self) -> f64 {
        match self {
            Waveform::Sine => 0.3,
            Waveform::Square | Waveform::Sawtooth | Waveform::Triangle => 0.15,
        }
    }

    /// Name shown in the waveform selector.
    pub fn display_name(self) -> &'static str {
        match self {
            Waveform::Sine => "Sine",
            Waveform::Square => "Square",
            Waveform::Sawtooth => "Sawtooth",
            Waveform::Triangle => "Triangle",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Error returned when a waveform name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown waveform `{0}`")]
pub struct UnknownWaveform(pub String);

impl FromStr for Waveform {
    type Err = UnknownWaveform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sine" => Ok(Waveform::Sine),
            "square" => Ok(Waveform::Square),
            "sawtooth" | "saw" => Ok(Waveform::Sawtooth),
            "triangle" => Ok(Waveform::Triangle),
            _ => Err(UnknownWaveform(s.to_string())),
        }
    }
}

/// A band-limited oscillator with anti-aliasing (PolyBLEP).
///
/// Frequency is read on every sample, so a caller may move it
/// continuously (e.g. from a smoothed parameter) without phase jumps.
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub waveform: Waveform,
    phase: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, sample_rate: f64) -> Self {
        Oscillator {
            waveform,
            phase: 0.0,
            sample_rate,
        }
    }

    /// Generate the next sample at `frequency` Hz.
    pub fn next_sample(&mut self, frequency: f64) -> f64 {
        let inc = frequency / self.sample_rate;
        let sample = match self.waveform {
            Waveform::Sine => self.sine(),
            Waveform::Sawtooth => self.sawtooth(inc),
            Waveform::Square => self.square(inc),
            Waveform::Triangle => self.triangle(),
        };

        self.phase += inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sample
    }

    fn sine(&self) -> f64 {
        (2.0 * PI * self.phase).sin()
    }

    /// Rises from -1 to +1, PolyBLEP smooths the drop.
    fn sawtooth(&self, inc: f64) -> f64 {
        let naive = 2.0 * self.phase - 1.0;
        naive - poly_blep(self.phase, inc)
    }

    fn square(&self, inc: f64) -> f64 {
        let mut value = if self.phase < 0.5 { 1.0 } else { -1.0 };
        value += poly_blep(self.phase, inc);
        value -= poly_blep((self.phase + 0.5) % 1.0, inc);
        value
    }

    /// Piecewise linear: -1 to +1 over the first half cycle, back down over the second.
    fn triangle(&self) -> f64 {
        if self.phase < 0.5 {
            4.0 * self.phase - 1.0
        } else {
            3.0 - 4.0 * self.phase
        }
    }
}

/// PolyBLEP (Polynomial Band-Limited Step) correction.
///
/// `t` is the phase [0, 1), `dt` is the phase increment per sample.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if t < dt {
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_zero_at_start() {
        let mut osc = Oscillator::new(Waveform::Sine, 44100.0);
        let sample = osc.next_sample(440.0);
        assert!(sample.abs() < 1e-10, "Sine should start near 0, got {sample}");
    }

    #[test]
    fn every_shape_stays_bounded() {
        for waveform in Waveform::ALL {
            let mut osc = Oscillator::new(waveform, 44100.0);
            for _ in 0..44100 {
                let s = osc.next_sample(1000.0);
                assert!(s.abs() <= 1.5, "{waveform} out of range: {s}");
            }
        }
    }

    #[test]
    fn frequency_change_keeps_phase_continuous() {
        let mut osc = Oscillator::new(Waveform::Sine, 44100.0);
        let mut prev = 0.0;
        for i in 0..4410 {
            let freq = if i < 2205 { 200.0 } else { 1800.0 };
            let s = osc.next_sample(freq);
            // Max per-sample step of a unit sine at 1800 Hz is 2π·1800/44100 ≈ 0.26.
            assert!((s - prev).abs() < 0.3, "Discontinuity at sample {i}");
            prev = s;
        }
    }

    #[test]
    fn amplitude_depends_on_waveform() {
        assert_eq!(Waveform::Sine.amplitude(), 0.3);
        assert_eq!(Waveform::Square.amplitude(), 0.15);
        assert_eq!(Waveform::Sawtooth.amplitude(), 0.15);
        assert_eq!(Waveform::Triangle.amplitude(), 0.15);
    }

    #[test]
    fn parses_names() {
        assert_eq!("square".parse::<Waveform>(), Ok(Waveform::Square));
        assert_eq!("Saw".parse::<Waveform>(), Ok(Waveform::Sawtooth));
        assert_eq!(" TRIANGLE ".parse::<Waveform>(), Ok(Waveform::Triangle));
        assert!("noise".parse::<Waveform>().is_err());
        assert_eq!(Waveform::Sawtooth.to_string(), "Sawtooth");
    }
}
