//! Voice — one oscillator feeding one gain stage.

use super::oscillator::{Oscillator, Waveform};
use super::param::SmoothedParam;

/// A single sounding voice. Frequency and gain are both smoothed so that
/// retuning and waveform switches do not click.
#[derive(Debug, Clone)]
pub struct Voice {
    oscillator: Oscillator,
    frequency: SmoothedParam,
    gain: SmoothedParam,
}

impl Voice {
    /// Create a voice already sounding at `frequency` with the waveform's
    /// own amplitude; both values are set immediately, not ramped.
    pub fn new(waveform: Waveform, frequency: f64, sample_rate: f64) -> Self {
        Voice {
            oscillator: Oscillator::new(waveform, sample_rate),
            frequency: SmoothedParam::new(frequency, sample_rate),
            gain: SmoothedParam::new(waveform.amplitude(), sample_rate),
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.oscillator.waveform
    }

    /// Glide toward `frequency` with the given time constant (seconds).
    pub fn glide_to(&mut self, frequency: f64, time_constant: f64) {
        self.frequency.set_target(frequency, time_constant);
    }

    /// Switch shape now and ramp the gain to the new shape's amplitude.
    pub fn change_waveform(&mut self, waveform: Waveform, gain_time_constant: f64) {
        self.oscillator.waveform = waveform;
        self.gain.set_target(waveform.amplitude(), gain_time_constant);
    }

    /// Current (possibly mid-glide) frequency.
    pub fn frequency(&self) -> f64 {
        self.frequency.value()
    }

    pub fn gain(&self) -> f64 {
        self.gain.value()
    }

    pub fn next_sample(&mut self) -> f64 {
        let freq = self.frequency.next_sample();
        let gain = self.gain.next_sample();
        self.oscillator.next_sample(freq) * gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_produces_sound() {
        let mut v = Voice::new(Waveform::Sine, 440.0, 44100.0);
        let has_nonzero = (0..4410).any(|_| v.next_sample().abs() > 0.001);
        assert!(has_nonzero, "Voice should produce non-zero output");
    }

    #[test]
    fn output_bounded_by_gain() {
        let mut v = Voice::new(Waveform::Sine, 880.0, 44100.0);
        for _ in 0..44100 {
            let s = v.next_sample();
            assert!(s.abs() <= 0.3 + 1e-9, "Sine voice exceeds its amplitude: {s}");
        }
    }

    #[test]
    fn glide_moves_gradually() {
        let mut v = Voice::new(Waveform::Sine, 440.0, 44100.0);
        v.glide_to(880.0, 0.05);
        v.next_sample();
        assert!(v.frequency() < 500.0, "Glide should not jump, got {}", v.frequency());
        for _ in 0..88200 {
            v.next_sample();
        }
        assert_eq!(v.frequency(), 880.0);
    }

    #[test]
    fn waveform_change_ramps_gain() {
        let mut v = Voice::new(Waveform::Sine, 440.0, 44100.0);
        v.change_waveform(Waveform::Square, 0.1);
        assert_eq!(v.waveform(), Waveform::Square);
        v.next_sample();
        assert!(v.gain() > 0.29, "Gain should ramp, not jump, got {}", v.gain());
        for _ in 0..88200 {
            v.next_sample();
        }
        assert!((v.gain() - 0.15).abs() < 1e-6);
    }
}
