//! Smoothed parameter with WebAudio `AudioParam`-style automation.
//!
//! Two automation modes are supported:
//! - `set_value`: jump immediately (used when a voice is created).
//! - `set_target`: exponential approach toward a target with a time
//!   constant, matching `AudioParam.setTargetAtTime`.

/// Stage of the parameter's automation.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Hold,
    Approach,
}

/// Residual distance below which an approach snaps onto its target.
const SNAP_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct SmoothedParam {
    value: f64,
    target: f64,
    stage: Stage,
    /// Per-sample fraction of the remaining distance covered.
    coefficient: f64,
    sample_rate: f64,
}

impl SmoothedParam {
    pub fn new(value: f64, sample_rate: f64) -> Self {
        SmoothedParam {
            value,
            target: value,
            stage: Stage::Hold,
            coefficient: 0.0,
            sample_rate,
        }
    }

    /// Jump to `value` now, cancelling any running approach.
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
        self.target = value;
        self.stage = Stage::Hold;
    }

    /// Start an exponential approach toward `target`.
    ///
    /// After one `time_constant` (seconds) the value has covered about 63%
    /// of the distance. A non-positive time constant jumps immediately.
    pub fn set_target(&mut self, target: f64, time_constant: f64) {
        if time_constant <= 0.0 {
            self.set_value(target);
            return;
        }
        self.target = target;
        self.coefficient = 1.0 - (-1.0 / (time_constant * self.sample_rate)).exp();
        self.stage = Stage::Approach;
    }

    /// Advance one sample and return the new value.
    pub fn next_sample(&mut self) -> f64 {
        if self.stage == Stage::Approach {
            self.value += (self.target - self.value) * self.coefficient;
            if (self.target - self.value).abs() < SNAP_EPSILON {
                self.value = self.target;
                self.stage = Stage::Hold;
            }
        }
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_settled() {
        let mut p = SmoothedParam::new(440.0, 44100.0);
        assert_eq!(p.value(), 440.0);
        assert_eq!(p.next_sample(), 440.0);
    }

    #[test]
    fn set_target_is_not_instant() {
        let mut p = SmoothedParam::new(440.0, 44100.0);
        p.set_target(1000.0, 0.05);
        let first = p.next_sample();
        assert!(
            first > 440.0 && first < 460.0,
            "One sample into a 50ms ramp should barely move, got {first}"
        );
    }

    #[test]
    fn one_time_constant_covers_about_63_percent() {
        let mut p = SmoothedParam::new(0.0, 44100.0);
        p.set_target(1.0, 0.1);
        for _ in 0..4410 {
            p.next_sample();
        }
        assert!(
            (p.value() - 0.632).abs() < 0.01,
            "Expected ~0.632 after one time constant, got {}",
            p.value()
        );
    }

    #[test]
    fn approach_settles_on_target() {
        let mut p = SmoothedParam::new(440.0, 44100.0);
        p.set_target(2000.0, 0.05);
        for _ in 0..88200 {
            p.next_sample();
        }
        assert_eq!(p.value(), 2000.0, "Ramp should snap onto its target within two seconds");
        assert_eq!(p.next_sample(), 2000.0);
    }

    #[test]
    fn set_value_cancels_approach() {
        let mut p = SmoothedParam::new(0.3, 44100.0);
        p.set_target(0.15, 0.1);
        p.next_sample();
        p.set_value(0.3);
        for _ in 0..100 {
            assert_eq!(p.next_sample(), 0.3);
        }
    }

    #[test]
    fn zero_time_constant_jumps() {
        let mut p = SmoothedParam::new(100.0, 44100.0);
        p.set_target(200.0, 0.0);
        assert_eq!(p.value(), 200.0);
        assert_eq!(p.next_sample(), 200.0);
    }
}
