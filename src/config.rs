//! Tunables for a playback session.
//!
//! Every field has a default, so `{}` (or no config at all) yields the
//! reference behaviour. Field names are camelCase to match the JS host.

use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::Waveform;
use crate::error::ConfigError;
use crate::motion::filter::FilterStrategy;
use crate::motion::sample::Axis;

/// Tone engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToneConfig {
    /// Output sample rate assumed when the host has audio but reports no rate.
    pub sample_rate: f64,
    /// Time constant (seconds) for frequency glides on retune.
    pub retune_time_constant: f64,
    /// Time constant (seconds) for gain ramps on waveform change.
    pub gain_time_constant: f64,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            retune_time_constant: 0.05,
            gain_time_constant: 0.1,
        }
    }
}

/// Motion pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MotionConfig {
    pub strategy: FilterStrategy,
    /// Axis integrated by the elevation strategies.
    pub axis: Axis,
    /// Overrides the strategy's position clamp (symmetric).
    pub position_limit: Option<f64>,
    /// Overrides the strategy's Hz-per-unit elevation sensitivity.
    pub sensitivity: Option<f64>,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            strategy: FilterStrategy::FilteredDeadZone,
            axis: Axis::Z,
            position_limit: None,
            sensitivity: None,
        }
    }
}

impl MotionConfig {
    pub fn position_limit(&self) -> f64 {
        self.position_limit
            .unwrap_or_else(|| self.strategy.default_position_limit())
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
            .unwrap_or_else(|| self.strategy.default_sensitivity())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    pub tone: ToneConfig,
    pub motion: MotionConfig,
    /// Waveform selected when the session is created.
    pub waveform: Waveform,
}

impl SessionConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("tone.sampleRate", self.tone.sample_rate)?;
        non_negative("tone.retuneTimeConstant", self.tone.retune_time_constant)?;
        non_negative("tone.gainTimeConstant", self.tone.gain_time_constant)?;
        if let Some(limit) = self.motion.position_limit {
            positive("motion.positionLimit", limit)?;
        }
        if let Some(sensitivity) = self.motion.sensitivity {
            positive("motion.sensitivity", sensitivity)?;
        }
        Ok(())
    }
}

/// Check a sample rate reported by the output device.
pub fn device_sample_rate(rate: f64) -> Result<f64, ConfigError> {
    positive("sampleRate", rate)?;
    Ok(rate)
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a positive number, got {value}"),
        })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected zero or a positive number, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let config = SessionConfig::from_json("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.motion.position_limit(), 1000.0);
        assert_eq!(config.motion.sensitivity(), 1.2);
    }

    #[test]
    fn strategy_defaults_follow_strategy() {
        let config = SessionConfig::from_json(
            r#"{ "motion": { "strategy": "leakyIntegrator", "axis": "y" } }"#,
        )
        .unwrap();
        assert_eq!(config.motion.strategy, FilterStrategy::LeakyIntegrator);
        assert_eq!(config.motion.axis, Axis::Y);
        assert_eq!(config.motion.position_limit(), 800.0);
        assert_eq!(config.motion.sensitivity(), 1.5);
    }

    #[test]
    fn overrides_and_waveform() {
        let config = SessionConfig::from_json(
            r#"{ "waveform": "square", "motion": { "positionLimit": 500, "sensitivity": 2.0 },
                 "tone": { "retuneTimeConstant": 0.02 } }"#,
        )
        .unwrap();
        assert_eq!(config.waveform, Waveform::Square);
        assert_eq!(config.motion.position_limit(), 500.0);
        assert_eq!(config.motion.sensitivity(), 2.0);
        assert_eq!(config.tone.retune_time_constant, 0.02);
        assert_eq!(config.tone.gain_time_constant, 0.1);
    }

    #[test]
    fn rejects_bad_values() {
        let err = SessionConfig::from_json(r#"{ "tone": { "sampleRate": 0 } }"#).unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { field: "tone.sampleRate", .. }),
            "got {err}"
        );
        let err = SessionConfig::from_json(r#"{ "motion": { "positionLimit": -1 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "motion.positionLimit", .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = SessionConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn device_sample_rate_must_be_positive() {
        assert_eq!(device_sample_rate(48000.0).unwrap(), 48000.0);
        for rate in [0.0, -44100.0, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(device_sample_rate(rate), Err(ConfigError::Invalid { field: "sampleRate", .. })),
                "rate {rate} accepted"
            );
        }
    }
}
