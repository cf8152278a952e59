//! Motion filter — turns raw acceleration into a stable "virtual elevation".
//!
//! Double-integrating noisy acceleration drifts without bound, so the
//! elevation strategies combine three things:
//! - a one-pole low-pass on the input to reject hand tremor,
//! - a dead-zone that brakes velocity toward rest while the device is
//!   held still,
//! - a hard clamp on position.
//!
//! Raw readings are clamped to a physical range before they enter the
//! filter, which is enough to keep velocity finite; velocity itself is
//! never clamped.
//!
//! All strategies are O(1) per sample with no history buffer.

use serde::{Deserialize, Serialize};

use crate::config::MotionConfig;

use super::sample::{Axis, MotionSample};

/// Weight of the new sample in the low-pass; history keeps the rest.
const LOW_PASS_INPUT_WEIGHT: f64 = 0.2;
/// Filtered magnitudes below this are treated as no intentional motion.
const DEAD_ZONE: f64 = 0.4;
/// Velocity multiplier applied per step inside the dead-zone.
const BRAKE_FACTOR: f64 = 0.5;
/// Inside the dead-zone, velocities smaller than this snap to exactly 0.
const SNAP_THRESHOLD: f64 = 0.1;
const ACCEL_GAIN: f64 = 0.4;
const POSITION_GAIN: f64 = 0.6;
/// Per-step velocity retention of the leaky integrator.
const LEAK: f64 = 0.95;
/// Far beyond any phone accelerometer; keeps the filter arithmetic finite.
const MAX_ACCEL: f64 = 1.0e4;

/// Selectable filtering behaviour, from simplest to most refined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterStrategy {
    /// No integration: the signal is |x| + |y| + |z| of each sample.
    Magnitude,
    /// Dead-zone brake plus a constant leak, no input low-pass, no snap.
    LeakyIntegrator,
    /// Low-pass, dead-zone brake with snap-to-zero, clamped integration.
    #[default]
    FilteredDeadZone,
}

impl FilterStrategy {
    pub fn default_position_limit(self) -> f64 {
        match self {
            FilterStrategy::LeakyIntegrator => 800.0,
            FilterStrategy::Magnitude | FilterStrategy::FilteredDeadZone => 1000.0,
        }
    }

    /// Default sensitivity of the frequency mapping fed by this strategy:
    /// Hz per unit of movement for `Magnitude`, Hz per unit of position otherwise.
    pub fn default_sensitivity(self) -> f64 {
        match self {
            FilterStrategy::Magnitude => 50.0,
            FilterStrategy::LeakyIntegrator => 1.5,
            FilterStrategy::FilteredDeadZone => 1.2,
        }
    }

    pub fn integrates(self) -> bool {
        !matches!(self, FilterStrategy::Magnitude)
    }
}

/// Integrator state carried between samples.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub previous_filtered_accel: f64,
    pub velocity: f64,
    pub position: f64,
}

impl FilterState {
    pub fn is_at_rest(&self) -> bool {
        *self == FilterState::default()
    }
}

fn sanitize(raw: Option<f64>) -> f64 {
    raw.filter(|v| v.is_finite())
        .map_or(0.0, |v| v.clamp(-MAX_ACCEL, MAX_ACCEL))
}

/// Low-pass, dead-zone brake with snap-to-zero, clamped integration.
///
/// An absent (or non-finite) reading counts as 0 for this step.
pub fn filtered_dead_zone_step(
    raw: Option<f64>,
    state: FilterState,
    position_limit: f64,
) -> FilterState {
    let raw = sanitize(raw);
    let filtered =
        raw * LOW_PASS_INPUT_WEIGHT + state.previous_filtered_accel * (1.0 - LOW_PASS_INPUT_WEIGHT);

    let mut velocity = state.velocity;
    if filtered.abs() < DEAD_ZONE {
        velocity *= BRAKE_FACTOR;
        if velocity.abs() < SNAP_THRESHOLD {
            velocity = 0.0;
        }
    } else {
        velocity += filtered * ACCEL_GAIN;
    }
    let position = (state.position + velocity * POSITION_GAIN).clamp(-position_limit, position_limit);

    FilterState {
        previous_filtered_accel: filtered,
        velocity,
        position,
    }
}

/// Single-stage leaky integrator without input low-pass or snap.
///
/// `previous_filtered_accel` records the last (unfiltered) input.
pub fn leaky_integrator_step(
    raw: Option<f64>,
    state: FilterState,
    position_limit: f64,
) -> FilterState {
    let raw = sanitize(raw);

    let mut velocity = state.velocity;
    if raw.abs() < DEAD_ZONE {
        velocity *= BRAKE_FACTOR;
    } else {
        velocity += raw * ACCEL_GAIN;
    }
    velocity *= LEAK;
    let position = (state.position + velocity * POSITION_GAIN).clamp(-position_limit, position_limit);

    FilterState {
        previous_filtered_accel: raw,
        velocity,
        position,
    }
}

/// Stateful motion filter running one strategy over incoming samples.
#[derive(Debug, Clone)]
pub struct MotionFilter {
    strategy: FilterStrategy,
    axis: Axis,
    position_limit: f64,
    state: FilterState,
}

impl MotionFilter {
    /// A limit that is not a positive finite number falls back to the
    /// strategy's default.
    pub fn new(strategy: FilterStrategy, axis: Axis, position_limit: f64) -> Self {
        let position_limit = if position_limit.is_finite() && position_limit > 0.0 {
            position_limit
        } else {
            let fallback = strategy.default_position_limit();
            log::warn!("position limit {position_limit} unusable, falling back to {fallback}");
            fallback
        };
        MotionFilter {
            strategy,
            axis,
            position_limit,
            state: FilterState::default(),
        }
    }

    pub fn from_config(config: &MotionConfig) -> Self {
        Self::new(config.strategy, config.axis, config.position_limit())
    }

    pub fn strategy(&self) -> FilterStrategy {
        self.strategy
    }

    pub fn position_limit(&self) -> f64 {
        self.position_limit
    }

    pub fn state(&self) -> FilterState {
        self.state
    }

    /// Feed one sample and return the strategy's output signal: movement
    /// magnitude for [`FilterStrategy::Magnitude`], position otherwise.
    ///
    /// A sample with no component at all is skipped and yields `None`.
    pub fn update(&mut self, sample: &MotionSample) -> Option<f64> {
        if sample.is_empty() {
            log::warn!("ignoring motion sample without acceleration data");
            return None;
        }
        let raw = sample.axis(self.axis);
        let signal = match self.strategy {
            FilterStrategy::Magnitude => sample.magnitude(),
            FilterStrategy::LeakyIntegrator => {
                self.state = leaky_integrator_step(raw, self.state, self.position_limit);
                self.state.position
            }
            FilterStrategy::FilteredDeadZone => {
                self.state = filtered_dead_zone_step(raw, self.state, self.position_limit);
                self.state.position
            }
        };
        log::trace!("{:?} step -> {signal:.3} ({:?})", self.strategy, self.state);
        Some(signal)
    }

    /// Return the integrator to rest.
    pub fn reset(&mut self) {
        self.state = FilterState::default();
    }
}
