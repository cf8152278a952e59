//! Session controller — turns user intents and sensor events into tone changes.
//!
//! ```text
//! Idle ──toggle──▶ AcquiringPermission ──granted──▶ Playing
//!   ▲                     │ denied                    │
//!   └─────────────────────┴───────────toggle──────────┘
//! ```
//!
//! `AcquiringPermission` is only entered in motion mode on platforms with a
//! permission prompt. The controller never blocks: the prompt's answer is
//! delivered later through [`SessionController::resolve_permission`].

use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::dsp::oscillator::Waveform;
use crate::error::{ConfigError, SessionError};
use crate::mapper::{
    DEFAULT_FREQUENCY, FaderTrack, MappingMode, clamp_frequency, format_frequency,
    map_to_frequency,
};
use crate::motion::filter::{FilterState, MotionFilter};
use crate::motion::sample::MotionSample;
use crate::motion::subscription::{MotionSource, PermissionGate, PermissionOutcome, Subscription};
use crate::tone::{AudioHost, ToneEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Idle,
    AcquiringPermission,
    Playing,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AcquiringPermission => "acquiringPermission",
            SessionState::Playing => "playing",
        }
    }
}

/// Where pitch comes from while playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputMode {
    /// Pitch follows the on-screen fader only.
    #[default]
    Manual,
    /// Pitch follows the motion sensor (the fader still works).
    Motion,
}

pub struct SessionController<H: AudioHost, M: MotionSource, P: PermissionGate> {
    tone: ToneEngine<H>,
    motion: M,
    permission: P,
    filter: MotionFilter,
    mapping: MappingMode,
    mode: InputMode,
    state: SessionState,
    subscription: Option<Subscription>,
    frequency: f64,
    /// Last user-facing problem, cleared by the next toggle.
    notice: Option<SessionError>,
}

impl<H: AudioHost, M: MotionSource, P: PermissionGate> SessionController<H, M, P> {
    /// Build an idle session. Fails when `config` does not validate.
    pub fn new(
        config: &SessionConfig,
        host: H,
        motion: M,
        permission: P,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(SessionController {
            tone: ToneEngine::new(host, config.tone.clone(), config.waveform),
            motion,
            permission,
            filter: MotionFilter::from_config(&config.motion),
            mapping: MappingMode::for_strategy(config.motion.strategy, config.motion.sensitivity()),
            mode: InputMode::Manual,
            state: SessionState::Idle,
            subscription: None,
            frequency: DEFAULT_FREQUENCY,
            notice: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn input_mode(&self) -> InputMode {
        self.mode
    }

    pub fn is_playing(&self) -> bool {
        self.state == SessionState::Playing
    }

    /// Whether motion events are currently being consumed.
    pub fn sensor_active(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn frequency_display(&self) -> String {
        format_frequency(self.frequency)
    }

    pub fn waveform(&self) -> Waveform {
        self.tone.parameters().waveform
    }

    pub fn filter_state(&self) -> FilterState {
        self.filter.state()
    }

    pub fn notice(&self) -> Option<&SessionError> {
        self.notice.as_ref()
    }

    pub fn tone(&self) -> &ToneEngine<H> {
        &self.tone
    }

    pub fn motion_source(&self) -> &M {
        &self.motion
    }

    pub fn permission_gate(&self) -> &P {
        &self.permission
    }

    /// Label for the play toggle.
    pub fn button_label(&self) -> &'static str {
        match (self.mode, self.is_playing()) {
            (InputMode::Motion, true) => "MOTION ON",
            (InputMode::Motion, false) => "MOTION OFF",
            (InputMode::Manual, true) => "CH ON",
            (InputMode::Manual, false) => "CH OFF",
        }
    }

    /// Choose the input mode. Only takes effect while idle.
    pub fn set_input_mode(&mut self, mode: InputMode) {
        if self.state != SessionState::Idle {
            log::debug!("ignoring input mode change to {mode:?} while {:?}", self.state);
            return;
        }
        self.mode = mode;
    }

    /// The play/stop button.
    pub fn toggle(&mut self) -> Result<SessionState, SessionError> {
        match self.state {
            SessionState::Playing => {
                self.stop();
                Ok(self.state)
            }
            SessionState::AcquiringPermission => {
                log::info!("permission request abandoned");
                self.state = SessionState::Idle;
                Ok(self.state)
            }
            SessionState::Idle => {
                self.notice = None;
                self.begin().inspect_err(|e| self.notice = Some(e.clone()))
            }
        }
    }

    fn begin(&mut self) -> Result<SessionState, SessionError> {
        match self.mode {
            InputMode::Manual => {
                self.start_tone()?;
                self.state = SessionState::Playing;
                log::info!("playing (manual) at {} Hz", self.frequency);
            }
            InputMode::Motion => {
                if !self.motion.is_available() {
                    log::warn!("no motion sensor; staying idle");
                    return Err(SessionError::MotionUnavailable);
                }
                if self.permission.requires_prompt() {
                    self.permission.begin_request();
                    self.state = SessionState::AcquiringPermission;
                    log::info!("waiting for motion permission");
                } else {
                    self.start_motion()?;
                }
            }
        }
        Ok(self.state)
    }

    /// Deliver the answer to a pending permission prompt. Answers that
    /// arrive when no prompt is pending are ignored.
    pub fn resolve_permission(
        &mut self,
        outcome: PermissionOutcome,
    ) -> Result<SessionState, SessionError> {
        if self.state != SessionState::AcquiringPermission {
            log::debug!("ignoring permission answer {outcome:?} while {:?}", self.state);
            return Ok(self.state);
        }
        self.state = SessionState::Idle;
        let result = match outcome {
            PermissionOutcome::Granted => self.start_motion(),
            PermissionOutcome::Denied => {
                log::warn!("motion permission denied");
                Err(SessionError::PermissionDenied)
            }
            PermissionOutcome::Failed(reason) => {
                log::error!("motion permission request failed: {reason}");
                Err(SessionError::PermissionDenied)
            }
        };
        result
            .map(|()| self.state)
            .inspect_err(|e| self.notice = Some(e.clone()))
    }

    fn start_motion(&mut self) -> Result<(), SessionError> {
        self.filter.reset();
        self.start_tone()?;
        self.subscription = Some(self.motion.subscribe());
        self.state = SessionState::Playing;
        log::info!("playing (motion, {:?})", self.filter.strategy());
        Ok(())
    }

    fn start_tone(&mut self) -> Result<(), SessionError> {
        let params = self.tone.parameters().with_frequency(self.frequency);
        self.tone.start(params)?;
        Ok(())
    }

    /// Detach from the sensor and silence the voice before returning.
    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.motion.unsubscribe(subscription);
        }
        self.tone.stop();
        self.filter.reset();
        if self.state != SessionState::Idle {
            log::info!("stopped");
        }
        self.state = SessionState::Idle;
    }

    /// Feed one sensor event. Returns the new frequency, or `None` when the
    /// event was ignored (no subscription, or an empty sample).
    pub fn on_motion(&mut self, sample: &MotionSample) -> Option<f64> {
        if self.subscription.is_none() {
            log::trace!("motion event without subscription");
            return None;
        }
        let signal = self.filter.update(sample)?;
        let freq = map_to_frequency(signal, self.mapping);
        self.apply_frequency(freq);
        Some(freq)
    }

    /// Fader dragged to `pointer` on `track`.
    pub fn set_fader(&mut self, pointer: f64, track: &FaderTrack) -> f64 {
        let freq = track.frequency_at(pointer);
        self.apply_frequency(freq);
        freq
    }

    /// Set the pitch directly. Returns the clamped, whole-Hz value applied.
    pub fn set_frequency(&mut self, freq: f64) -> f64 {
        let freq = clamp_frequency(freq).round();
        self.apply_frequency(freq);
        freq
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.tone.set_waveform(waveform);
    }

    /// Put the virtual elevation back at rest and glide to 440 Hz.
    pub fn reset(&mut self) {
        self.filter.reset();
        self.apply_frequency(DEFAULT_FREQUENCY);
    }

    fn apply_frequency(&mut self, freq: f64) {
        self.frequency = freq;
        self.tone.retune(freq);
    }

    /// Page hidden: pause audio output without leaving the current state.
    pub fn suspend_output(&mut self) {
        self.tone.suspend();
    }

    /// Page visible again.
    pub fn resume_output(&mut self) {
        self.tone.resume();
    }

    /// End of the session: stop and release the audio context.
    pub fn teardown(&mut self) {
        self.stop();
        self.tone.teardown();
    }

    /// Render the next block of output samples.
    pub fn render(&mut self, out: &mut [f32]) {
        self.tone.render(out);
    }
}
