//! Tone engine — owns the audio context and the single sounding voice.
//!
//! The context is created on first `start` and lives until `teardown`;
//! voices come and go with `start`/`stop`. Retuning and waveform changes
//! are smoothed so the output never clicks.

use serde::{Deserialize, Serialize};

use crate::config::ToneConfig;
use crate::dsp::context::{AudioContext, ContextState};
use crate::dsp::oscillator::Waveform;
use crate::dsp::voice::Voice;
use crate::error::ToneError;
use crate::mapper::{DEFAULT_FREQUENCY, clamp_frequency};

/// Platform audio capability.
pub trait AudioHost {
    /// Sample rate of the output device, or `None` when the platform
    /// cannot produce audio at all. A rate that is not a positive finite
    /// number is treated like `None`.
    fn output_sample_rate(&self) -> Option<f64>;
}

/// Output device as reported by the host at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputDevice {
    sample_rate: Option<f64>,
}

impl OutputDevice {
    pub fn with_rate(sample_rate: f64) -> Self {
        OutputDevice {
            sample_rate: Some(sample_rate),
        }
    }

    /// A platform without audio output.
    pub fn unavailable() -> Self {
        OutputDevice { sample_rate: None }
    }
}

impl AudioHost for OutputDevice {
    fn output_sample_rate(&self) -> Option<f64> {
        self.sample_rate
    }
}

/// What a voice plays: shape, pitch, and the shape's loudness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToneParameters {
    pub waveform: Waveform,
    pub frequency_hz: f64,
    pub amplitude: f64,
}

impl ToneParameters {
    pub fn new(waveform: Waveform, frequency_hz: f64) -> Self {
        ToneParameters {
            waveform,
            frequency_hz: clamp_frequency(frequency_hz),
            amplitude: waveform.amplitude(),
        }
    }

    pub fn with_frequency(self, frequency_hz: f64) -> Self {
        Self::new(self.waveform, frequency_hz)
    }

    pub fn with_waveform(self, waveform: Waveform) -> Self {
        Self::new(waveform, self.frequency_hz)
    }
}

impl Default for ToneParameters {
    fn default() -> Self {
        Self::new(Waveform::Sine, DEFAULT_FREQUENCY)
    }
}

pub struct ToneEngine<H: AudioHost> {
    host: H,
    config: ToneConfig,
    context: Option<AudioContext>,
    voice: Option<Voice>,
    /// Parameters of the live voice, or of the next `start`.
    params: ToneParameters,
    contexts_created: u32,
}

impl<H: AudioHost> ToneEngine<H> {
    pub fn new(host: H, config: ToneConfig, waveform: Waveform) -> Self {
        ToneEngine {
            host,
            config,
            context: None,
            voice: None,
            params: ToneParameters::new(waveform, DEFAULT_FREQUENCY),
            contexts_created: 0,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.voice.is_some()
    }

    pub fn parameters(&self) -> ToneParameters {
        self.params
    }

    pub fn context_state(&self) -> Option<ContextState> {
        self.context.as_ref().map(AudioContext::state)
    }

    /// Number of contexts created over the engine's lifetime.
    pub fn contexts_created(&self) -> u32 {
        self.contexts_created
    }

    /// Frequency the live voice is currently producing (mid-glide).
    pub fn sounding_frequency(&self) -> Option<f64> {
        self.voice.as_ref().map(Voice::frequency)
    }

    pub fn sounding_gain(&self) -> Option<f64> {
        self.voice.as_ref().map(Voice::gain)
    }

    fn ensure_context(&mut self) -> Result<&mut AudioContext, ToneError> {
        let ctx = match self.context.take() {
            Some(ctx) if ctx.state() != ContextState::Closed => ctx,
            _ => {
                let sample_rate = match self.host.output_sample_rate() {
                    Some(rate) if rate.is_finite() && rate > 0.0 => rate,
                    Some(rate) => {
                        log::warn!("output device reports unusable sample rate {rate}");
                        return Err(ToneError::CapabilityUnavailable);
                    }
                    None => return Err(ToneError::CapabilityUnavailable),
                };
                log::info!("creating audio context at {sample_rate} Hz");
                self.contexts_created += 1;
                AudioContext::new(sample_rate)
            }
        };
        let ctx = self.context.insert(ctx);
        ctx.resume();
        Ok(ctx)
    }

    /// Start one voice with `params`, setting pitch and gain immediately.
    pub fn start(&mut self, params: ToneParameters) -> Result<(), ToneError> {
        if self.voice.is_some() {
            return Err(ToneError::AlreadyPlaying);
        }
        let params = ToneParameters::new(params.waveform, params.frequency_hz);
        let sample_rate = self.ensure_context()?.sample_rate();
        self.voice = Some(Voice::new(params.waveform, params.frequency_hz, sample_rate));
        self.params = params;
        log::debug!("voice started: {params:?}");
        Ok(())
    }

    /// Glide the live voice to `frequency_hz`. Without a voice only the
    /// parameters for the next `start` change.
    pub fn retune(&mut self, frequency_hz: f64) {
        self.params = self.params.with_frequency(frequency_hz);
        match self.voice.as_mut() {
            Some(voice) => voice.glide_to(self.params.frequency_hz, self.config.retune_time_constant),
            None => log::trace!("retune to {frequency_hz} Hz without a voice"),
        }
    }

    /// Switch waveform now, ramping gain to the new shape's amplitude.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.params = self.params.with_waveform(waveform);
        if let Some(voice) = self.voice.as_mut() {
            voice.change_waveform(waveform, self.config.gain_time_constant);
        }
    }

    /// Halt and release the voice. Does nothing when already stopped.
    pub fn stop(&mut self) {
        if self.voice.take().is_some() {
            log::debug!("voice stopped");
        }
    }

    /// Pause the output clock, e.g. while the page is hidden. The voice is
    /// kept and picks up where it left off on `resume` or the next `start`.
    pub fn suspend(&mut self) {
        if let Some(ctx) = self.context.as_mut() {
            ctx.suspend();
            log::debug!("audio context suspended at {:.2}s", ctx.current_time());
        }
    }

    /// Resume a suspended context. Does nothing without one.
    pub fn resume(&mut self) {
        if let Some(ctx) = self.context.as_mut() {
            ctx.resume();
        }
    }

    /// Release the audio context. The next `start` creates a new one.
    pub fn teardown(&mut self) {
        self.stop();
        if let Some(mut ctx) = self.context.take() {
            ctx.close();
            log::info!("audio context closed after {:.2}s", ctx.current_time());
        }
    }

    /// Render the next block of output. Silence when no context exists.
    pub fn render(&mut self, out: &mut [f32]) {
        let Some(ctx) = self.context.as_mut() else {
            out.fill(0.0);
            return;
        };
        let mut voice = self.voice.as_mut();
        ctx.render(out, || voice.as_mut().map_or(0.0, |v| v.next_sample()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ToneEngine<OutputDevice> {
        ToneEngine::new(OutputDevice::with_rate(44100.0), ToneConfig::default(), Waveform::Sine)
    }

    #[test]
    fn start_creates_one_voice_and_context() {
        let mut e = engine();
        e.start(ToneParameters::new(Waveform::Sine, 440.0)).unwrap();
        assert!(e.is_playing());
        assert_eq!(e.contexts_created(), 1);
        assert_eq!(e.sounding_frequency(), Some(440.0));
        assert_eq!(e.sounding_gain(), Some(0.3));
    }

    #[test]
    fn second_start_is_rejected() {
        let mut e = engine();
        e.start(ToneParameters::default()).unwrap();
        assert_eq!(e.start(ToneParameters::default()), Err(ToneError::AlreadyPlaying));
        assert!(e.is_playing());
    }

    #[test]
    fn no_audio_output_is_fatal() {
        let mut e = ToneEngine::new(
            OutputDevice::unavailable(),
            ToneConfig::default(),
            Waveform::Sine,
        );
        assert_eq!(
            e.start(ToneParameters::default()),
            Err(ToneError::CapabilityUnavailable)
        );
        assert!(!e.is_playing());
    }

    #[test]
    fn stop_start_reuses_context() {
        let mut e = engine();
        e.start(ToneParameters::default()).unwrap();
        e.stop();
        e.stop();
        assert!(!e.is_playing());
        e.start(ToneParameters::default()).unwrap();
        assert!(e.is_playing());
        assert_eq!(e.contexts_created(), 1);
    }

    #[test]
    fn teardown_forces_new_context() {
        let mut e = engine();
        e.start(ToneParameters::default()).unwrap();
        e.teardown();
        assert!(!e.is_playing());
        assert_eq!(e.context_state(), None);
        e.start(ToneParameters::default()).unwrap();
        assert_eq!(e.contexts_created(), 2);
        assert_eq!(e.context_state(), Some(ContextState::Running));
    }

    #[test]
    fn retune_glides_and_clamps() {
        let mut e = engine();
        e.start(ToneParameters::default()).unwrap();
        e.retune(5000.0);
        assert_eq!(e.parameters().frequency_hz, 2000.0);
        let mut buf = vec![0.0f32; 1];
        e.render(&mut buf);
        let f = e.sounding_frequency().unwrap();
        assert!(f > 440.0 && f < 500.0, "Retune should glide, got {f}");
    }

    #[test]
    fn retune_without_voice_only_updates_parameters() {
        let mut e = engine();
        e.retune(880.0);
        assert!(!e.is_playing());
        assert_eq!(e.context_state(), None);
        assert_eq!(e.parameters().frequency_hz, 880.0);
    }

    #[test]
    fn waveform_before_start_applies_on_start() {
        let mut e = engine();
        e.set_waveform(Waveform::Square);
        assert!(!e.is_playing());
        assert_eq!(e.context_state(), None, "No audio side effect before start");
        e.start(e.parameters()).unwrap();
        assert_eq!(e.parameters().waveform, Waveform::Square);
        assert_eq!(e.parameters().amplitude, 0.15);
        assert_eq!(e.sounding_gain(), Some(0.15));
    }

    #[test]
    fn waveform_while_playing_ramps_gain() {
        let mut e = engine();
        e.start(ToneParameters::default()).unwrap();
        e.set_waveform(Waveform::Sawtooth);
        let mut buf = vec![0.0f32; 4410];
        e.render(&mut buf);
        let g = e.sounding_gain().unwrap();
        assert!(g > 0.15 && g < 0.3, "Gain should be mid-ramp after 0.1s, got {g}");
    }

    #[test]
    fn unusable_sample_rate_is_fatal() {
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut e =
                ToneEngine::new(OutputDevice::with_rate(rate), ToneConfig::default(), Waveform::Sine);
            assert_eq!(
                e.start(ToneParameters::default()),
                Err(ToneError::CapabilityUnavailable),
                "rate {rate} must be rejected"
            );
            assert_eq!(e.contexts_created(), 0);
            let mut buf = vec![1.0f32; 8];
            e.render(&mut buf);
            assert!(buf.iter().all(|&s| s == 0.0), "rate {rate} rendered {buf:?}");
        }
    }

    #[test]
    fn suspended_context_is_silent_until_resumed() {
        let mut e = engine();
        e.start(ToneParameters::default()).unwrap();
        let mut buf = vec![0.0f32; 128];
        e.render(&mut buf);
        e.suspend();
        assert_eq!(e.context_state(), Some(ContextState::Suspended));
        e.render(&mut buf);
        assert!(buf.iter().all(|&s| s == 0.0));
        assert!(e.is_playing(), "Suspending keeps the voice");

        e.resume();
        assert_eq!(e.context_state(), Some(ContextState::Running));
        e.render(&mut buf);
        assert!(buf.iter().any(|&s| s.abs() > 0.01));
    }

    #[test]
    fn start_resumes_a_suspended_context() {
        let mut e = engine();
        e.start(ToneParameters::default()).unwrap();
        e.stop();
        e.suspend();
        e.start(ToneParameters::default()).unwrap();
        assert_eq!(e.context_state(), Some(ContextState::Running));
        assert_eq!(e.contexts_created(), 1);
    }

    #[test]
    fn suspend_without_context_is_a_no_op() {
        let mut e = engine();
        e.suspend();
        e.resume();
        assert_eq!(e.context_state(), None);
    }

    #[test]
    fn render_is_silent_without_voice() {
        let mut e = engine();
        let mut buf = vec![1.0f32; 128];
        e.render(&mut buf);
        assert!(buf.iter().all(|&s| s == 0.0));

        e.start(ToneParameters::default()).unwrap();
        e.render(&mut buf);
        assert!(buf.iter().any(|&s| s.abs() > 0.01));
        e.stop();
        e.render(&mut buf);
        assert!(buf.iter().all(|&s| s == 0.0));
    }
}
