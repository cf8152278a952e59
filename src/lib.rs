pub mod config;
pub mod dsp;
pub mod error;
pub mod mapper;
pub mod motion;
pub mod session;
pub mod tone;

use crate::config::{SessionConfig, device_sample_rate};
use crate::dsp::oscillator::Waveform;
use crate::mapper::FaderTrack;
use crate::motion::sample::MotionSample;
use crate::motion::subscription::{HostPermission, MotionHub, PermissionOutcome};
use crate::session::{InputMode, SessionController};
use crate::tone::OutputDevice;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the otohifu-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: format a frequency for the four-digit display.
#[wasm_bindgen]
pub fn format_frequency(freq: f64) -> String {
    mapper::format_frequency(freq)
}

/// WASM-exposed: waveform options as `[{ value, label }]` for the selector.
#[wasm_bindgen]
pub fn waveform_options() -> Result<JsValue, JsValue> {
    let options: Vec<serde_json::Value> = Waveform::ALL
        .iter()
        .map(|w| serde_json::json!({ "value": w, "label": w.display_name() }))
        .collect();
    serde_wasm_bindgen::to_value(&options).map_err(|e| JsValue::from_str(&format!("{e}")))
}

fn to_js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Decode a JS config object; `undefined`/`null` means defaults.
fn config_from_js(config: JsValue) -> Result<SessionConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(SessionConfig::default());
    }
    let config: SessionConfig = serde_wasm_bindgen::from_value(config).map_err(to_js_err)?;
    config.validate().map_err(to_js_err)?;
    Ok(config)
}

type HostSession = SessionController<OutputDevice, MotionHub, HostPermission>;

/// WASM-exposed session. The page forwards user intents and
/// `devicemotion` events here and pulls audio blocks from `render` inside
/// its AudioWorklet.
#[wasm_bindgen]
pub struct WasmSession {
    inner: HostSession,
}

#[wasm_bindgen]
impl WasmSession {
    /// `sample_rate` is the page's output rate; pass `audio_available =
    /// false` when the browser has no Web Audio support.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config: JsValue,
        audio_available: bool,
        sample_rate: Option<f64>,
        motion_available: bool,
        requires_permission: bool,
    ) -> Result<WasmSession, JsValue> {
        let config = config_from_js(config)?;
        let device = if audio_available {
            let rate = sample_rate.unwrap_or(config.tone.sample_rate);
            OutputDevice::with_rate(device_sample_rate(rate).map_err(to_js_err)?)
        } else {
            OutputDevice::unavailable()
        };
        let inner = SessionController::new(
            &config,
            device,
            MotionHub::new(motion_available),
            HostPermission::new(requires_permission),
        )
        .map_err(to_js_err)?;
        Ok(WasmSession { inner })
    }

    /// Switch between `"manual"` and `"motion"` input while idle.
    pub fn set_input_mode(&mut self, mode: &str) -> Result<(), JsValue> {
        let mode = match mode {
            "manual" => InputMode::Manual,
            "motion" => InputMode::Motion,
            other => return Err(JsValue::from_str(&format!("unknown input mode `{other}`"))),
        };
        self.inner.set_input_mode(mode);
        Ok(())
    }

    /// Play/stop button. Returns the new state name. When it returns
    /// `"acquiringPermission"` the page must call
    /// `DeviceMotionEvent.requestPermission()` and report the answer.
    pub fn toggle(&mut self) -> Result<String, JsValue> {
        let state = self.inner.toggle().map_err(to_js_err)?;
        Ok(state.as_str().to_string())
    }

    pub fn resolve_permission(&mut self, granted: bool) -> Result<String, JsValue> {
        let outcome = if granted {
            PermissionOutcome::Granted
        } else {
            PermissionOutcome::Denied
        };
        let state = self.inner.resolve_permission(outcome).map_err(to_js_err)?;
        Ok(state.as_str().to_string())
    }

    /// The permission request threw instead of answering.
    pub fn permission_failed(&mut self, reason: String) -> Result<String, JsValue> {
        let state = self
            .inner
            .resolve_permission(PermissionOutcome::Failed(reason))
            .map_err(to_js_err)?;
        Ok(state.as_str().to_string())
    }

    /// Forward one `devicemotion` acceleration reading.
    pub fn on_motion(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) -> Option<f64> {
        self.inner.on_motion(&MotionSample::new(x, y, z))
    }

    /// Whether the page should keep its `devicemotion` listener attached.
    pub fn wants_motion_events(&self) -> bool {
        self.inner.motion_source().wants_events()
    }

    pub fn set_fader(&mut self, pointer: f64, track_top: f64, track_bottom: f64) -> f64 {
        self.inner
            .set_fader(pointer, &FaderTrack::new(track_top, track_bottom))
    }

    pub fn set_frequency(&mut self, freq: f64) -> f64 {
        self.inner.set_frequency(freq)
    }

    pub fn set_waveform(&mut self, name: &str) -> Result<(), JsValue> {
        let waveform: Waveform = name.parse().map_err(to_js_err)?;
        self.inner.set_waveform(waveform);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// Call from `visibilitychange` when the page is hidden.
    pub fn suspend(&mut self) {
        self.inner.suspend_output();
    }

    pub fn resume(&mut self) {
        self.inner.resume_output();
    }

    /// Render `frames` mono samples for the AudioWorklet.
    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0f32; frames];
        self.inner.render(&mut out);
        out
    }

    pub fn teardown(&mut self) {
        self.inner.teardown();
    }

    pub fn frequency(&self) -> f64 {
        self.inner.frequency()
    }

    pub fn frequency_display(&self) -> String {
        self.inner.frequency_display()
    }

    pub fn waveform_name(&self) -> String {
        self.inner.waveform().display_name().to_string()
    }

    pub fn is_playing(&self) -> bool {
        self.inner.is_playing()
    }

    pub fn sensor_active(&self) -> bool {
        self.inner.sensor_active()
    }

    pub fn button_label(&self) -> String {
        self.inner.button_label().to_string()
    }

    /// Message to show the user, if the last action ran into a problem.
    pub fn notice(&self) -> Option<String> {
        self.inner.notice().map(|e| e.to_string())
    }

    pub fn filter_state(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.filter_state()).map_err(to_js_err)
    }
}
