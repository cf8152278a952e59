use thiserror::Error;

/// Failures raised by the tone engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToneError {
    /// The platform offers no audio output.
    #[error("audio output is not available on this platform")]
    CapabilityUnavailable,
    /// `start` was called while a voice is already sounding.
    #[error("a tone is already playing")]
    AlreadyPlaying,
}

/// Failures raised by the session controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Tone(#[from] ToneError),
    /// The user refused motion-sensor access. Manual mode stays usable.
    #[error("motion sensor access was denied")]
    PermissionDenied,
    /// The device reports no motion sensor at all.
    #[error("this device has no motion sensor")]
    MotionUnavailable,
}

/// Failures while loading a [`crate::config::SessionConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
