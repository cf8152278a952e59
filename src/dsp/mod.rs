//! DSP — pure Rust tone synthesis.
//!
//! The same code runs in the browser (AudioWorklet pulling blocks from
//! WASM) and natively, so the tone is identical on every platform.

pub mod context;
pub mod oscillator;
pub mod param;
pub mod voice;
