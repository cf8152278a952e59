//! Audio generation context — the clock and output stage a voice plays into.
//!
//! In the browser the context's rendered blocks are pulled by an
//! AudioWorklet; natively they can be pulled by any output callback.

/// Lifecycle state of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Running,
    Suspended,
    Closed,
}

#[derive(Debug)]
pub struct AudioContext {
    sample_rate: f64,
    frames_rendered: u64,
    state: ContextState,
    /// Gain applied before the soft clipper.
    pub master_gain: f64,
}

impl AudioContext {
    pub fn new(sample_rate: f64) -> Self {
        AudioContext {
            sample_rate,
            frames_rendered: 0,
            state: ContextState::Running,
            master_gain: 1.0,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    /// Seconds of audio rendered since creation.
    pub fn current_time(&self) -> f64 {
        self.frames_rendered as f64 / self.sample_rate
    }

    pub fn suspend(&mut self) {
        if self.state == ContextState::Running {
            self.state = ContextState::Suspended;
        }
    }

    pub fn resume(&mut self) {
        if self.state == ContextState::Suspended {
            self.state = ContextState::Running;
        }
    }

    pub fn close(&mut self) {
        self.state = ContextState::Closed;
    }

    /// Fill `out` by pulling one sample per frame from `source`.
    ///
    /// A suspended or closed context writes silence and does not advance
    /// its clock or pull from the source.
    pub fn render<F>(&mut self, out: &mut [f32], mut source: F)
    where
        F: FnMut() -> f64,
    {
        if self.state != ContextState::Running {
            out.fill(0.0);
            return;
        }
        for slot in out.iter_mut() {
            *slot = soft_clip(source() * self.master_gain) as f32;
        }
        self.frames_rendered += out.len() as u64;
    }
}

/// Soft clipper using tanh to prevent harsh digital clipping.
fn soft_clip(x: f64) -> f64 {
    x.tanh()
}
