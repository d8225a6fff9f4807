use std::time::{Duration, Instant};

/// Pausable time accumulator driving the `iTime` uniform.
///
/// Not a wall clock: elapsed time only accumulates while ticking, by the
/// delta between successive samples. Pausing freezes the value where it is
/// and resuming continues from there; the value never jumps or resets.
pub struct FrameClock {
    elapsed: Duration,
    last_sample: Option<Instant>,
    ticking: bool,
}

impl FrameClock {
    /// Starts ticking, at zero elapsed time.
    pub fn new() -> Self {
        Self {
            elapsed: Duration::ZERO,
            last_sample: None,
            ticking: true,
        }
    }

    /// Advances the accumulator to `now`. While paused this only refreshes
    /// the sample point, so un-pausing does not replay the paused span.
    pub fn tick(&mut self, now: Instant) {
        if self.ticking {
            if let Some(last) = self.last_sample {
                self.elapsed += now.saturating_duration_since(last);
            }
        }
        self.last_sample = Some(now);
    }

    /// Flips between ticking and paused; returns the new ticking state.
    pub fn toggle(&mut self, now: Instant) -> bool {
        self.ticking = !self.ticking;
        self.last_sample = Some(now);
        self.ticking
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking
    }

    /// Accumulated time in seconds, as bound to the shader.
    pub fn seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
