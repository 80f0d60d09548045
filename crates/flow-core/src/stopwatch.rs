//! Productive-time stopwatch: counts time spent in focus while tracking.

use std::time::Duration;

use crate::formatting::format_hms;
use crate::models::{SessionState, StateUpdate};

#[derive(Debug, Clone, Default)]
pub struct FocusStopwatch {
    elapsed: Duration,
}

impl FocusStopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit one tick of length `tick` if the update is in focus.
    pub fn observe(&mut self, update: &StateUpdate, tick: Duration) {
        if update.state == SessionState::Focus {
            self.elapsed += tick;
        }
    }

    /// Back to zero; called when tracking stops.
    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Elapsed focus time as `HH:MM:SS`.
    pub fn display(&self) -> String {
        format_hms(self.elapsed.as_secs())
    }
}
