//! Raw input-activity counters.
//!
//! Input hooks may bump these from any thread. The tracker drains them once
//! per tick and discards the values; classification never looks at them.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ActivityCounters {
    keystrokes: AtomicU64,
    mouse_moves: AtomicU64,
}

/// Counts drained by [`ActivityCounters::take`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivitySample {
    pub keystrokes: u64,
    pub mouse_moves: u64,
}

impl ActivityCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_keystroke(&self) {
        self.keystrokes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_mouse_move(&self) {
        self.mouse_moves.fetch_add(1, Ordering::Relaxed);
    }

    /// Return the counts since the last call and zero them.
    pub fn take(&self) -> ActivitySample {
        ActivitySample {
            keystrokes: self.keystrokes.swap(0, Ordering::Relaxed),
            mouse_moves: self.mouse_moves.swap(0, Ordering::Relaxed),
        }
    }
}
