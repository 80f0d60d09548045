//! Debouncing of the per-tick target signal into a stable [`SessionState`].
//!
//! Focus is hard to enter (a run of consecutive target ticks), easy to keep
//! (a hold window after each confirmation) and hard to lose (a run of
//! consecutive non-target ticks is required before WARN is committed).

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::models::{ProvisionalCategory, SessionState, StateUpdate};

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Consecutive target ticks needed before focus is entered.
pub const DEFAULT_FOCUS_THRESHOLD: u32 = 5;

/// Sticky-focus grace window, in milliseconds.
pub const DEFAULT_FOCUS_HOLD_MS: i64 = 4_000;

/// Consecutive non-target ticks needed before WARN is committed.
pub const DEFAULT_WARN_CONFIRM_TICKS: u32 = 2;

const SCORE_BASE: u32 = 40;
const SCORE_PER_TICK: u32 = 12;
const SCORE_MAX: u32 = 100;

// ── HysteresisConfig ──────────────────────────────────────────────────────────

/// Thresholds for the hysteresis controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HysteresisConfig {
    pub focus_threshold: u32,
    pub focus_hold: Duration,
    pub warn_confirm_ticks: u32,
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self {
            focus_threshold: DEFAULT_FOCUS_THRESHOLD,
            focus_hold: Duration::milliseconds(DEFAULT_FOCUS_HOLD_MS),
            warn_confirm_ticks: DEFAULT_WARN_CONFIRM_TICKS,
        }
    }
}

// ── HysteresisContext ─────────────────────────────────────────────────────────

/// Streak counters and the sticky-focus expiry.
///
/// Exactly one streak drives each tick: `active_streak` while the target is
/// frontmost, `warn_streak` while it is not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HysteresisContext {
    /// Ticks the target app has been continuously frontmost.
    pub active_streak: u32,
    /// Consecutive non-target ticks evaluated outside a hold window.
    pub warn_streak: u32,
    /// Focus is forced until this instant. Cleared only by a confirmed WARN
    /// or a context reset.
    pub focus_hold_until: Option<DateTime<Utc>>,
}

impl HysteresisContext {
    /// Whether the sticky-focus window is still open at `now`.
    pub fn hold_active(&self, now: DateTime<Utc>) -> bool {
        self.focus_hold_until.is_some_and(|until| now < until)
    }
}

// ── HysteresisController ──────────────────────────────────────────────────────

/// Owns a [`HysteresisContext`] and the committed [`SessionState`].
#[derive(Debug, Clone)]
pub struct HysteresisController {
    config: HysteresisConfig,
    context: HysteresisContext,
    state: SessionState,
}

impl HysteresisController {
    pub fn new(config: HysteresisConfig) -> Self {
        Self {
            config,
            context: HysteresisContext::default(),
            state: SessionState::Idle,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Advance one tick.
    ///
    /// `is_target` is the classifier's verdict for this tick and `now` the
    /// wall-clock time used for the hold window. Returns the committed state
    /// together with the display score.
    pub fn step(&mut self, is_target: bool, now: DateTime<Utc>) -> StateUpdate {
        let previous = self.state;

        if is_target {
            self.context.active_streak = self.context.active_streak.saturating_add(1);
            self.context.warn_streak = 0;
        } else {
            self.context.active_streak = 0;
        }

        let provisional = self.provisional();

        if self.context.hold_active(now) {
            self.state = SessionState::Focus;
        } else {
            match provisional {
                ProvisionalCategory::Focus => {
                    self.state = SessionState::Focus;
                    self.context.focus_hold_until = Some(now + self.config.focus_hold);
                }
                ProvisionalCategory::Tracking => {
                    self.state = SessionState::Tracking;
                }
                ProvisionalCategory::Warn => {
                    self.context.warn_streak = self.context.warn_streak.saturating_add(1);
                    if self.context.warn_streak >= self.config.warn_confirm_ticks {
                        self.state = SessionState::Warn;
                        self.context.focus_hold_until = None;
                    }
                }
            }
        }

        let score = score_for_streak(self.context.active_streak);

        debug!(
            is_target,
            ?provisional,
            active_streak = self.context.active_streak,
            warn_streak = self.context.warn_streak,
            state = %self.state,
            score,
            "hysteresis step"
        );
        if previous != self.state {
            info!(from = %previous, to = %self.state, "session state changed");
        }

        StateUpdate {
            state: self.state,
            score,
        }
    }

    /// Provisional category implied by the current active streak.
    pub fn provisional(&self) -> ProvisionalCategory {
        let streak = self.context.active_streak;
        if streak >= self.config.focus_threshold {
            ProvisionalCategory::Focus
        } else if streak > 0 {
            ProvisionalCategory::Tracking
        } else {
            ProvisionalCategory::Warn
        }
    }

    /// Overwrite the committed state. Used by the start and stop commands.
    pub fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    /// Drop all streaks and any pending hold.
    pub fn reset_context(&mut self) {
        self.context = HysteresisContext::default();
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn context(&self) -> &HysteresisContext {
        &self.context
    }

    pub fn config(&self) -> &HysteresisConfig {
        &self.config
    }
}

impl Default for HysteresisController {
    fn default() -> Self {
        Self::new(HysteresisConfig::default())
    }
}

/// Display score: `min(100, 40 + streak * 12)`.
pub fn score_for_streak(active_streak: u32) -> u8 {
    let raw = SCORE_BASE.saturating_add(active_streak.saturating_mul(SCORE_PER_TICK));
    raw.min(SCORE_MAX) as u8
}

// ── Tests ─────────────────────────────────────────────────────────────────────
