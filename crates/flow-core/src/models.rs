use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tick length assumed for audit records written without one.
pub const DEFAULT_TICK_MS: u64 = 1_000;

/// Screen-space rectangle of a window, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// What the probe saw in the foreground on a single tick.
///
/// Produced fresh every tick; carries no identity beyond it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowObservation {
    /// Name of the process owning the window (e.g. `"Code"`).
    pub owner_name: String,
    /// Window title as reported by the window manager.
    pub title: String,
    /// Window rectangle, when the platform exposes it.
    pub bounds: Option<Bounds>,
}

impl WindowObservation {
    pub fn new(owner_name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            owner_name: owner_name.into(),
            title: title.into(),
            bounds: None,
        }
    }

    /// Builder-style setter for the window rectangle.
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// `"{owner} {title}"`, the string the target pattern is matched against.
    pub fn match_text(&self) -> String {
        format!("{} {}", self.owner_name, self.title)
    }

    /// Label recorded in the audit log: owner name, else title, else nothing.
    pub fn active_app_label(&self) -> Option<String> {
        if !self.owner_name.is_empty() {
            Some(self.owner_name.clone())
        } else if !self.title.is_empty() {
            Some(self.title.clone())
        } else {
            None
        }
    }
}

/// Authoritative, externally visible tracking state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionState {
    /// Tracking is off.
    #[default]
    Idle,
    /// Tracking is on but focus has not been established.
    Tracking,
    /// Sustained presence on the target application.
    Focus,
    /// Confirmed absence from the target application.
    Warn,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "IDLE",
            SessionState::Tracking => "TRACKING",
            SessionState::Focus => "FOCUS",
            SessionState::Warn => "WARN",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-tick attention category derived only from the active streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionalCategory {
    Focus,
    Tracking,
    Warn,
}

/// Payload of the `state-change` broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateUpdate {
    pub state: SessionState,
    /// Display-only score in `0..=100`.
    pub score: u8,
}

/// One line of the append-only audit log, written once per active tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    /// Owner name, falling back to the title; `None` when nothing was visible.
    pub active_app: Option<String>,
    pub score: u8,
    pub state: SessionState,
    /// Length of the tick this record stands for, in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

fn default_tick_ms() -> u64 {
    DEFAULT_TICK_MS
}
