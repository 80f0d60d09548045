//! Overlay geometry decisions.
//!
//! The overlay is only shown in [`SessionState::Focus`] and hugs the focused
//! window with a fixed margin. Geometry changes smaller than the jitter
//! threshold are ignored so window-manager noise does not make the overlay
//! twitch.

use serde::{Deserialize, Serialize};

use crate::models::{Bounds, SessionState};

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Padding added on every side of the focused window.
pub const DEFAULT_MARGIN_PX: i32 = 8;

/// A reposition is skipped when every field moved by less than this.
pub const DEFAULT_JITTER_PX: i32 = 4;

pub const MIN_OVERLAY_WIDTH: i32 = 100;
pub const MIN_OVERLAY_HEIGHT: i32 = 50;

// ── OverlayGeometry ───────────────────────────────────────────────────────────

/// Screen rectangle the overlay window occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayGeometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl OverlayGeometry {
    /// Expand `bounds` by `margin` on each side, clamped to the screen origin
    /// and to the minimum overlay size.
    pub fn padded(bounds: &Bounds, margin: i32) -> Self {
        let twice = margin.saturating_mul(2);
        Self {
            x: bounds.x.saturating_sub(margin).max(0),
            y: bounds.y.saturating_sub(margin).max(0),
            width: bounds.width.saturating_add(twice).max(MIN_OVERLAY_WIDTH),
            height: bounds.height.saturating_add(twice).max(MIN_OVERLAY_HEIGHT),
        }
    }

    /// `true` when every field of `other` is strictly closer than `threshold`.
    pub fn within_jitter(&self, other: &OverlayGeometry, threshold: i32) -> bool {
        let close = |a: i32, b: i32| (i64::from(a) - i64::from(b)).abs() < i64::from(threshold);
        close(self.x, other.x)
            && close(self.y, other.y)
            && close(self.width, other.width)
            && close(self.height, other.height)
    }
}

// ── OverlayCommand ────────────────────────────────────────────────────────────

/// What the overlay window should do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayCommand {
    /// Hide the overlay if it is visible.
    Hide,
    /// Keep the current placement and make sure the overlay is visible.
    Show,
    /// Reposition to the given geometry, then show.
    Move(OverlayGeometry),
}

// ── OverlayPlacementPolicy ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementConfig {
    pub margin_px: i32,
    pub jitter_px: i32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            margin_px: DEFAULT_MARGIN_PX,
            jitter_px: DEFAULT_JITTER_PX,
        }
    }
}

/// Decides overlay visibility and geometry, remembering the last geometry the
/// overlay actually accepted.
#[derive(Debug, Clone, Default)]
pub struct OverlayPlacementPolicy {
    config: PlacementConfig,
    last_applied: Option<OverlayGeometry>,
}

impl OverlayPlacementPolicy {
    pub fn new(config: PlacementConfig) -> Self {
        Self {
            config,
            last_applied: None,
        }
    }

    /// Command for the given state and window bounds. Does not mutate.
    pub fn decide(&self, state: SessionState, bounds: Option<&Bounds>) -> OverlayCommand {
        let bounds = match (state, bounds) {
            (SessionState::Focus, Some(b)) => b,
            _ => return OverlayCommand::Hide,
        };

        let target = OverlayGeometry::padded(bounds, self.config.margin_px);
        match &self.last_applied {
            Some(last) if last.within_jitter(&target, self.config.jitter_px) => {
                OverlayCommand::Show
            }
            _ => OverlayCommand::Move(target),
        }
    }

    /// Remember `geometry` as applied; later decisions compare against it.
    pub fn record_applied(&mut self, geometry: OverlayGeometry) {
        self.last_applied = Some(geometry);
    }

    pub fn last_applied(&self) -> Option<&OverlayGeometry> {
        self.last_applied.as_ref()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
