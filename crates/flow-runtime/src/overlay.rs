//! Overlay window boundary.
//!
//! The runtime never renders anything: it only tells an [`OverlayWindow`]
//! whether to be visible and where. [`apply_overlay_command`] turns an
//! [`OverlayCommand`] into those calls and keeps the placement policy's
//! "last applied" geometry in step with what the window accepted.

use flow_core::placement::{OverlayCommand, OverlayGeometry, OverlayPlacementPolicy};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OverlayError {
    /// The platform refused the requested geometry.
    #[error("overlay rejected bounds {geometry:?}: {reason}")]
    Rejected {
        geometry: OverlayGeometry,
        reason: String,
    },
}

/// Commands the runtime issues to the highlight window.
pub trait OverlayWindow: Send {
    fn show(&mut self);
    fn hide(&mut self);
    fn set_bounds(&mut self, geometry: OverlayGeometry) -> Result<(), OverlayError>;
    fn is_visible(&self) -> bool;
}

/// Execute `command` against `window`.
///
/// A rejected reposition is logged and leaves the overlay as it was; the next
/// successful tick corrects it.
pub fn apply_overlay_command(
    command: OverlayCommand,
    policy: &mut OverlayPlacementPolicy,
    window: &mut dyn OverlayWindow,
) {
    match command {
        OverlayCommand::Hide => {
            if window.is_visible() {
                window.hide();
                debug!("overlay hidden");
            }
        }
        OverlayCommand::Show => {
            window.show();
            debug!("overlay kept at current placement");
        }
        OverlayCommand::Move(geometry) => match window.set_bounds(geometry) {
            Ok(()) => {
                window.show();
                policy.record_applied(geometry);
                debug!(?geometry, "overlay moved");
            }
            Err(e) => warn!(error = %e, "failed to apply overlay bounds"),
        },
    }
}

// ── HeadlessOverlay ───────────────────────────────────────────────────────────

/// Overlay that only remembers and logs what it was told.
///
/// Used by the CLI, which has no window to draw into. Geometry with a
/// non-positive size is rejected the way a real window system would.
#[derive(Debug, Clone, Default)]
pub struct HeadlessOverlay {
    visible: bool,
    bounds: Option<OverlayGeometry>,
}

impl HeadlessOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bounds(&self) -> Option<OverlayGeometry> {
        self.bounds
    }
}

impl OverlayWindow for HeadlessOverlay {
    fn show(&mut self) {
        if !self.visible {
            info!(bounds = ?self.bounds, "overlay shown");
        }
        self.visible = true;
    }

    fn hide(&mut self) {
        if self.visible {
            info!("overlay hidden");
        }
        self.visible = false;
    }

    fn set_bounds(&mut self, geometry: OverlayGeometry) -> Result<(), OverlayError> {
        if geometry.width <= 0 || geometry.height <= 0 {
            return Err(OverlayError::Rejected {
                geometry,
                reason: "non-positive size".to_string(),
            });
        }
        self.bounds = Some(geometry);
        Ok(())
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
