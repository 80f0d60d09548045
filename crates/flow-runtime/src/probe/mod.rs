//! Foreground-window probing.
//!
//! A probe reports the owner, title and bounds of whatever window is in front.
//! It is best-effort: every failure comes back as a [`ProbeError`], which the
//! tracker collapses to "no window" before classification.

use std::sync::Arc;
use std::time::Duration;

use flow_core::models::WindowObservation;
use thiserror::Error;

#[cfg(target_os = "linux")]
pub mod x11;

/// Why a probe produced no observation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// No window-system backend is available on this machine.
    #[error("window probe unavailable: {0}")]
    Unavailable(String),

    /// The window manager reports no focused window.
    #[error("no active window")]
    NoActiveWindow,

    /// The platform API returned an error.
    #[error("platform error: {0}")]
    Platform(String),

    /// The probe did not answer within the configured timeout.
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    /// The blocking probe task panicked or was cancelled.
    #[error("probe task failed: {0}")]
    Join(String),
}

/// Source of foreground-window observations.
///
/// Implementations may block; the orchestrator calls them on the blocking
/// thread pool.
pub trait ActiveWindowProbe: Send + Sync + 'static {
    fn probe(&self) -> Result<WindowObservation, ProbeError>;
}

/// Probe used when no backend could be initialised. Always fails.
#[derive(Debug, Clone)]
pub struct UnavailableProbe {
    reason: String,
}

impl UnavailableProbe {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ActiveWindowProbe for UnavailableProbe {
    fn probe(&self) -> Result<WindowObservation, ProbeError> {
        Err(ProbeError::Unavailable(self.reason.clone()))
    }
}

/// Best probe for the current platform, falling back to [`UnavailableProbe`].
#[cfg(target_os = "linux")]
pub fn native_probe() -> Arc<dyn ActiveWindowProbe> {
    match x11::X11Probe::connect() {
        Ok(probe) => Arc::new(probe),
        Err(e) => {
            tracing::warn!(error = %e, "X11 probe unavailable; every tick will count as away");
            Arc::new(UnavailableProbe::new(e.to_string()))
        }
    }
}

/// Best probe for the current platform, falling back to [`UnavailableProbe`].
#[cfg(not(target_os = "linux"))]
pub fn native_probe() -> Arc<dyn ActiveWindowProbe> {
    tracing::warn!("no window probe for this platform; every tick will count as away");
    Arc::new(UnavailableProbe::new("unsupported platform"))
}
