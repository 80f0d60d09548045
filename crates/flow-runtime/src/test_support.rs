//! Fakes shared by the tracker and orchestrator tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use flow_core::error::{FlowError, Result};
use flow_core::models::{AuditRecord, WindowObservation};
use flow_core::placement::OverlayGeometry;
use flow_data::audit::AuditLog;

use crate::overlay::{OverlayError, OverlayWindow};
use crate::probe::{ActiveWindowProbe, ProbeError};

// ── Overlay ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayCall {
    Show,
    Hide,
    SetBounds(OverlayGeometry),
}

/// Overlay that records every call into a shared log.
///
/// While `set_rejecting(true)` is in effect every `set_bounds` is recorded
/// and then refused.
#[derive(Clone, Default)]
pub struct RecordingOverlay {
    pub calls: Arc<Mutex<Vec<OverlayCall>>>,
    visible: Arc<Mutex<bool>>,
    rejecting: Arc<Mutex<bool>>,
}

impl RecordingOverlay {
    pub fn calls(&self) -> Vec<OverlayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_bounds_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, OverlayCall::SetBounds(_)))
            .count()
    }

    pub fn visible(&self) -> bool {
        *self.visible.lock().unwrap()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn set_rejecting(&self, rejecting: bool) {
        *self.rejecting.lock().unwrap() = rejecting;
    }
}

impl OverlayWindow for RecordingOverlay {
    fn show(&mut self) {
        self.calls.lock().unwrap().push(OverlayCall::Show);
        *self.visible.lock().unwrap() = true;
    }

    fn hide(&mut self) {
        self.calls.lock().unwrap().push(OverlayCall::Hide);
        *self.visible.lock().unwrap() = false;
    }

    fn set_bounds(&mut self, geometry: OverlayGeometry) -> std::result::Result<(), OverlayError> {
        self.calls
            .lock()
            .unwrap()
            .push(OverlayCall::SetBounds(geometry));
        if *self.rejecting.lock().unwrap() {
            return Err(OverlayError::Rejected {
                geometry,
                reason: "scripted rejection".to_string(),
            });
        }
        Ok(())
    }

    fn is_visible(&self) -> bool {
        self.visible()
    }
}

// ── Audit ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemoryAuditLog {
    pub records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl MemoryAuditLog {
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl AuditLog for MemoryAuditLog {
    fn append(&mut self, record: &AuditRecord) -> Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Audit log whose every append fails, counting the attempts.
#[derive(Clone, Default)]
pub struct FailingAuditLog {
    pub attempts: Arc<Mutex<usize>>,
}

impl FailingAuditLog {
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

impl AuditLog for FailingAuditLog {
    fn append(&mut self, _record: &AuditRecord) -> Result<()> {
        *self.attempts.lock().unwrap() += 1;
        Err(FlowError::FileWrite {
            path: "/ro/audit.jsonl".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}

// ── Probe ─────────────────────────────────────────────────────────────────────

/// Probe returning whatever the test last scripted, optionally after a delay.
#[derive(Clone, Default)]
pub struct ScriptedProbe {
    next: Arc<Mutex<Option<WindowObservation>>>,
    delay: Option<Duration>,
}

impl ScriptedProbe {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set(&self, observation: Option<WindowObservation>) {
        *self.next.lock().unwrap() = observation;
    }
}

impl ActiveWindowProbe for ScriptedProbe {
    fn probe(&self) -> std::result::Result<WindowObservation, ProbeError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.next
            .lock()
            .unwrap()
            .clone()
            .ok_or(ProbeError::NoActiveWindow)
    }
}
