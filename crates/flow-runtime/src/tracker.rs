//! Synchronous per-tick tracking core.
//!
//! [`FocusTracker`] wires classifier, hysteresis, placement, overlay and audit
//! log together. It never sleeps and never probes on its own: the
//! orchestrator hands it each probe result, which keeps every decision
//! testable with a manual clock.

use std::sync::Arc;

use flow_core::classifier::FocusClassifier;
use flow_core::clock::Clock;
use flow_core::error::Result;
use flow_core::hysteresis::{HysteresisConfig, HysteresisController};
use flow_core::models::{
    AuditRecord, SessionState, StateUpdate, WindowObservation, DEFAULT_TICK_MS,
};
use flow_core::placement::{OverlayPlacementPolicy, PlacementConfig};
use flow_data::audit::AuditLog;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::activity::ActivityCounters;
use crate::overlay::{apply_overlay_command, OverlayWindow};
use crate::probe::ProbeError;

// ── Public types ──────────────────────────────────────────────────────────────

/// Events sent from the runtime to the UI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum UiEvent {
    TrackingStarted,
    TrackingStopped,
    StateChange(StateUpdate),
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Case-insensitive regex matched against `"owner title"`.
    pub target_pattern: String,
    pub hysteresis: HysteresisConfig,
    pub placement: PlacementConfig,
    /// Clear streaks and the focus hold when tracking stops.
    pub reset_on_stop: bool,
    /// Sampling interval, stamped on every audit record.
    pub tick_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            target_pattern: flow_core::classifier::DEFAULT_TARGET_PATTERN.to_string(),
            hysteresis: HysteresisConfig::default(),
            placement: PlacementConfig::default(),
            reset_on_stop: false,
            tick_ms: DEFAULT_TICK_MS,
        }
    }
}

// ── FocusTracker ──────────────────────────────────────────────────────────────

pub struct FocusTracker {
    classifier: FocusClassifier,
    hysteresis: HysteresisController,
    placement: OverlayPlacementPolicy,
    overlay: Box<dyn OverlayWindow>,
    audit: Box<dyn AuditLog>,
    clock: Arc<dyn Clock>,
    activity: Arc<ActivityCounters>,
    reset_on_stop: bool,
    tick_ms: u64,
    enabled: bool,
}

impl FocusTracker {
    /// Fails only when the target pattern is not a valid regex.
    pub fn new(
        config: TrackerConfig,
        overlay: Box<dyn OverlayWindow>,
        audit: Box<dyn AuditLog>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Ok(Self {
            classifier: FocusClassifier::new(&config.target_pattern)?,
            hysteresis: HysteresisController::new(config.hysteresis),
            placement: OverlayPlacementPolicy::new(config.placement),
            overlay,
            audit,
            clock,
            activity: Arc::new(ActivityCounters::new()),
            reset_on_stop: config.reset_on_stop,
            tick_ms: config.tick_ms,
            enabled: false,
        })
    }

    /// Enable ticking and put the session into `Tracking`.
    pub fn start(&mut self) -> UiEvent {
        self.enabled = true;
        self.hysteresis.set_state(SessionState::Tracking);
        info!(pattern = self.classifier.pattern(), "tracking started");
        UiEvent::TrackingStarted
    }

    /// Disable ticking, go `Idle` and hide the overlay.
    pub fn stop(&mut self) -> UiEvent {
        self.enabled = false;
        self.hysteresis.set_state(SessionState::Idle);
        self.overlay.hide();
        if self.reset_on_stop {
            self.hysteresis.reset_context();
            debug!("hysteresis context cleared on stop");
        }
        info!("tracking stopped");
        UiEvent::TrackingStopped
    }

    /// Run one tick against a probe result.
    ///
    /// Returns `None` without touching any state when tracking is disabled,
    /// which also discards results of probes that were in flight during a stop.
    pub fn tick(
        &mut self,
        probed: std::result::Result<WindowObservation, ProbeError>,
    ) -> Option<StateUpdate> {
        if !self.enabled {
            debug!("tick ignored; tracking disabled");
            return None;
        }

        let now = self.clock.now();
        // Sampled only to keep the counters bounded.
        let _ = self.activity.take();

        let observation = match probed {
            Ok(obs) => Some(obs),
            Err(e) => {
                debug!(error = %e, "no window observation this tick");
                None
            }
        };

        let is_target = self.classifier.is_target(observation.as_ref());
        let update = self.hysteresis.step(is_target, now);

        let bounds = observation.as_ref().and_then(|o| o.bounds.as_ref());
        let command = self.placement.decide(update.state, bounds);
        apply_overlay_command(command, &mut self.placement, self.overlay.as_mut());

        let record = AuditRecord {
            timestamp: now,
            active_app: observation.as_ref().and_then(WindowObservation::active_app_label),
            score: update.score,
            state: update.state,
            tick_ms: self.tick_ms,
        };
        if let Err(e) = self.audit.append(&record) {
            warn!(error = %e, "failed to append audit record");
        }

        Some(update)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn state(&self) -> SessionState {
        self.hysteresis.state()
    }

    pub fn hysteresis(&self) -> &HysteresisController {
        &self.hysteresis
    }

    pub fn placement(&self) -> &OverlayPlacementPolicy {
        &self.placement
    }

    /// Shared counters for input hooks to bump.
    pub fn activity(&self) -> Arc<ActivityCounters> {
        Arc::clone(&self.activity)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
