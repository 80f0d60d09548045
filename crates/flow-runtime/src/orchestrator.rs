//! Async tracking orchestrator.
//!
//! Owns a [`FocusTracker`] inside a single tokio task. Commands arrive over an
//! unbounded channel, [`UiEvent`]s leave through an `mpsc` channel, and the
//! cadence comes from an injected [`Ticker`] so tests can step it by hand.

use std::sync::Arc;
use std::time::Duration;

use flow_core::models::WindowObservation;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, warn};

use crate::activity::ActivityCounters;
use crate::probe::{ActiveWindowProbe, ProbeError};
use crate::ticker::Ticker;
use crate::tracker::{FocusTracker, UiEvent};

/// Default upper bound on a single probe call.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

// ── Public types ──────────────────────────────────────────────────────────────

/// Fire-and-forget commands from the UI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingCommand {
    Start,
    Stop,
}

// ── TrackingOrchestrator ──────────────────────────────────────────────────────

pub struct TrackingOrchestrator<T: Ticker> {
    tracker: FocusTracker,
    probe: Arc<dyn ActiveWindowProbe>,
    ticker: T,
    probe_timeout: Duration,
}

impl<T: Ticker> TrackingOrchestrator<T> {
    pub fn new(tracker: FocusTracker, probe: Arc<dyn ActiveWindowProbe>, ticker: T) -> Self {
        Self {
            tracker,
            probe,
            ticker,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Spawn the tracking loop.
    ///
    /// Returns the event stream for the UI and a [`TrackingHandle`] for
    /// sending commands. The loop ends when the handle is shut down, the
    /// event receiver is dropped, or the ticker is exhausted.
    pub fn start(self) -> (mpsc::Receiver<UiEvent>, TrackingHandle) {
        let (event_tx, event_rx) = mpsc::channel(16);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let activity = self.tracker.activity();

        let task = tokio::spawn(self.tracking_loop(command_rx, event_tx));

        (
            event_rx,
            TrackingHandle {
                commands: command_tx,
                activity,
                task,
            },
        )
    }

    // ── Private implementation ────────────────────────────────────────────

    async fn tracking_loop(
        self,
        mut commands: mpsc::UnboundedReceiver<TrackingCommand>,
        events: mpsc::Sender<UiEvent>,
    ) {
        let Self {
            mut tracker,
            probe,
            mut ticker,
            probe_timeout,
        } = self;

        loop {
            tokio::select! {
                biased;

                command = commands.recv() => {
                    let Some(command) = command else {
                        debug!("command channel closed; exiting tracking loop");
                        break;
                    };
                    if !emit(&events, apply_command(&mut tracker, command)).await {
                        break;
                    }
                }

                more = ticker.tick() => {
                    if !more {
                        debug!("ticker exhausted; exiting tracking loop");
                        break;
                    }
                    if !tracker.is_enabled() {
                        continue;
                    }

                    let probed = probe_with_timeout(Arc::clone(&probe), probe_timeout).await;

                    // Commands that arrived while the probe was in flight win;
                    // a stop here makes the tracker drop this result.
                    let mut closed = false;
                    loop {
                        match commands.try_recv() {
                            Ok(command) => {
                                if !emit(&events, apply_command(&mut tracker, command)).await {
                                    return;
                                }
                            }
                            Err(TryRecvError::Empty) => break,
                            Err(TryRecvError::Disconnected) => {
                                closed = true;
                                break;
                            }
                        }
                    }

                    if let Some(update) = tracker.tick(probed) {
                        if !emit(&events, UiEvent::StateChange(update)).await {
                            break;
                        }
                    }
                    if closed {
                        debug!("command channel closed; exiting tracking loop");
                        break;
                    }
                }
            }
        }
    }
}

fn apply_command(tracker: &mut FocusTracker, command: TrackingCommand) -> UiEvent {
    match command {
        TrackingCommand::Start => tracker.start(),
        TrackingCommand::Stop => tracker.stop(),
    }
}

/// Send `event`; `false` once the receiver is gone.
async fn emit(events: &mpsc::Sender<UiEvent>, event: UiEvent) -> bool {
    match events.send(event).await {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "event receiver dropped; exiting tracking loop");
            false
        }
    }
}

/// Run the probe on the blocking pool, giving up after `limit`.
///
/// A timed-out probe keeps its blocking thread until the platform call
/// returns; only the result is abandoned.
async fn probe_with_timeout(
    probe: Arc<dyn ActiveWindowProbe>,
    limit: Duration,
) -> Result<WindowObservation, ProbeError> {
    let task = tokio::task::spawn_blocking(move || probe.probe());
    match time::timeout(limit, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            warn!(error = %e, "probe task failed");
            Err(ProbeError::Join(e.to_string()))
        }
        Err(_) => {
            warn!(?limit, "probe timed out");
            Err(ProbeError::Timeout(limit))
        }
    }
}

// ── TrackingHandle ────────────────────────────────────────────────────────────

/// Handle to the background tracking task.
pub struct TrackingHandle {
    commands: mpsc::UnboundedSender<TrackingCommand>,
    activity: Arc<ActivityCounters>,
    task: JoinHandle<()>,
}

impl TrackingHandle {
    pub fn start_tracking(&self) {
        self.send(TrackingCommand::Start);
    }

    pub fn stop_tracking(&self) {
        self.send(TrackingCommand::Stop);
    }

    /// Counters for input hooks; drained and discarded on every tick.
    pub fn activity(&self) -> Arc<ActivityCounters> {
        Arc::clone(&self.activity)
    }

    /// Immediately abort the tracking loop.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Close the command channel and wait for the loop to finish its
    /// current tick.
    pub async fn shutdown(self) {
        let Self { commands, task, .. } = self;
        drop(commands);
        if let Err(e) = task.await {
            if !e.is_cancelled() {
                warn!(error = %e, "tracking task ended abnormally");
            }
        }
    }

    fn send(&self, command: TrackingCommand) {
        if self.commands.send(command).is_err() {
            warn!(?command, "tracking loop is gone; command dropped");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryAuditLog, RecordingOverlay, ScriptedProbe};
    use crate::ticker::{ManualTicker, ManualTickerHandle};
    use crate::tracker::TrackerConfig;
    use chrono::{TimeZone, Utc};
    use flow_core::clock::ManualClock;
    use flow_core::models::{Bounds, SessionState, StateUpdate};

    struct Running {
        events: mpsc::Receiver<UiEvent>,
        handle: TrackingHandle,
        ticks: ManualTickerHandle,
        probe: ScriptedProbe,
        overlay: RecordingOverlay,
        audit: MemoryAuditLog,
    }

    fn spawn(probe: ScriptedProbe, probe_timeout: Duration) -> Running {
        let overlay = RecordingOverlay::default();
        let audit = MemoryAuditLog::default();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap());
        let tracker = FocusTracker::new(
            TrackerConfig::default(),
            Box::new(overlay.clone()),
            Box::new(audit.clone()),
            Arc::new(clock),
        )
        .unwrap();
        let (ticker, ticks) = ManualTicker::new();

        let (events, handle) =
            TrackingOrchestrator::new(tracker, Arc::new(probe.clone()), ticker)
                .with_probe_timeout(probe_timeout)
                .start();

        Running {
            events,
            handle,
            ticks,
            probe,
            overlay,
            audit,
        }
    }

    async fn next(events: &mut mpsc::Receiver<UiEvent>) -> UiEvent {
        time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    async fn assert_quiet(events: &mut mpsc::Receiver<UiEvent>) {
        let got = time::timeout(Duration::from_millis(100), events.recv()).await;
        assert!(got.is_err(), "unexpected event: {got:?}");
    }

    fn editor() -> WindowObservation {
        WindowObservation::new("Code", "lib.rs").with_bounds(Bounds::new(50, 50, 1024, 768))
    }

    #[tokio::test]
    async fn test_start_and_stop_are_acknowledged() {
        let mut rt = spawn(ScriptedProbe::default(), DEFAULT_PROBE_TIMEOUT);

        rt.handle.start_tracking();
        assert_eq!(next(&mut rt.events).await, UiEvent::TrackingStarted);
        rt.handle.stop_tracking();
        assert_eq!(next(&mut rt.events).await, UiEvent::TrackingStopped);
        assert!(!rt.overlay.visible());

        rt.handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_ticks_ignored_until_started() {
        let mut rt = spawn(ScriptedProbe::default(), DEFAULT_PROBE_TIMEOUT);
        rt.probe.set(Some(editor()));

        rt.ticks.tick();
        assert_quiet(&mut rt.events).await;
        assert!(rt.audit.records().is_empty());

        rt.handle.start_tracking();
        assert_eq!(next(&mut rt.events).await, UiEvent::TrackingStarted);
        rt.ticks.tick();
        assert_eq!(
            next(&mut rt.events).await,
            UiEvent::StateChange(StateUpdate {
                state: SessionState::Tracking,
                score: 52
            })
        );

        rt.handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_one_state_change_per_active_tick() {
        let mut rt = spawn(ScriptedProbe::default(), DEFAULT_PROBE_TIMEOUT);
        rt.probe.set(Some(editor()));
        rt.handle.start_tracking();
        next(&mut rt.events).await;

        let mut states = Vec::new();
        for _ in 0..5 {
            rt.ticks.tick();
            match next(&mut rt.events).await {
                UiEvent::StateChange(update) => states.push(update.state),
                other => panic!("expected state change, got {other:?}"),
            }
        }
        assert_eq!(states.last(), Some(&SessionState::Focus));
        assert_eq!(rt.audit.records().len(), 5);
        assert!(rt.overlay.visible());
        assert_eq!(rt.overlay.set_bounds_count(), 1);

        rt.handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_activity_counters_drained_by_tick() {
        let mut rt = spawn(ScriptedProbe::default(), DEFAULT_PROBE_TIMEOUT);
        let activity = rt.handle.activity();
        rt.handle.start_tracking();
        next(&mut rt.events).await;

        activity.record_keystroke();
        activity.record_mouse_move();
        rt.ticks.tick();
        next(&mut rt.events).await;

        assert_eq!(activity.take(), crate::activity::ActivitySample::default());
        rt.handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_probe_timeout_degrades_to_no_window() {
        let probe = ScriptedProbe::with_delay(Duration::from_millis(300));
        probe.set(Some(editor()));
        let mut rt = spawn(probe, Duration::from_millis(20));
        rt.handle.start_tracking();
        next(&mut rt.events).await;

        rt.ticks.tick();
        assert_eq!(
            next(&mut rt.events).await,
            UiEvent::StateChange(StateUpdate {
                state: SessionState::Tracking,
                score: 40
            })
        );
        assert_eq!(rt.audit.records()[0].active_app, None);

        rt.handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_stop_during_probe_discards_result() {
        let probe = ScriptedProbe::with_delay(Duration::from_millis(150));
        probe.set(Some(editor()));
        let mut rt = spawn(probe, DEFAULT_PROBE_TIMEOUT);
        rt.handle.start_tracking();
        next(&mut rt.events).await;

        rt.ticks.tick();
        time::sleep(Duration::from_millis(30)).await;
        rt.handle.stop_tracking();

        assert_eq!(next(&mut rt.events).await, UiEvent::TrackingStopped);
        assert_quiet(&mut rt.events).await;
        assert!(rt.audit.records().is_empty());

        rt.handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_loop_exits_when_ticker_exhausted() {
        let rt = spawn(ScriptedProbe::default(), DEFAULT_PROBE_TIMEOUT);
        let Running {
            mut events, ticks, ..
        } = rt;
        drop(ticks);

        let closed = time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("loop did not exit");
        assert!(closed.is_none());
    }

    #[tokio::test]
    async fn test_abort_stops_task() {
        let rt = spawn(ScriptedProbe::default(), DEFAULT_PROBE_TIMEOUT);
        time::sleep(Duration::from_millis(20)).await;
        rt.handle.abort();
        rt.handle.shutdown().await;
    }
}
