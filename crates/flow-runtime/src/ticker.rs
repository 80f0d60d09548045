//! Tick scheduling for the tracking loop.
//!
//! The loop never sleeps on its own; it waits on a [`Ticker`]. Production code
//! uses [`IntervalTicker`], tests drive a [`ManualTicker`] one tick at a time.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Interval, MissedTickBehavior};

/// Source of tick instants.
pub trait Ticker: Send + 'static {
    /// Wait for the next tick. `false` means the ticker is exhausted and the
    /// loop should stop.
    fn tick(&mut self) -> impl Future<Output = bool> + Send;
}

// ── IntervalTicker ────────────────────────────────────────────────────────────

/// Fixed-cadence ticker on top of [`tokio::time::Interval`].
///
/// Missed ticks are delayed rather than burst, so a slow probe pushes the
/// following ticks back instead of causing a catch-up flurry.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// Must be called from within a tokio runtime.
    pub fn new(period: Duration) -> Self {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

impl Ticker for IntervalTicker {
    fn tick(&mut self) -> impl Future<Output = bool> + Send {
        async move {
            self.interval.tick().await;
            true
        }
    }
}

// ── ManualTicker ──────────────────────────────────────────────────────────────

/// Ticker that fires only when its [`ManualTickerHandle`] says so.
pub struct ManualTicker {
    rx: mpsc::UnboundedReceiver<()>,
}

/// Fires ticks on the paired [`ManualTicker`]. Dropping every handle
/// exhausts the ticker.
#[derive(Clone)]
pub struct ManualTickerHandle {
    tx: mpsc::UnboundedSender<()>,
}

impl ManualTicker {
    pub fn new() -> (Self, ManualTickerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, ManualTickerHandle { tx })
    }
}

impl Ticker for ManualTicker {
    fn tick(&mut self) -> impl Future<Output = bool> + Send {
        async move { self.rx.recv().await.is_some() }
    }
}

impl ManualTickerHandle {
    /// Queue one tick. Returns `false` if the ticker has been dropped.
    pub fn tick(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}
