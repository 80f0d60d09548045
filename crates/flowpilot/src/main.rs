mod bootstrap;
mod console;
mod summary;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use flow_core::clock::SystemClock;
use flow_core::settings::Settings;
use flow_core::stopwatch::FocusStopwatch;
use flow_core::time_utils::TimezoneHandler;
use flow_data::aggregator::FocusAggregator;
use flow_data::audit::JsonlAuditLog;
use flow_data::reader::load_audit_records;
use flow_runtime::orchestrator::TrackingOrchestrator;
use flow_runtime::overlay::HeadlessOverlay;
use flow_runtime::probe::native_probe;
use flow_runtime::ticker::IntervalTicker;
use flow_runtime::tracker::{FocusTracker, TrackerConfig, UiEvent};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::console::ConsoleCommand;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("FlowPilot v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, target: {}, timezone: {}",
        settings.view,
        settings.target_pattern,
        settings.timezone
    );

    let audit_dir = settings.resolved_audit_dir();

    match settings.view.as_str() {
        "track" => run_tracking(&settings, &audit_dir).await?,
        "summary" => {
            let tz = TimezoneHandler::new(&settings.timezone);
            let records = load_audit_records(&audit_dir, None);
            let days = FocusAggregator::aggregate_daily(&records, &tz);
            println!(
                "Focus summary for {} (generated {})",
                audit_dir.display(),
                tz.clock_time(chrono::Utc::now())
            );
            print!("{}", summary::render_summary(&days));
        }
        unknown => {
            eprintln!("Unknown view mode: {}", unknown);
        }
    }

    Ok(())
}

async fn run_tracking(settings: &Settings, audit_dir: &Path) -> Result<()> {
    let config = TrackerConfig {
        target_pattern: settings.target_pattern.clone(),
        hysteresis: settings.hysteresis_config(),
        placement: settings.placement_config(),
        reset_on_stop: settings.reset_on_stop,
        tick_ms: settings.tick_ms,
    };
    let tracker = FocusTracker::new(
        config,
        Box::new(HeadlessOverlay::new()),
        Box::new(JsonlAuditLog::new(audit_dir)),
        Arc::new(SystemClock),
    )?;

    let tick = Duration::from_millis(settings.tick_ms);
    let (mut events, handle) =
        TrackingOrchestrator::new(tracker, native_probe(), IntervalTicker::new(tick))
            .with_probe_timeout(Duration::from_millis(settings.probe_timeout_ms))
            .start();

    println!("Commands: start | stop | quit");
    if settings.autostart {
        handle.start_tracking();
    }

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut stopwatch = FocusStopwatch::new();

    loop {
        tokio::select! {
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match console::parse_command(&line) {
                    Some(ConsoleCommand::Start) => handle.start_tracking(),
                    Some(ConsoleCommand::Stop) => handle.stop_tracking(),
                    Some(ConsoleCommand::Quit) => break,
                    None if line.trim().is_empty() => {}
                    None => eprintln!("Unknown command: {}", line.trim()),
                },
                Ok(None) => {
                    tracing::debug!("stdin closed; waiting for Ctrl+C");
                    stdin_open = false;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read stdin");
                    stdin_open = false;
                }
            },
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::warn!("tracking loop ended unexpectedly");
                    break;
                };
                if let UiEvent::StateChange(update) = &event {
                    stopwatch.observe(update, tick);
                }
                println!("{}", console::render_event(&event, &stopwatch));
                if event == UiEvent::TrackingStopped {
                    stopwatch.reset();
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received; shutting down tracking task");
                break;
            }
        }
    }

    handle.stop_tracking();
    handle.shutdown().await;
    Ok(())
}
