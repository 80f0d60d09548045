use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::classifier::FocusClassifier;
use crate::hysteresis::HysteresisConfig;
use crate::placement::PlacementConfig;

/// Directory under the home directory where FlowPilot keeps its state.
pub const APP_DIR_NAME: &str = ".flowpilot";

const VIEWS: [&str; 2] = ["track", "summary"];

// Accepted ranges, shared by the CLI parser and the saved-params check.
const FOCUS_THRESHOLD_RANGE: RangeInclusive<i64> = 1..=60;
const FOCUS_HOLD_MS_RANGE: RangeInclusive<i64> = 0..=600_000;
const WARN_CONFIRM_TICKS_RANGE: RangeInclusive<i64> = 1..=30;
const JITTER_PX_RANGE: RangeInclusive<i64> = 0..=200;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Deep-focus monitor for code editors
#[derive(Parser, Debug, Clone)]
#[command(
    name = "flowpilot",
    about = "Deep-focus monitor that highlights your editor while you stay in flow",
    version
)]
pub struct Settings {
    /// What to run: live tracking or a daily summary of the audit log
    #[arg(long, default_value = "track", value_parser = VIEWS)]
    pub view: String,

    /// Case-insensitive regex matched against "<owner> <title>" of the foreground window
    #[arg(
        long,
        default_value = crate::classifier::DEFAULT_TARGET_PATTERN,
        value_parser = parse_target_pattern
    )]
    pub target_pattern: String,

    /// Consecutive target ticks required to enter focus
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u32).range(FOCUS_THRESHOLD_RANGE))]
    pub focus_threshold: u32,

    /// Sticky-focus grace window in milliseconds
    #[arg(long, default_value = "4000", value_parser = clap::value_parser!(u64).range(*FOCUS_HOLD_MS_RANGE.start() as u64..=*FOCUS_HOLD_MS_RANGE.end() as u64))]
    pub focus_hold_ms: u64,

    /// Consecutive non-target ticks required to confirm a warning
    #[arg(long, default_value = "2", value_parser = clap::value_parser!(u32).range(WARN_CONFIRM_TICKS_RANGE))]
    pub warn_confirm_ticks: u32,

    /// Ignore overlay moves smaller than this many pixels
    #[arg(long, default_value = "4", value_parser = clap::value_parser!(u32).range(JITTER_PX_RANGE))]
    pub jitter_px: u32,

    /// Sampling interval in milliseconds
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(100..=60_000))]
    pub tick_ms: u64,

    /// Give up on a single window probe after this many milliseconds
    #[arg(long, default_value = "2000", value_parser = clap::value_parser!(u64).range(50..=60_000))]
    pub probe_timeout_ms: u64,

    /// Reset focus streaks and hold when tracking stops
    #[arg(long)]
    pub reset_on_stop: bool,

    /// Start tracking immediately instead of waiting for a `start` command
    #[arg(long)]
    pub autostart: bool,

    /// Directory for the JSONL audit log (defaults to ~/.flowpilot/audit)
    #[arg(long)]
    pub audit_dir: Option<PathBuf>,

    /// Timezone used for the summary view (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── SavedParams ──────────────────────────────────────────────────────────────

/// Tuning values remembered between runs in `~/.flowpilot/last_used.json`.
///
/// Only values that shape the focus model are kept; one-shot flags such as
/// `--autostart` or `--clear` never persist.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct SavedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_threshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_hold_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warn_confirm_ticks: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter_px: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl SavedParams {
    pub fn path() -> PathBuf {
        Self::path_under(&home_dir())
    }

    /// `<base>/.flowpilot/last_used.json`.
    pub fn path_under(base: &Path) -> PathBuf {
        base.join(APP_DIR_NAME).join("last_used.json")
    }

    /// Missing or unreadable files give an empty set of params.
    pub fn read(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt saved params");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Write through a sibling temp file so a crash never leaves half a file.
    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let body = serde_json::to_vec_pretty(self).map_err(std::io::Error::other)?;
        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, body)?;
        std::fs::rename(&staging, path)
    }

    pub fn remove(path: &Path) -> std::io::Result<()> {
        match std::fs::remove_file(path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

// ── Settings impl ─────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments on top of the saved params.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os().collect(), &SavedParams::path())
    }

    /// Parse `args`, fill every value the user did not type from the file at
    /// `saved_path`, resolve `auto` values and save the outcome back.
    pub fn load_from_args(args: Vec<std::ffi::OsString>, saved_path: &Path) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = SavedParams::remove(saved_path) {
                tracing::warn!(error = %e, "could not clear saved params");
            }
            return settings.resolved();
        }

        let saved = SavedParams::read(saved_path);
        adopt(&matches, "view", &mut settings.view, saved.view, |v| {
            VIEWS.contains(&v.as_str())
        });
        adopt(
            &matches,
            "target_pattern",
            &mut settings.target_pattern,
            saved.target_pattern,
            |p| FocusClassifier::new(p).is_ok(),
        );
        adopt(
            &matches,
            "focus_threshold",
            &mut settings.focus_threshold,
            saved.focus_threshold,
            |v| within(&FOCUS_THRESHOLD_RANGE, *v),
        );
        adopt(
            &matches,
            "focus_hold_ms",
            &mut settings.focus_hold_ms,
            saved.focus_hold_ms,
            |v| within(&FOCUS_HOLD_MS_RANGE, *v),
        );
        adopt(
            &matches,
            "warn_confirm_ticks",
            &mut settings.warn_confirm_ticks,
            saved.warn_confirm_ticks,
            |v| within(&WARN_CONFIRM_TICKS_RANGE, *v),
        );
        adopt(
            &matches,
            "jitter_px",
            &mut settings.jitter_px,
            saved.jitter_px,
            |v| within(&JITTER_PX_RANGE, *v),
        );
        // Unknown zones are reported by `resolved`.
        adopt(&matches, "timezone", &mut settings.timezone, saved.timezone, |_| true);

        let settings = settings.resolved();
        if let Err(e) = SavedParams::from(&settings).write(saved_path) {
            tracing::debug!(error = %e, "could not save params");
        }
        settings
    }

    /// Turn `--timezone auto` into a concrete zone; `--debug` wins over
    /// `--log-level`.
    fn resolved(mut self) -> Self {
        self.timezone = crate::time_utils::resolve_timezone(&self.timezone);
        if !crate::time_utils::TimezoneHandler::validate_timezone(&self.timezone) {
            tracing::warn!(timezone = %self.timezone, "unknown timezone; summaries will use UTC");
        }
        if self.debug {
            self.log_level = "DEBUG".to_string();
        }
        self
    }

    /// Hysteresis thresholds derived from the CLI values.
    ///
    /// The hold is capped at the CLI maximum for values set outside the parser.
    pub fn hysteresis_config(&self) -> HysteresisConfig {
        let hold_ms = i64::try_from(self.focus_hold_ms)
            .unwrap_or(i64::MAX)
            .min(*FOCUS_HOLD_MS_RANGE.end());
        HysteresisConfig {
            focus_threshold: self.focus_threshold.max(1),
            focus_hold: chrono::Duration::milliseconds(hold_ms),
            warn_confirm_ticks: self.warn_confirm_ticks.max(1),
        }
    }

    /// Overlay placement parameters derived from the CLI values.
    pub fn placement_config(&self) -> PlacementConfig {
        PlacementConfig {
            jitter_px: i32::try_from(self.jitter_px).unwrap_or(i32::MAX),
            ..PlacementConfig::default()
        }
    }

    /// Audit directory: `--audit-dir` or `~/.flowpilot/audit`.
    pub fn resolved_audit_dir(&self) -> PathBuf {
        self.audit_dir
            .clone()
            .unwrap_or_else(|| home_dir().join(APP_DIR_NAME).join("audit"))
    }
}

// ── Conversion ────────────────────────────────────────────────────────────────

impl From<&Settings> for SavedParams {
    fn from(s: &Settings) -> Self {
        SavedParams {
            view: Some(s.view.clone()),
            target_pattern: Some(s.target_pattern.clone()),
            focus_threshold: Some(s.focus_threshold),
            focus_hold_ms: Some(s.focus_hold_ms),
            warn_confirm_ticks: Some(s.warn_confirm_ticks),
            jitter_px: Some(s.jitter_px),
            timezone: Some(s.timezone.clone()),
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Replace `slot` with the saved value unless `id` was typed on the command
/// line. Defaults and environment values lose to saved ones. A saved value
/// that fails `valid` is dropped with a warning and `slot` keeps its default.
fn adopt<T: std::fmt::Debug>(
    matches: &clap::ArgMatches,
    id: &str,
    slot: &mut T,
    saved: Option<T>,
    valid: impl Fn(&T) -> bool,
) {
    if matches.value_source(id) == Some(clap::parser::ValueSource::CommandLine) {
        return;
    }
    match saved {
        Some(value) if valid(&value) => *slot = value,
        Some(value) => {
            tracing::warn!(
                param = id,
                value = ?value,
                default = ?slot,
                "ignoring invalid saved param"
            );
        }
        None => {}
    }
}

/// Range check matching clap's `value_parser!(..).range(..)`.
fn within(range: &RangeInclusive<i64>, value: impl TryInto<i64>) -> bool {
    value.try_into().is_ok_and(|v| range.contains(&v))
}

/// Reject patterns the classifier could not compile, so they never get saved.
fn parse_target_pattern(raw: &str) -> Result<String, String> {
    FocusClassifier::new(raw)
        .map(|_| raw.to_string())
        .map_err(|e| e.to_string())
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
