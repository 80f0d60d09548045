use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

// ── System timezone detection ─────────────────────────────────────────────────

/// IANA name of the host's zone, or `"UTC"` when it cannot be detected.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Resolve the `"auto"` sentinel to the system timezone; other values pass through.
pub fn resolve_timezone(tz_name: &str) -> String {
    if tz_name == "auto" {
        get_system_timezone()
    } else {
        tz_name.to_string()
    }
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Converts audit timestamps into a user's local calendar.
#[derive(Debug, Clone, Copy)]
pub struct TimezoneHandler {
    default_tz: Tz,
}

impl TimezoneHandler {
    /// Unknown zone names degrade to UTC with a warning.
    pub fn new(tz_name: &str) -> Self {
        let tz = tz_name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(timezone = tz_name, "unknown timezone; day boundaries use UTC");
            Tz::UTC
        });
        Self { default_tz: tz }
    }

    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.parse::<Tz>().is_ok()
    }

    /// Convert a UTC [`DateTime`] to the handler's timezone.
    pub fn to_local(&self, dt: DateTime<Utc>) -> DateTime<Tz> {
        dt.with_timezone(&self.default_tz)
    }

    /// Local calendar day of `dt`, formatted `"%Y-%m-%d"`.
    pub fn day_key(&self, dt: DateTime<Utc>) -> String {
        self.to_local(dt).format("%Y-%m-%d").to_string()
    }

    /// Local wall-clock time of `dt`, formatted `"%H:%M:%S"`.
    pub fn clock_time(&self, dt: DateTime<Utc>) -> String {
        self.to_local(dt).format("%H:%M:%S").to_string()
    }

    pub fn default_tz(&self) -> Tz {
        self.default_tz
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
