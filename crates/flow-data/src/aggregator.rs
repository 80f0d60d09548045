//! Daily roll-up of audit records.

use std::collections::{BTreeMap, HashMap};

use flow_core::formatting::percentage;
use flow_core::models::{AuditRecord, SessionState};
use flow_core::time_utils::TimezoneHandler;

// ── StateTotals ───────────────────────────────────────────────────────────────

/// Tick counts and elapsed milliseconds per state plus the running score sum.
///
/// Durations come from each record's own tick length, so logs written with
/// different `--tick-ms` values add up correctly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateTotals {
    pub tracking_ticks: u64,
    pub focus_ticks: u64,
    pub warn_ticks: u64,
    pub other_ticks: u64,
    pub tracking_ms: u64,
    pub focus_ms: u64,
    pub warn_ms: u64,
    pub other_ms: u64,
    pub score_sum: u64,
}

impl StateTotals {
    /// Add a single record's state and score to the running totals.
    pub fn add_record(&mut self, record: &AuditRecord) {
        let (ticks, ms) = match record.state {
            SessionState::Tracking => (&mut self.tracking_ticks, &mut self.tracking_ms),
            SessionState::Focus => (&mut self.focus_ticks, &mut self.focus_ms),
            SessionState::Warn => (&mut self.warn_ticks, &mut self.warn_ms),
            SessionState::Idle => (&mut self.other_ticks, &mut self.other_ms),
        };
        *ticks += 1;
        *ms = ms.saturating_add(record.tick_ms);
        self.score_sum += u64::from(record.score);
    }

    pub fn total_ticks(&self) -> u64 {
        self.tracking_ticks + self.focus_ticks + self.warn_ticks + self.other_ticks
    }

    pub fn total_ms(&self) -> u64 {
        self.tracking_ms + self.focus_ms + self.warn_ms + self.other_ms
    }

    /// Mean display score, `0.0` when empty.
    pub fn mean_score(&self) -> f64 {
        match self.total_ticks() {
            0 => 0.0,
            n => self.score_sum as f64 / n as f64,
        }
    }

    /// Share of tracked time spent in focus, in percent with one decimal.
    pub fn focus_percentage(&self) -> f64 {
        percentage(self.focus_ms as f64, self.total_ms() as f64, 1)
    }

    fn merge(&mut self, other: &StateTotals) {
        self.tracking_ticks += other.tracking_ticks;
        self.focus_ticks += other.focus_ticks;
        self.warn_ticks += other.warn_ticks;
        self.other_ticks += other.other_ticks;
        self.tracking_ms += other.tracking_ms;
        self.focus_ms += other.focus_ms;
        self.warn_ms += other.warn_ms;
        self.other_ms += other.other_ms;
        self.score_sum += other.score_sum;
    }
}

// ── DailyFocus ────────────────────────────────────────────────────────────────

/// Everything recorded on one local calendar day.
#[derive(Debug, Clone)]
pub struct DailyFocus {
    /// `"%Y-%m-%d"` in the handler's timezone.
    pub day: String,
    pub totals: StateTotals,
    /// Milliseconds each active-app label was in the foreground.
    pub app_ms: HashMap<String, u64>,
}

impl DailyFocus {
    fn new(day: String) -> Self {
        Self {
            day,
            totals: StateTotals::default(),
            app_ms: HashMap::new(),
        }
    }

    fn add_record(&mut self, record: &AuditRecord) {
        self.totals.add_record(record);
        if let Some(app) = &record.active_app {
            *self.app_ms.entry(app.clone()).or_default() += record.tick_ms;
        }
    }

    /// Most frequent foreground app; ties resolve to the alphabetically first.
    pub fn top_app(&self) -> Option<&str> {
        self.app_ms
            .iter()
            .max_by(|(a_name, a), (b_name, b)| a.cmp(b).then_with(|| b_name.cmp(a_name)))
            .map(|(name, _)| name.as_str())
    }
}

// ── FocusAggregator ───────────────────────────────────────────────────────────

/// Stateless helper that groups audit records by local day.
pub struct FocusAggregator;

impl FocusAggregator {
    /// Group `records` by local calendar day. Returns days ascending.
    pub fn aggregate_daily(records: &[AuditRecord], tz: &TimezoneHandler) -> Vec<DailyFocus> {
        let mut days: BTreeMap<String, DailyFocus> = BTreeMap::new();
        for record in records {
            let key = tz.day_key(record.timestamp);
            days.entry(key.clone())
                .or_insert_with(|| DailyFocus::new(key))
                .add_record(record);
        }
        days.into_values().collect()
    }

    /// Sum the totals of all days.
    pub fn calculate_totals(days: &[DailyFocus]) -> StateTotals {
        let mut totals = StateTotals::default();
        for day in days {
            totals.merge(&day.totals);
        }
        totals
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(ts: &str, app: Option<&str>, score: u8, state: SessionState) -> AuditRecord {
        AuditRecord {
            timestamp: ts.parse().unwrap(),
            active_app: app.map(str::to_string),
            score,
            state,
            tick_ms: 1_000,
        }
    }

    fn utc() -> TimezoneHandler {
        TimezoneHandler::new("UTC")
    }

    #[test]
    fn test_daily_groups_by_date() {
        let records = vec![
            rec("2026-03-01T09:00:00Z", Some("Code"), 40, SessionState::Tracking),
            rec("2026-03-01T09:00:01Z", Some("Code"), 100, SessionState::Focus),
            rec("2026-03-02T09:00:00Z", Some("Firefox"), 40, SessionState::Warn),
        ];

        let days = FocusAggregator::aggregate_daily(&records, &utc());
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].day, "2026-03-01");
        assert_eq!(days[0].totals.total_ticks(), 2);
        assert_eq!(days[0].totals.focus_ticks, 1);
        assert_eq!(days[1].day, "2026-03-02");
        assert_eq!(days[1].totals.warn_ticks, 1);
    }

    #[test]
    fn test_daily_uses_local_timezone() {
        let records = vec![rec("2026-03-01T20:00:00Z", None, 40, SessionState::Warn)];
        let days = FocusAggregator::aggregate_daily(&records, &TimezoneHandler::new("Asia/Tokyo"));
        assert_eq!(days[0].day, "2026-03-02");
    }

    #[test]
    fn test_daily_empty_records() {
        assert!(FocusAggregator::aggregate_daily(&[], &utc()).is_empty());
    }

    #[test]
    fn test_mean_score_and_focus_percentage() {
        let records = vec![
            rec("2026-03-01T09:00:00Z", Some("Code"), 40, SessionState::Tracking),
            rec("2026-03-01T09:00:01Z", Some("Code"), 100, SessionState::Focus),
            rec("2026-03-01T09:00:02Z", Some("Code"), 100, SessionState::Focus),
            rec("2026-03-01T09:00:03Z", None, 40, SessionState::Focus),
        ];
        let days = FocusAggregator::aggregate_daily(&records, &utc());
        let totals = &days[0].totals;
        assert!((totals.mean_score() - 70.0).abs() < 1e-9);
        assert!((totals.focus_percentage() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_durations_follow_each_record_tick_length() {
        let mut fast = rec("2026-03-01T09:00:00Z", Some("Code"), 100, SessionState::Focus);
        fast.tick_ms = 250;
        let mut slow = rec("2026-03-01T09:00:01Z", Some("Firefox"), 40, SessionState::Warn);
        slow.tick_ms = 5_000;
        let legacy = rec("2026-03-01T09:00:06Z", Some("Code"), 100, SessionState::Focus);

        let days = FocusAggregator::aggregate_daily(&[fast, slow, legacy], &utc());
        let totals = &days[0].totals;
        assert_eq!(totals.focus_ticks, 2);
        assert_eq!(totals.focus_ms, 1_250);
        assert_eq!(totals.warn_ms, 5_000);
        assert_eq!(totals.total_ms(), 6_250);
        assert!((totals.focus_percentage() - 20.0).abs() < 1e-9);
        // Time in the foreground decides, not the number of samples.
        assert_eq!(days[0].top_app(), Some("Firefox"));
    }

    #[test]
    fn test_top_app_tie_breaks_alphabetically() {
        let records = vec![
            rec("2026-03-01T09:00:00Z", Some("Zed"), 40, SessionState::Tracking),
            rec("2026-03-01T09:00:01Z", Some("Code"), 40, SessionState::Tracking),
            rec("2026-03-01T09:00:02Z", None, 40, SessionState::Warn),
        ];
        let days = FocusAggregator::aggregate_daily(&records, &utc());
        assert_eq!(days[0].top_app(), Some("Code"));
    }

    #[test]
    fn test_calculate_totals_sums_all_days() {
        let records = vec![
            rec("2026-03-01T09:00:00Z", Some("Code"), 100, SessionState::Focus),
            rec("2026-03-02T09:00:00Z", Some("Code"), 100, SessionState::Focus),
            rec("2026-03-03T09:00:00Z", None, 40, SessionState::Warn),
        ];
        let days = FocusAggregator::aggregate_daily(&records, &utc());
        let totals = FocusAggregator::calculate_totals(&days);
        assert_eq!(totals.focus_ticks, 2);
        assert_eq!(totals.warn_ticks, 1);
        assert_eq!(totals.score_sum, 240);
    }

    #[test]
    fn test_empty_totals() {
        let totals = FocusAggregator::calculate_totals(&[]);
        assert_eq!(totals.total_ticks(), 0);
        assert_eq!(totals.mean_score(), 0.0);
        assert_eq!(totals.focus_percentage(), 0.0);
    }
}
