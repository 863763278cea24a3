//! Per-app foreground usage summaries.
//!
//! The source performs the event-to-duration aggregation; this module owns
//! the filtering and shaping around that call.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::permission::{PermissionGate, SourceGate};
use crate::router::Operation;
use crate::source::{SourceError, UsageDataSource};
use crate::types::{AppId, TimeWindow, now_ms};

/// Default summary window: the last 24 hours.
pub const DEFAULT_SUMMARY_LOOKBACK_MS: i64 = 24 * 60 * 60 * 1000;

/// Total foreground time of one app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub app_id: AppId,
    /// Always non-negative.
    pub foreground_ms: i64,
}

/// Foreground milliseconds per app, serialized as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageSummary(BTreeMap<AppId, i64>);

impl UsageSummary {
    pub fn get(&self, app_id: &str) -> Option<i64> {
        self.0.get(app_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries ordered by app id.
    pub fn iter(&self) -> impl Iterator<Item = (&AppId, i64)> {
        self.0.iter().map(|(app, ms)| (app, *ms))
    }

    /// Sum of all foreground time in the summary.
    pub fn total_ms(&self) -> i64 {
        self.0.values().fold(0_i64, |acc, ms| acc.saturating_add(*ms))
    }

    /// Records ordered by descending foreground time, ties by app id.
    pub fn ranked(&self) -> Vec<UsageRecord> {
        let mut records: Vec<UsageRecord> = self
            .0
            .iter()
            .map(|(app_id, ms)| UsageRecord {
                app_id: app_id.clone(),
                foreground_ms: *ms,
            })
            .collect();
        records.sort_by(|a, b| {
            b.foreground_ms
                .cmp(&a.foreground_ms)
                .then_with(|| a.app_id.cmp(&b.app_id))
        });
        records
    }
}

impl FromIterator<(AppId, i64)> for UsageSummary {
    fn from_iter<T: IntoIterator<Item = (AppId, i64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Summarizes foreground time per app over a window.
pub struct UsageSummarizer<'a, S: ?Sized> {
    source: &'a S,
    diagnostics: &'a dyn Diagnostics,
    lookback_ms: i64,
}

impl<'a, S: UsageDataSource + ?Sized> UsageSummarizer<'a, S> {
    pub fn new(source: &'a S, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            source,
            diagnostics,
            lookback_ms: DEFAULT_SUMMARY_LOOKBACK_MS,
        }
    }

    /// Overrides the default window length used when no window is given.
    #[must_use]
    pub const fn with_lookback_ms(mut self, lookback_ms: i64) -> Self {
        self.lookback_ms = lookback_ms;
        self
    }

    /// Summarizes `window` (default: the lookback ending now).
    pub fn summarize(&self, window: Option<TimeWindow>, app_ids: Option<&[AppId]>) -> UsageSummary {
        self.summarize_at(now_ms(), window, app_ids)
    }

    /// Summarizes `window`, defaulting to the lookback ending at `now_ms`.
    ///
    /// With a non-empty `app_ids` filter only requested apps that have data
    /// are returned; requested apps without data are silently left out. An
    /// absent or empty filter returns every app the source reports.
    pub fn summarize_at(
        &self,
        now_ms: i64,
        window: Option<TimeWindow>,
        app_ids: Option<&[AppId]>,
    ) -> UsageSummary {
        let window = window.unwrap_or_else(|| TimeWindow::ending_at(now_ms, self.lookback_ms));

        if !SourceGate::new(self.source, self.diagnostics).is_granted() {
            self.diagnostics.record(&Diagnostic::PermissionDenied {
                operation: Operation::FetchUsageSummary,
            });
            return UsageSummary::default();
        }

        let totals = match self.fetch(window) {
            Ok(Some(totals)) => totals,
            Ok(None) => return UsageSummary::default(),
            Err(error) => {
                self.diagnostics.record(&Diagnostic::SourceFailed {
                    operation: Operation::FetchUsageSummary,
                    error: &error,
                });
                return UsageSummary::default();
            }
        };

        match app_ids.filter(|ids| !ids.is_empty()) {
            Some(ids) => {
                let requested: BTreeSet<&AppId> = ids.iter().collect();
                requested
                    .into_iter()
                    .filter_map(|id| {
                        let ms = *totals.get(id.as_str())?;
                        Some((id.clone(), self.non_negative(id, ms)))
                    })
                    .collect()
            }
            None => totals
                .into_iter()
                .filter_map(|(raw, ms)| match AppId::new(raw.as_str()) {
                    Ok(id) => {
                        let ms = self.non_negative(&id, ms);
                        Some((id, ms))
                    }
                    Err(_) => {
                        self.diagnostics
                            .record(&Diagnostic::InvalidAppIdDropped { raw_id: &raw });
                        None
                    }
                })
                .collect(),
        }
    }

    fn fetch(&self, window: TimeWindow) -> Result<Option<HashMap<String, i64>>, SourceError> {
        self.source.query_aggregated_usage(window)
    }

    fn non_negative(&self, app_id: &AppId, foreground_ms: i64) -> i64 {
        if foreground_ms < 0 {
            self.diagnostics.record(&Diagnostic::NegativeUsageClamped {
                app_id: app_id.as_str(),
                foreground_ms,
            });
            return 0;
        }
        foreground_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::diagnostics::testing::RecordingDiagnostics;
    use crate::source::{EventStream, MemorySource};

    const NOW: i64 = 1_700_000_000_000;

    fn ids(raw: &[&str]) -> Vec<AppId> {
        raw.iter().map(|s| AppId::new(*s).unwrap()).collect()
    }

    fn as_pairs(summary: &UsageSummary) -> Vec<(String, i64)> {
        summary.iter().map(|(id, ms)| (id.to_string(), ms)).collect()
    }

    /// Records the window it was asked for and optionally fails.
    struct WindowProbe {
        seen: std::sync::Mutex<Vec<TimeWindow>>,
        fail: bool,
    }

    impl WindowProbe {
        fn new(fail: bool) -> Self {
            Self {
                seen: std::sync::Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    impl UsageDataSource for WindowProbe {
        fn is_permission_granted(&self) -> Result<bool, SourceError> {
            Ok(true)
        }

        fn query_events(&self, _window: TimeWindow) -> Result<EventStream<'_>, SourceError> {
            Ok(Box::new(std::iter::empty()))
        }

        fn query_aggregated_usage(
            &self,
            window: TimeWindow,
        ) -> Result<Option<HashMap<String, i64>>, SourceError> {
            self.seen.lock().unwrap().push(window);
            if self.fail {
                return Err(SourceError::Unavailable("usage stats service missing".into()));
            }
            Ok(Some(HashMap::from([("A".to_string(), 10)])))
        }
    }

    #[test]
    fn filter_keeps_requested_apps_with_data() {
        let source = MemorySource::with_aggregate([("A", 5000), ("B", 3000)]);
        let diagnostics = RecordingDiagnostics::default();
        let filter = ids(&["A", "C"]);

        let summary =
            UsageSummarizer::new(&source, &diagnostics).summarize_at(NOW, None, Some(filter.as_slice()));

        assert_eq!(as_pairs(&summary), vec![("A".to_string(), 5000)]);
        assert!(diagnostics.kinds().is_empty());
    }

    #[test]
    fn empty_filter_equals_no_filter() {
        let source = MemorySource::with_aggregate([("A", 5000), ("B", 3000)]);
        let diagnostics = RecordingDiagnostics::default();
        let summarizer = UsageSummarizer::new(&source, &diagnostics);

        let unfiltered = summarizer.summarize_at(NOW, None, None);
        let empty = summarizer.summarize_at(NOW, None, Some(&[] as &[AppId]));

        assert_eq!(unfiltered, empty);
        assert_eq!(
            as_pairs(&unfiltered),
            vec![("A".to_string(), 5000), ("B".to_string(), 3000)]
        );
    }

    #[test]
    fn duplicate_filter_ids_collapse() {
        let source = MemorySource::with_aggregate([("A", 5000), ("B", 3000)]);
        let diagnostics = RecordingDiagnostics::default();
        let filter = ids(&["B", "B", "A", "B"]);

        let summary =
            UsageSummarizer::new(&source, &diagnostics).summarize_at(NOW, None, Some(filter.as_slice()));

        assert_eq!(summary.len(), 2);
        assert_eq!(summary.get("B"), Some(3000));
    }

    #[test]
    fn output_keys_are_requested_and_present() {
        let source = MemorySource::with_aggregate([("A", 1), ("B", 2), ("C", 3)]);
        let diagnostics = RecordingDiagnostics::default();
        let summarizer = UsageSummarizer::new(&source, &diagnostics);

        for filter in [vec!["A"], vec!["B", "D"], vec!["D", "E"], vec!["A", "B", "C"]] {
            let requested = ids(&filter);
            let summary = summarizer.summarize_at(NOW, None, Some(requested.as_slice()));
            for (id, _) in summary.iter() {
                assert!(requested.contains(id), "{id} was not requested");
                assert!(
                    source.aggregate.as_ref().unwrap().contains_key(id.as_str()),
                    "{id} not in source"
                );
            }
        }
    }

    #[test]
    fn summarize_is_idempotent() {
        let source = MemorySource::with_aggregate([("A", 5000), ("B", 3000)]);
        let diagnostics = RecordingDiagnostics::default();
        let summarizer = UsageSummarizer::new(&source, &diagnostics);
        let window = TimeWindow::new(NOW - 1000, NOW).ok();
        let filter = ids(&["B"]);

        let first = summarizer.summarize_at(NOW, window, Some(filter.as_slice()));
        let second = summarizer.summarize_at(NOW, window, Some(filter.as_slice()));
        assert_eq!(first, second);
    }

    #[test]
    fn missing_window_defaults_to_last_day() {
        let source = WindowProbe::new(false);
        let diagnostics = RecordingDiagnostics::default();

        UsageSummarizer::new(&source, &diagnostics).summarize_at(NOW, None, None);

        let seen = source.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![TimeWindow::new(NOW - 86_400_000, NOW).unwrap()]);
    }

    #[test]
    fn explicit_window_is_passed_through() {
        let source = WindowProbe::new(false);
        let diagnostics = RecordingDiagnostics::default();
        let window = TimeWindow::new(10, 20).unwrap();

        UsageSummarizer::new(&source, &diagnostics).summarize_at(NOW, Some(window), None);

        assert_eq!(source.seen.lock().unwrap().clone(), vec![window]);
    }

    #[test]
    fn permission_denied_yields_empty_without_querying() {
        let mut source = MemorySource::with_aggregate([("A", 5000)]);
        source.granted = false;
        let diagnostics = RecordingDiagnostics::default();

        let summary = UsageSummarizer::new(&source, &diagnostics).summarize_at(NOW, None, None);

        assert!(summary.is_empty());
        assert_eq!(diagnostics.kinds(), vec![DiagnosticKind::PermissionDenied]);
    }

    #[test]
    fn no_data_yields_empty() {
        let source = MemorySource {
            granted: true,
            ..MemorySource::default()
        };
        let diagnostics = RecordingDiagnostics::default();

        let summary = UsageSummarizer::new(&source, &diagnostics).summarize_at(NOW, None, None);

        assert!(summary.is_empty());
        assert!(diagnostics.kinds().is_empty());
    }

    #[test]
    fn source_failure_yields_empty_and_reports() {
        let source = WindowProbe::new(true);
        let diagnostics = RecordingDiagnostics::default();

        let summary = UsageSummarizer::new(&source, &diagnostics).summarize_at(NOW, None, None);

        assert!(summary.is_empty());
        assert_eq!(diagnostics.kinds(), vec![DiagnosticKind::SourceFailed]);
    }

    #[test]
    fn negative_values_are_clamped() {
        let source = MemorySource::with_aggregate([("A", -40), ("B", 7)]);
        let diagnostics = RecordingDiagnostics::default();

        let summary = UsageSummarizer::new(&source, &diagnostics).summarize_at(NOW, None, None);

        assert_eq!(summary.get("A"), Some(0));
        assert_eq!(summary.get("B"), Some(7));
        assert_eq!(diagnostics.kinds(), vec![DiagnosticKind::NegativeUsageClamped]);
    }

    #[test]
    fn empty_source_keys_are_dropped() {
        let source = MemorySource::with_aggregate([("", 100), ("A", 7)]);
        let diagnostics = RecordingDiagnostics::default();

        let summary = UsageSummarizer::new(&source, &diagnostics).summarize_at(NOW, None, None);

        assert_eq!(as_pairs(&summary), vec![("A".to_string(), 7)]);
        assert_eq!(diagnostics.kinds(), vec![DiagnosticKind::InvalidAppIdDropped]);
    }

    #[test]
    fn summary_serializes_as_flat_object() {
        let source = MemorySource::with_aggregate([("com.b", 3000), ("com.a", 5000)]);
        let diagnostics = RecordingDiagnostics::default();

        let summary = UsageSummarizer::new(&source, &diagnostics).summarize_at(NOW, None, None);

        let json = serde_json::to_string(&summary).unwrap();
        assert_eq!(json, r#"{"com.a":5000,"com.b":3000}"#);
    }

    #[test]
    fn ranked_orders_by_time_then_id() {
        let summary: UsageSummary = [
            (AppId::new("b").unwrap(), 10),
            (AppId::new("a").unwrap(), 10),
            (AppId::new("c").unwrap(), 99),
        ]
        .into_iter()
        .collect();

        let order: Vec<String> = summary
            .ranked()
            .into_iter()
            .map(|r| r.app_id.to_string())
            .collect();
        assert_eq!(order, vec!["c", "a", "b"]);
        assert_eq!(summary.total_ms(), 119);
    }
}
