//! Summary command for per-app foreground time.
//!
//! Prints a ranked table (or flat JSON) of foreground time per app over a
//! window. Missing `--end` means now; missing `--begin` means the configured
//! lookback before the end.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use uw_core::{
    AppId, QueryConfig, TimeWindow, TracingDiagnostics, UsageDataSource, UsageSummarizer,
    UsageSummary,
};

use super::util::{format_duration, format_timestamp_ms, parse_time_ms, progress_bar};

/// Summary command arguments.
#[derive(Debug, Default)]
pub struct SummaryArgs<'a> {
    pub begin: Option<&'a str>,
    pub end: Option<&'a str>,
    pub apps: &'a [String],
    pub json: bool,
}

/// Resolves the window from optional `--begin` / `--end` arguments.
///
/// Rejects windows that end before they begin.
pub fn resolve_window(
    begin: Option<&str>,
    end: Option<&str>,
    now: DateTime<Utc>,
    lookback_ms: i64,
) -> Result<TimeWindow> {
    let end_ms = match end {
        Some(raw) => parse_time_ms(raw, now).context("invalid --end")?,
        None => now.timestamp_millis(),
    };
    let begin_ms = match begin {
        Some(raw) => parse_time_ms(raw, now).context("invalid --begin")?,
        None => end_ms.saturating_sub(lookback_ms),
    };
    TimeWindow::new(begin_ms, end_ms).context("--end must not be before --begin")
}

/// Runs the summary command as of `now`.
pub fn run<W: Write, S: UsageDataSource>(
    writer: &mut W,
    source: &S,
    query: &QueryConfig,
    now: DateTime<Utc>,
    args: &SummaryArgs<'_>,
) -> Result<()> {
    let window = resolve_window(args.begin, args.end, now, query.summary_lookback_ms)?;
    let app_ids = args
        .apps
        .iter()
        .map(|app| AppId::new(app.as_str()))
        .collect::<Result<Vec<_>, _>>()
        .context("invalid --app")?;

    let diagnostics = TracingDiagnostics;
    let summary = UsageSummarizer::new(source, &diagnostics).summarize_at(
        now.timestamp_millis(),
        Some(window),
        Some(app_ids.as_slice()),
    );

    if args.json {
        writeln!(writer, "{}", serde_json::to_string(&summary)?)?;
    } else {
        write!(writer, "{}", format_summary(&summary, window))?;
    }
    Ok(())
}

/// Formats a summary as a human-readable ranked table.
pub fn format_summary(summary: &UsageSummary, window: TimeWindow) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "FOREGROUND TIME: {} → {}",
        format_timestamp_ms(window.begin_ms()),
        format_timestamp_ms(window.end_ms())
    );

    if summary.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "No usage recorded.");
        let _ = writeln!(output);
        let _ = writeln!(output, "Hint: Run 'uw access' to check usage access.");
        return output;
    }

    let ranked = summary.ranked();
    let max = ranked.first().map_or(0, |r| r.foreground_ms);
    let width = ranked
        .iter()
        .map(|r| r.app_id.as_str().len())
        .max()
        .unwrap_or(0);

    let _ = writeln!(output);
    for record in &ranked {
        let _ = writeln!(
            output,
            "{:<width$}  {:>7}  {}",
            record.app_id,
            format_duration(record.foreground_ms),
            progress_bar(record.foreground_ms, max),
        );
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "Total: {}", format_duration(summary.total_ms()));
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use uw_db::{Database, EventRecord};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn record(app: &str, kind: &str, ts: i64) -> EventRecord {
        EventRecord {
            id: None,
            app_id: app.to_string(),
            kind: kind.to_string(),
            timestamp_ms: ts,
        }
    }

    fn seeded_db() -> Database {
        let now_ms = now().timestamp_millis();
        let mut db = Database::open_in_memory().unwrap();
        db.set_usage_access(true).unwrap();
        db.insert_events(&[
            record("com.example.mail", "foreground", now_ms - 7_200_000),
            record("com.example.mail", "background", now_ms - 3_600_000),
            record("com.example.maps", "foreground", now_ms - 3_600_000),
            record("com.example.maps", "background", now_ms - 3_000_000),
            record("com.example.notes", "foreground", now_ms - 30_000),
        ])
        .unwrap();
        db
    }

    fn render(db: &Database, args: &SummaryArgs<'_>) -> String {
        let mut output = Vec::new();
        run(&mut output, db, &QueryConfig::default(), now(), args).unwrap();
        String::from_utf8(output).unwrap().trim_end().to_string()
    }

    #[test]
    fn summary_command_ranks_apps() {
        let db = seeded_db();
        let output = render(&db, &SummaryArgs::default());
        assert_snapshot!(output, @r"
        FOREGROUND TIME: 2026-01-14T12:00:00Z → 2026-01-15T12:00:00Z

        com.example.mail     1h 0m  ██████████
        com.example.maps    10m 0s  ██░░░░░░░░
        com.example.notes      30s  █░░░░░░░░░

        Total: 1h 10m
        ");
    }

    #[test]
    fn summary_command_json_with_filter() {
        let db = seeded_db();
        let apps = vec!["com.example.maps".to_string(), "com.example.camera".to_string()];
        let args = SummaryArgs {
            apps: &apps,
            json: true,
            ..SummaryArgs::default()
        };
        assert_snapshot!(render(&db, &args), @r#"{"com.example.maps":600000}"#);
    }

    #[test]
    fn summary_command_without_access_is_empty() {
        let mut db = seeded_db();
        db.set_usage_access(false).unwrap();
        let output = render(&db, &SummaryArgs::default());
        assert!(output.contains("No usage recorded."), "{output}");
    }

    #[test]
    fn resolve_window_defaults() {
        let window = resolve_window(None, None, now(), 86_400_000).unwrap();
        assert_eq!(window.end_ms(), now().timestamp_millis());
        assert_eq!(window.duration_ms(), 86_400_000);

        let window = resolve_window(Some("2 hours ago"), None, now(), 86_400_000).unwrap();
        assert_eq!(window.duration_ms(), 7_200_000);

        let window = resolve_window(None, Some("1 hour ago"), now(), 1_000).unwrap();
        assert_eq!(window.end_ms(), now().timestamp_millis() - 3_600_000);
        assert_eq!(window.duration_ms(), 1_000);
    }

    #[test]
    fn resolve_window_rejects_inverted() {
        let err = resolve_window(Some("1 hour ago"), Some("2 hours ago"), now(), 0).unwrap_err();
        assert!(err.to_string().contains("--end must not be before --begin"));
    }

    #[test]
    fn summary_command_rejects_empty_app() {
        let db = seeded_db();
        let apps = vec![String::new()];
        let args = SummaryArgs {
            apps: &apps,
            ..SummaryArgs::default()
        };
        let mut output = Vec::new();
        let err = run(&mut output, &db, &QueryConfig::default(), now(), &args).unwrap_err();
        assert!(err.to_string().contains("invalid --app"));
    }
}
