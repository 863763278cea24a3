//! Foreground command for showing the app currently in front.

use std::io::Write;

use anyhow::Result;
use serde_json::json;
use uw_core::{ForegroundResolver, QueryConfig, TracingDiagnostics, UsageDataSource};

/// Runs the foreground command as of `now_ms`.
pub fn run<W: Write, S: UsageDataSource>(
    writer: &mut W,
    source: &S,
    query: &QueryConfig,
    now_ms: i64,
    json: bool,
) -> Result<()> {
    let diagnostics = TracingDiagnostics;
    let app = ForegroundResolver::new(source, &diagnostics)
        .with_lookback_ms(query.foreground_lookback_ms)
        .resolve_foreground_at(now_ms);

    if json {
        writeln!(writer, "{}", json!({ "appId": app }))?;
        return Ok(());
    }

    match app {
        Some(app) => writeln!(writer, "Foreground app: {app}")?,
        None => writeln!(writer, "Foreground app: none")?,
    }
    Ok(())
}
