//! Call command: dispatches a named operation through the router.
//!
//! This is the RPC-style boundary; the response is printed as one JSON line.

use std::io::Write;

use anyhow::{Context, Result};
use serde_json::Value;
use uw_core::{QueryConfig, Router, TracingDiagnostics, UsageDataSource};

/// Runs the call command as of `now_ms`.
pub fn run<W: Write, S: UsageDataSource>(
    writer: &mut W,
    source: &S,
    query: QueryConfig,
    now_ms: i64,
    method: &str,
    args: Option<&str>,
) -> Result<()> {
    let args: Value = match args {
        Some(raw) => serde_json::from_str(raw).context("--args must be valid JSON")?,
        None => Value::Null,
    };

    let diagnostics = TracingDiagnostics;
    let response = Router::new(source, &diagnostics, query).dispatch_at(now_ms, method, &args);

    writeln!(writer, "{}", serde_json::to_string(&response)?)?;
    Ok(())
}
