//! Ingest command for recording app transition events.

use anyhow::{Context, Result};
use uw_core::{AppId, TransitionEvent, TransitionKind};
use uw_db::{Database, EventRecord};

/// Records one transition of `app` at `timestamp_ms`.
pub fn run(db: &mut Database, app: &str, kind: TransitionKind, timestamp_ms: i64) -> Result<()> {
    let app_id = AppId::new(app).context("invalid --app")?;
    let event = TransitionEvent::new(app_id, kind, timestamp_ms);
    db.insert_events(&[EventRecord::from(&event)])
        .context("failed to store event")?;
    tracing::debug!(app = %event.app_id, %kind, timestamp_ms, "event ingested");
    Ok(())
}
