//! Storage layer for the usage watcher.
//!
//! Keeps a local log of app transition events and the usage-access grant
//! flag in `SQLite` via `rusqlite`, and serves both through
//! [`UsageDataSource`].
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! This means a `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! For multi-threaded access, either:
//! - Use a `Mutex<Database>` to serialize access
//! - Use separate `Database` instances per thread
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as INTEGER epoch milliseconds, the unit the usage
//! source contract speaks. Events with equal timestamps are ordered by their
//! autoincrement `id`, i.e. insertion order.
//!
//! ## Event Kinds
//!
//! The `kind` column stores the canonical [`TransitionKind`] string. Rows with
//! an unrecognized kind or an empty `app_id` are kept but surface as
//! malformed items when read back through the source.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;
use uw_core::{
    AppId, EventStream, SourceError, TimeWindow, TransitionEvent, TransitionKind, UsageDataSource,
    foreground_totals,
};

/// Settings key holding the usage-access grant.
const USAGE_ACCESS_KEY: &str = "usage_access";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl From<DbError> for SourceError {
    fn from(err: DbError) -> Self {
        Self::backend(err)
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A raw transition event as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Row id, assigned on insert.
    pub id: Option<i64>,
    pub app_id: String,
    pub kind: String,
    pub timestamp_ms: i64,
}

impl From<&TransitionEvent> for EventRecord {
    fn from(event: &TransitionEvent) -> Self {
        Self {
            id: None,
            app_id: event.app_id.to_string(),
            kind: event.kind.to_string(),
            timestamp_ms: event.timestamp_ms,
        }
    }
}

impl TryFrom<&EventRecord> for TransitionEvent {
    type Error = SourceError;

    fn try_from(record: &EventRecord) -> Result<Self, Self::Error> {
        let row = record.id.unwrap_or_default();
        let app_id = AppId::new(record.app_id.as_str())
            .map_err(|e| SourceError::MalformedEvent(format!("row {row}: {e}")))?;
        let kind: TransitionKind = record
            .kind
            .parse()
            .map_err(|e| SourceError::MalformedEvent(format!("row {row}: {e}")))?;
        Ok(Self::new(app_id, kind, record.timestamp_ms))
    }
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Events table: app lifecycle transitions
            -- kind: transition kind (e.g., 'foreground', 'activity_paused')
            -- timestamp_ms: epoch milliseconds
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                app_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                timestamp_ms INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp_ms);
            CREATE INDEX IF NOT EXISTS idx_events_app_timestamp ON events(app_id, timestamp_ms);

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Inserts a batch of events in one transaction.
    pub fn insert_events(&mut self, events: &[EventRecord]) -> Result<usize, DbError> {
        if events.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt =
                tx.prepare("INSERT INTO events (app_id, kind, timestamp_ms) VALUES (?, ?, ?)")?;
            for event in events {
                inserted += stmt.execute(params![event.app_id, event.kind, event.timestamp_ms])?;
            }
        }
        tx.commit()?;
        tracing::debug!(inserted, "stored transition events");
        Ok(inserted)
    }

    /// Lists events within a time range.
    ///
    /// Both bounds are inclusive. Ordered by timestamp, then insertion order.
    pub fn list_events_in_range(&self, begin_ms: i64, end_ms: i64) -> Result<Vec<EventRecord>, DbError> {
        if end_ms < begin_ms {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(
            "
            SELECT id, app_id, kind, timestamp_ms
            FROM events
            WHERE timestamp_ms >= ? AND timestamp_ms <= ?
            ORDER BY timestamp_ms ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map([begin_ms, end_ms], |row| {
            Ok(EventRecord {
                id: Some(row.get(0)?),
                app_id: row.get(1)?,
                kind: row.get(2)?,
                timestamp_ms: row.get(3)?,
            })
        })?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    /// The app in the foreground just before `begin_ms`, if any.
    ///
    /// Looks at the last foreground- or background-equivalent transition
    /// before `begin_ms`; only a foreground one leaves an app in front.
    pub fn foreground_carry_in(&self, begin_ms: i64) -> Result<Option<AppId>, DbError> {
        let kinds = transition_kinds_sql(|kind| kind.is_foreground() || kind.is_background());
        let sql = format!(
            "
            SELECT app_id, kind
            FROM events
            WHERE timestamp_ms < ?1 AND kind IN ({kinds})
            ORDER BY timestamp_ms DESC, id DESC
            LIMIT 1
            "
        );
        let last: Option<(String, String)> = self
            .conn
            .query_row(&sql, [begin_ms], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        let Some((app_id, kind)) = last else {
            return Ok(None);
        };
        if !kind
            .parse::<TransitionKind>()
            .is_ok_and(|kind| kind.is_foreground())
        {
            return Ok(None);
        }
        match AppId::new(app_id) {
            Ok(app) => Ok(Some(app)),
            Err(err) => {
                tracing::warn!(error = %err, "skipping carried-in session with invalid app id");
                Ok(None)
            }
        }
    }

    /// Whether usage access has been granted. Defaults to `false`.
    pub fn usage_access(&self) -> Result<bool, DbError> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                [USAGE_ACCESS_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.as_deref() == Some("1"))
    }

    /// Grants or revokes usage access.
    pub fn set_usage_access(&mut self, granted: bool) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![USAGE_ACCESS_KEY, if granted { "1" } else { "0" }],
        )?;
        tracing::info!(granted, "updated usage access");
        Ok(())
    }
}

/// Quoted, comma-separated kind strings for an SQL `IN` list.
fn transition_kinds_sql(include: impl Fn(&TransitionKind) -> bool) -> String {
    TransitionKind::ALL
        .iter()
        .filter(|kind| include(kind))
        .map(|kind| format!("'{}'", kind.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

impl UsageDataSource for Database {
    fn is_permission_granted(&self) -> Result<bool, SourceError> {
        Ok(self.usage_access()?)
    }

    fn query_events(&self, window: TimeWindow) -> Result<EventStream<'_>, SourceError> {
        let records = self.list_events_in_range(window.begin_ms(), window.end_ms())?;
        Ok(Box::new(
            records
                .into_iter()
                .map(|record| TransitionEvent::try_from(&record)),
        ))
    }

    fn query_aggregated_usage(
        &self,
        window: TimeWindow,
    ) -> Result<Option<HashMap<String, i64>>, SourceError> {
        let records = self.list_events_in_range(window.begin_ms(), window.end_ms())?;
        let mut events = Vec::with_capacity(records.len());
        for record in &records {
            match TransitionEvent::try_from(record) {
                Ok(event) => events.push(event),
                Err(err) => tracing::warn!(error = %err, "skipping malformed event in aggregation"),
            }
        }
        let carried_in = self.foreground_carry_in(window.begin_ms())?;

        let totals = foreground_totals(&events, window, carried_in.as_ref());
        if totals.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            totals
                .into_iter()
                .map(|(app, ms)| (String::from(app), ms))
                .collect(),
        ))
    }
}
