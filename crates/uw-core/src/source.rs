//! The external usage data source consumed by the core.
//!
//! A source is whatever the platform offers for reading app usage: an OS
//! usage-stats service, a local event log, a test fixture. The core only
//! reads from it and never caches what it returns.

use std::collections::HashMap;

use thiserror::Error;

use crate::event::TransitionEvent;
use crate::types::TimeWindow;

/// Errors reported by a usage source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The usage service is missing or refused the request.
    #[error("usage source unavailable: {0}")]
    Unavailable(String),

    /// A single record in the event stream could not be read.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// An error from the storage or service backing the source.
    #[error("usage source backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SourceError {
    /// Wraps a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// Transition events in source order.
///
/// Items are individually fallible so one corrupt record does not poison the
/// rest of the stream.
pub type EventStream<'a> = Box<dyn Iterator<Item = Result<TransitionEvent, SourceError>> + 'a>;

/// A provider of app transition events and pre-aggregated foreground usage.
pub trait UsageDataSource {
    /// Whether the caller currently holds usage access.
    fn is_permission_granted(&self) -> Result<bool, SourceError>;

    /// Transition events inside `window`, ascending by timestamp.
    ///
    /// Timestamps need not be strictly increasing.
    fn query_events(&self, window: TimeWindow) -> Result<EventStream<'_>, SourceError>;

    /// Total foreground milliseconds per app id inside `window`.
    ///
    /// `None` means the source has no data for the window.
    fn query_aggregated_usage(
        &self,
        window: TimeWindow,
    ) -> Result<Option<HashMap<String, i64>>, SourceError>;
}

impl<S: UsageDataSource + ?Sized> UsageDataSource for &S {
    fn is_permission_granted(&self) -> Result<bool, SourceError> {
        (**self).is_permission_granted()
    }

    fn query_events(&self, window: TimeWindow) -> Result<EventStream<'_>, SourceError> {
        (**self).query_events(window)
    }

    fn query_aggregated_usage(
        &self,
        window: TimeWindow,
    ) -> Result<Option<HashMap<String, i64>>, SourceError> {
        (**self).query_aggregated_usage(window)
    }
}

/// A fixed in-memory snapshot of usage data.
///
/// Events are filtered to the requested window; the aggregate table is
/// returned as-is regardless of window.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pub granted: bool,
    pub events: Vec<TransitionEvent>,
    pub aggregate: Option<HashMap<String, i64>>,
}

impl MemorySource {
    /// A granted source with the given events and no aggregate table.
    pub fn with_events(events: Vec<TransitionEvent>) -> Self {
        Self {
            granted: true,
            events,
            aggregate: None,
        }
    }

    /// A granted source with the given aggregate table and no events.
    pub fn with_aggregate<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, i64)>,
        K: Into<String>,
    {
        Self {
            granted: true,
            events: Vec::new(),
            aggregate: Some(entries.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }
}

impl UsageDataSource for MemorySource {
    fn is_permission_granted(&self) -> Result<bool, SourceError> {
        Ok(self.granted)
    }

    fn query_events(&self, window: TimeWindow) -> Result<EventStream<'_>, SourceError> {
        Ok(Box::new(
            self.events
                .iter()
                .filter(move |event| window.contains(event.timestamp_ms))
                .cloned()
                .map(Ok),
        ))
    }

    fn query_aggregated_usage(
        &self,
        _window: TimeWindow,
    ) -> Result<Option<HashMap<String, i64>>, SourceError> {
        Ok(self.aggregate.clone())
    }
}
