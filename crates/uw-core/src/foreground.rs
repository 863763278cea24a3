//! Foreground app resolution.
//!
//! Scans a short recent window of transition events and reports the app
//! that most recently came to the foreground.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::permission::{PermissionGate, SourceGate};
use crate::router::Operation;
use crate::source::{SourceError, UsageDataSource};
use crate::types::{AppId, TimeWindow, now_ms};

/// How far back the resolver looks by default: 5 minutes.
pub const DEFAULT_FOREGROUND_LOOKBACK_MS: i64 = 5 * 60 * 1000;

/// Resolves the currently foregrounded app from recent transitions.
pub struct ForegroundResolver<'a, S: ?Sized> {
    source: &'a S,
    diagnostics: &'a dyn Diagnostics,
    lookback_ms: i64,
}

impl<'a, S: UsageDataSource + ?Sized> ForegroundResolver<'a, S> {
    pub fn new(source: &'a S, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            source,
            diagnostics,
            lookback_ms: DEFAULT_FOREGROUND_LOOKBACK_MS,
        }
    }

    /// Overrides the scan window length.
    #[must_use]
    pub const fn with_lookback_ms(mut self, lookback_ms: i64) -> Self {
        self.lookback_ms = lookback_ms;
        self
    }

    /// The app currently in the foreground, as of now.
    pub fn resolve_foreground(&self) -> Option<AppId> {
        self.resolve_foreground_at(now_ms())
    }

    /// The app in the foreground as of `now_ms`.
    ///
    /// Returns `None` when access is denied, the source fails, or no
    /// foreground transition happened within the lookback window.
    pub fn resolve_foreground_at(&self, now_ms: i64) -> Option<AppId> {
        if !SourceGate::new(self.source, self.diagnostics).is_granted() {
            self.diagnostics.record(&Diagnostic::PermissionDenied {
                operation: Operation::GetForegroundApp,
            });
            return None;
        }

        let window = TimeWindow::ending_at(now_ms, self.lookback_ms);
        match self.scan(window) {
            Ok(app) => app,
            Err(error) => {
                self.diagnostics.record(&Diagnostic::SourceFailed {
                    operation: Operation::GetForegroundApp,
                    error: &error,
                });
                None
            }
        }
    }

    fn scan(&self, window: TimeWindow) -> Result<Option<AppId>, SourceError> {
        let events = self.source.query_events(window)?;

        let mut last_app: Option<AppId> = None;
        let mut last_time = i64::MIN;
        for item in events {
            let event = match item {
                Ok(event) => event,
                Err(error) => {
                    self.diagnostics.record(&Diagnostic::MalformedEventSkipped {
                        operation: Operation::GetForegroundApp,
                        error: &error,
                    });
                    continue;
                }
            };
            // `>=` so that among equal timestamps the last one seen wins.
            if event.kind.is_foreground() && event.timestamp_ms >= last_time {
                last_time = event.timestamp_ms;
                last_app = Some(event.app_id);
            }
        }

        Ok(last_app)
    }
}
