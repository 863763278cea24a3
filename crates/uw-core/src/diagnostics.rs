//! Diagnostic side channel for degraded queries.
//!
//! Queries never fail their caller because of the source; instead each
//! degradation is reported here. The collaborator is injected so callers
//! can route records to `tracing`, drop them, or capture them in tests.

use crate::router::Operation;
use crate::source::SourceError;

/// A single degraded-query record.
#[derive(Debug)]
pub enum Diagnostic<'a> {
    /// The permission check itself errored; treated as not granted.
    PermissionCheckFailed { error: &'a SourceError },

    /// An operation was skipped because usage access is not granted.
    PermissionDenied { operation: Operation },

    /// The source failed and the operation returned its empty result.
    SourceFailed {
        operation: Operation,
        error: &'a SourceError,
    },

    /// One record of the event stream was unreadable and skipped.
    MalformedEventSkipped {
        operation: Operation,
        error: &'a SourceError,
    },

    /// An aggregate entry keyed by an invalid app id was dropped.
    InvalidAppIdDropped { raw_id: &'a str },

    /// A negative aggregate value was clamped to zero.
    NegativeUsageClamped { app_id: &'a str, foreground_ms: i64 },
}

/// Fieldless discriminant of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    PermissionCheckFailed,
    PermissionDenied,
    SourceFailed,
    MalformedEventSkipped,
    InvalidAppIdDropped,
    NegativeUsageClamped,
}

impl Diagnostic<'_> {
    pub const fn kind(&self) -> DiagnosticKind {
        match self {
            Self::PermissionCheckFailed { .. } => DiagnosticKind::PermissionCheckFailed,
            Self::PermissionDenied { .. } => DiagnosticKind::PermissionDenied,
            Self::SourceFailed { .. } => DiagnosticKind::SourceFailed,
            Self::MalformedEventSkipped { .. } => DiagnosticKind::MalformedEventSkipped,
            Self::InvalidAppIdDropped { .. } => DiagnosticKind::InvalidAppIdDropped,
            Self::NegativeUsageClamped { .. } => DiagnosticKind::NegativeUsageClamped,
        }
    }
}

/// Receives diagnostic records from queries.
pub trait Diagnostics: Send + Sync {
    fn record(&self, diagnostic: &Diagnostic<'_>);
}

/// Emits diagnostics as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record(&self, diagnostic: &Diagnostic<'_>) {
        match diagnostic {
            Diagnostic::PermissionCheckFailed { error } => {
                tracing::warn!(error = %error, "usage access check failed, treating as not granted");
            }
            Diagnostic::PermissionDenied { operation } => {
                tracing::debug!(%operation, "usage access not granted");
            }
            Diagnostic::SourceFailed { operation, error } => {
                tracing::warn!(%operation, error = %error, "usage source query failed");
            }
            Diagnostic::MalformedEventSkipped { operation, error } => {
                tracing::warn!(%operation, error = %error, "skipping malformed transition event");
            }
            Diagnostic::InvalidAppIdDropped { raw_id } => {
                tracing::debug!(raw_id, "dropping aggregate entry with invalid app id");
            }
            Diagnostic::NegativeUsageClamped {
                app_id,
                foreground_ms,
            } => {
                tracing::warn!(app_id, foreground_ms, "clamping negative foreground time to zero");
            }
        }
    }
}

/// Discards all diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {
    fn record(&self, _diagnostic: &Diagnostic<'_>) {}
}
