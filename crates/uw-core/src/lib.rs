//! Core domain logic for the usage watcher.
//!
//! This crate contains the fundamental types and logic for:
//! - Foreground resolution: which app is in front right now
//! - Usage summaries: foreground time per app over a window
//! - Routing: named operations for RPC-style callers
//! - Aggregation: turning a raw transition log into foreground totals

mod aggregate;
mod config;
pub mod diagnostics;
pub mod event;
mod foreground;
pub mod permission;
pub mod router;
pub mod source;
mod summary;
pub mod transition_kind;
pub mod types;

pub use aggregate::foreground_totals;
pub use config::QueryConfig;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, NoopDiagnostics, TracingDiagnostics};
pub use event::TransitionEvent;
pub use foreground::{DEFAULT_FOREGROUND_LOOKBACK_MS, ForegroundResolver};
pub use permission::{PermissionGate, SourceGate};
pub use router::{Operation, Response, Router, UnknownOperation};
pub use source::{EventStream, MemorySource, SourceError, UsageDataSource};
pub use summary::{DEFAULT_SUMMARY_LOOKBACK_MS, UsageRecord, UsageSummarizer, UsageSummary};
pub use transition_kind::{TransitionKind, UnknownTransitionKind};
pub use types::{AppId, TimeWindow, ValidationError, now_ms};
