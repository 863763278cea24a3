//! Request routing for RPC-style callers.
//!
//! A fixed set of operations is addressable by wire name. Unknown names get
//! a "not implemented" response instead of being ignored.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::config::QueryConfig;
use crate::diagnostics::Diagnostics;
use crate::foreground::ForegroundResolver;
use crate::permission::{PermissionGate, SourceGate};
use crate::source::UsageDataSource;
use crate::summary::UsageSummarizer;
use crate::types::{AppId, TimeWindow, ValidationError, now_ms};

/// Error code for requests rejected before reaching the core.
pub const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";

/// Supported operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    IsUsageAccessGranted,
    GetForegroundApp,
    FetchUsageSummary,
}

impl Operation {
    pub const ALL: [Self; 3] = [
        Self::IsUsageAccessGranted,
        Self::GetForegroundApp,
        Self::FetchUsageSummary,
    ];

    /// Wire name of the operation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::IsUsageAccessGranted => "isUsageAccessGranted",
            Self::GetForegroundApp => "getForegroundApp",
            Self::FetchUsageSummary => "fetchUsageSummary",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

/// Error type for unknown operation names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operation: {0}")]
pub struct UnknownOperation(String);

/// Outcome of a routed request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Success { value: Value },
    Error { code: String, message: String },
    NotImplemented,
}

impl Response {
    fn invalid_argument(err: &ArgumentError) -> Self {
        Self::Error {
            code: INVALID_ARGUMENT.to_string(),
            message: err.to_string(),
        }
    }
}

/// Reasons a request's arguments are rejected.
#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("invalid arguments: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Arguments of `fetchUsageSummary`.
///
/// The default window applies unless both `begin` and `end` are given.
#[derive(Debug, Default, Deserialize)]
struct SummaryArgs {
    #[serde(default)]
    begin: Option<i64>,
    #[serde(default)]
    end: Option<i64>,
    #[serde(default)]
    packages: Option<Vec<String>>,
}

impl SummaryArgs {
    fn parse(args: &Value) -> Result<Self, ArgumentError> {
        if args.is_null() {
            return Ok(Self::default());
        }
        Ok(Self::deserialize(args)?)
    }

    fn window(&self) -> Result<Option<TimeWindow>, ValidationError> {
        match (self.begin, self.end) {
            (Some(begin), Some(end)) => TimeWindow::new(begin, end).map(Some),
            _ => Ok(None),
        }
    }

    fn app_ids(&self) -> Result<Option<Vec<AppId>>, ValidationError> {
        self.packages
            .as_ref()
            .map(|packages| packages.iter().map(|p| AppId::new(p.as_str())).collect())
            .transpose()
    }
}

/// Dispatches named operations to the resolver and summarizer.
pub struct Router<'a, S: ?Sized> {
    source: &'a S,
    diagnostics: &'a dyn Diagnostics,
    config: QueryConfig,
}

impl<'a, S: UsageDataSource + ?Sized> Router<'a, S> {
    pub fn new(source: &'a S, diagnostics: &'a dyn Diagnostics, config: QueryConfig) -> Self {
        Self {
            source,
            diagnostics,
            config,
        }
    }

    /// Handles `method` with `args` as of now.
    pub fn dispatch(&self, method: &str, args: &Value) -> Response {
        self.dispatch_at(now_ms(), method, args)
    }

    /// Handles `method` with `args` as of `now_ms`.
    pub fn dispatch_at(&self, now_ms: i64, method: &str, args: &Value) -> Response {
        let Ok(operation) = method.parse::<Operation>() else {
            tracing::debug!(method, "unsupported operation");
            return Response::NotImplemented;
        };
        tracing::debug!(%operation, "dispatching");

        let result = match operation {
            Operation::IsUsageAccessGranted => Ok(self.is_usage_access_granted()),
            Operation::GetForegroundApp => Ok(self.foreground_app(now_ms)),
            Operation::FetchUsageSummary => self.usage_summary(now_ms, args),
        };

        match result {
            Ok(value) => Response::Success { value },
            Err(err) => {
                tracing::debug!(%operation, error = %err, "rejected request");
                Response::invalid_argument(&err)
            }
        }
    }

    fn is_usage_access_granted(&self) -> Value {
        Value::Bool(SourceGate::new(self.source, self.diagnostics).is_granted())
    }

    fn foreground_app(&self, now_ms: i64) -> Value {
        let app = ForegroundResolver::new(self.source, self.diagnostics)
            .with_lookback_ms(self.config.foreground_lookback_ms)
            .resolve_foreground_at(now_ms);
        json!({ "appId": app })
    }

    fn usage_summary(&self, now_ms: i64, args: &Value) -> Result<Value, ArgumentError> {
        let args = SummaryArgs::parse(args)?;
        let window = args.window()?;
        let app_ids = args.app_ids()?;

        let summary = UsageSummarizer::new(self.source, self.diagnostics)
            .with_lookback_ms(self.config.summary_lookback_ms)
            .summarize_at(now_ms, window, app_ids.as_deref());
        Ok(serde_json::to_value(summary)?)
    }
}
