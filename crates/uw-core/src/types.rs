//! Core type definitions with validation.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The window ends before it begins.
    #[error("time window ends before it begins: begin={begin_ms}, end={end_ms}")]
    InvertedWindow { begin_ms: i64, end_ms: i64 },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated application identifier.
    ///
    /// App IDs are the package or bundle names reported by the platform
    /// (e.g., "com.example.mail"). They must be non-empty.
    AppId, "app ID"
);

/// A closed time range in epoch milliseconds.
///
/// Both bounds are inclusive. `begin_ms <= end_ms` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    begin_ms: i64,
    end_ms: i64,
}

impl TimeWindow {
    /// Creates a window, rejecting one that ends before it begins.
    pub const fn new(begin_ms: i64, end_ms: i64) -> Result<Self, ValidationError> {
        if end_ms < begin_ms {
            return Err(ValidationError::InvertedWindow { begin_ms, end_ms });
        }
        Ok(Self { begin_ms, end_ms })
    }

    /// The window of `span_ms` milliseconds ending at `end_ms`.
    ///
    /// Negative spans are treated as zero; the begin saturates at `i64::MIN`.
    #[must_use]
    pub const fn ending_at(end_ms: i64, span_ms: i64) -> Self {
        let span_ms = if span_ms < 0 { 0 } else { span_ms };
        Self {
            begin_ms: end_ms.saturating_sub(span_ms),
            end_ms,
        }
    }

    #[must_use]
    pub const fn begin_ms(&self) -> i64 {
        self.begin_ms
    }

    #[must_use]
    pub const fn end_ms(&self) -> i64 {
        self.end_ms
    }

    /// Length of the window in milliseconds.
    #[must_use]
    pub const fn duration_ms(&self) -> i64 {
        self.end_ms.saturating_sub(self.begin_ms)
    }

    /// Whether `timestamp_ms` falls inside the window.
    #[must_use]
    pub const fn contains(&self, timestamp_ms: i64) -> bool {
        timestamp_ms >= self.begin_ms && timestamp_ms <= self.end_ms
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.begin_ms, self.end_ms)
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_id_rejects_empty() {
        assert!(AppId::new("").is_err());
        assert!(AppId::new("com.example.mail").is_ok());
    }

    #[test]
    fn app_id_serde_roundtrip() {
        let id = AppId::new("com.example.mail").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"com.example.mail\"");
        let parsed: AppId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn app_id_serde_rejects_empty() {
        let result: Result<AppId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn app_id_as_ref() {
        let id = AppId::new("com.example.maps").unwrap();
        let s: &str = id.as_ref();
        assert_eq!(s, "com.example.maps");
    }

    #[test]
    fn app_id_display_honors_width() {
        let id = AppId::new("mail").unwrap();
        assert_eq!(format!("{id:<6}|"), "mail  |");
        assert_eq!(format!("{id:>6}|"), "  mail|");
        assert_eq!(format!("{id}"), "mail");
    }

    // ========== TimeWindow Tests ==========

    #[test]
    fn window_rejects_inverted_bounds() {
        assert_eq!(
            TimeWindow::new(200, 100),
            Err(ValidationError::InvertedWindow {
                begin_ms: 200,
                end_ms: 100
            })
        );
        assert!(TimeWindow::new(100, 100).is_ok());
    }

    #[test]
    fn window_ending_at_subtracts_span() {
        let window = TimeWindow::ending_at(10_000, 3_000);
        assert_eq!(window.begin_ms(), 7_000);
        assert_eq!(window.end_ms(), 10_000);
        assert_eq!(window.duration_ms(), 3_000);
    }

    #[test]
    fn window_ending_at_clamps_negative_span() {
        let window = TimeWindow::ending_at(10_000, -5);
        assert_eq!(window.begin_ms(), 10_000);
    }

    #[test]
    fn window_ending_at_saturates() {
        let window = TimeWindow::ending_at(i64::MIN + 1, 10);
        assert_eq!(window.begin_ms(), i64::MIN);
    }

    #[test]
    fn window_contains_is_inclusive() {
        let window = TimeWindow::new(100, 200).unwrap();
        assert!(window.contains(100));
        assert!(window.contains(200));
        assert!(!window.contains(99));
        assert!(!window.contains(201));
    }
}
