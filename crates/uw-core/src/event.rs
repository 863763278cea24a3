//! Raw transition events read from a usage source.

use serde::{Deserialize, Serialize};

use crate::transition_kind::TransitionKind;
use crate::types::AppId;

/// A single app lifecycle transition.
///
/// Sources yield these in non-decreasing timestamp order; equal timestamps
/// are possible and their relative order is meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    /// The app that transitioned.
    pub app_id: AppId,
    /// What happened.
    pub kind: TransitionKind,
    /// When it happened, in epoch milliseconds.
    pub timestamp_ms: i64,
}

impl TransitionEvent {
    pub const fn new(app_id: AppId, kind: TransitionKind, timestamp_ms: i64) -> Self {
        Self {
            app_id,
            kind,
            timestamp_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_uses_kind_strings() {
        let event = TransitionEvent::new(
            AppId::new("com.example.mail").unwrap(),
            TransitionKind::Foreground,
            1_700_000_000_000,
        );

        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"app_id":"com.example.mail","kind":"foreground","timestamp_ms":1700000000000}"#
        );
        let parsed: TransitionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn event_rejects_empty_app_id() {
        let json = r#"{"app_id": "", "kind": "foreground", "timestamp_ms": 1}"#;
        let result: Result<TransitionEvent, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
