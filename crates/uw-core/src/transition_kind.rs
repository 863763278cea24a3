//! Transition kind enum as the single source of truth for kind strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of app lifecycle transitions reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    /// The app moved to the foreground.
    Foreground,
    /// An activity of the app resumed. Richer platforms report this alongside
    /// (or instead of) `Foreground`.
    ActivityResumed,
    /// The app moved to the background.
    Background,
    /// An activity of the app paused.
    ActivityPaused,
    /// Any other platform event (configuration change, shortcut use, ...).
    Other,
}

impl TransitionKind {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Foreground,
        Self::ActivityResumed,
        Self::Background,
        Self::ActivityPaused,
        Self::Other,
    ];

    /// String representation for storage and wire formats.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Foreground => "foreground",
            Self::ActivityResumed => "activity_resumed",
            Self::Background => "background",
            Self::ActivityPaused => "activity_paused",
            Self::Other => "other",
        }
    }

    /// Whether this kind signals the app became the active, user-visible app.
    #[must_use]
    pub const fn is_foreground(&self) -> bool {
        matches!(self, Self::Foreground | Self::ActivityResumed)
    }

    /// Whether this kind signals the app stopped being user-visible.
    #[must_use]
    pub const fn is_background(&self) -> bool {
        matches!(self, Self::Background | Self::ActivityPaused)
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransitionKind {
    type Err = UnknownTransitionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "foreground" | "move_to_foreground" => Ok(Self::Foreground),
            "activity_resumed" => Ok(Self::ActivityResumed),
            "background" | "move_to_background" => Ok(Self::Background),
            "activity_paused" => Ok(Self::ActivityPaused),
            "other" => Ok(Self::Other),
            _ => Err(UnknownTransitionKind(s.to_string())),
        }
    }
}

impl Serialize for TransitionKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TransitionKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown transition kind strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTransitionKind(String);

impl fmt::Display for UnknownTransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown transition kind: {}", self.0)
    }
}

impl std::error::Error for UnknownTransitionKind {}
