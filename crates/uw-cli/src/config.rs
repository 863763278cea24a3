//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use uw_core::QueryConfig;

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// How far back `uw foreground` looks for transitions.
    pub foreground_lookback_secs: u64,

    /// Default `uw summary` window when `--begin` is omitted.
    pub summary_lookback_hours: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("foreground_lookback_secs", &self.foreground_lookback_secs)
            .field("summary_lookback_hours", &self.summary_lookback_hours)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("uw.db"),
            foreground_lookback_secs: 5 * 60,
            summary_lookback_hours: 24,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (UW_*)
        figment = figment.merge(Env::prefixed("UW_"));

        figment.extract()
    }

    /// Lookback windows in the units the core works in.
    pub fn query_config(&self) -> QueryConfig {
        QueryConfig {
            foreground_lookback_ms: secs_to_ms(self.foreground_lookback_secs),
            summary_lookback_ms: secs_to_ms(self.summary_lookback_hours.saturating_mul(3600)),
        }
    }
}

fn secs_to_ms(secs: u64) -> i64 {
    i64::try_from(secs)
        .unwrap_or(i64::MAX)
        .saturating_mul(1000)
}

/// Returns the platform-specific config directory for uw.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("uw"))
}

/// Returns the platform-specific data directory for uw.
///
/// On Linux: `~/.local/share/uw`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("uw"))
}
