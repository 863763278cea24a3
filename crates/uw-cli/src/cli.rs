//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uw_core::TransitionKind;

/// App usage watcher.
///
/// Reports which app is in the foreground and how long each app has spent
/// there, from a log of app lifecycle transitions.
#[derive(Debug, Parser)]
#[command(name = "uw", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the app currently in the foreground.
    Foreground {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show foreground time per app over a window.
    Summary {
        /// Window start: ISO 8601, epoch milliseconds, or relative ("2 hours ago").
        #[arg(long)]
        begin: Option<String>,

        /// Window end (defaults to now). Same formats as --begin.
        #[arg(long)]
        end: Option<String>,

        /// Only report these app IDs (repeatable).
        #[arg(long = "app", value_name = "APP_ID")]
        apps: Vec<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show or change usage access.
    Access {
        #[command(subcommand)]
        action: Option<AccessAction>,
    },

    /// Record an app transition event.
    Ingest {
        /// The app ID (e.g., com.example.mail).
        #[arg(long)]
        app: String,

        /// Transition kind: foreground, activity_resumed, background, activity_paused, other.
        #[arg(long)]
        kind: TransitionKind,

        /// When it happened (defaults to now).
        #[arg(long)]
        at: Option<String>,
    },

    /// Dispatch a named operation and print the JSON response.
    Call {
        /// Operation name (e.g., getForegroundApp, fetchUsageSummary).
        method: String,

        /// Operation arguments as a JSON object.
        #[arg(long)]
        args: Option<String>,
    },
}

/// Usage access changes.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum AccessAction {
    /// Allow usage queries.
    Grant,
    /// Deny usage queries.
    Revoke,
}
