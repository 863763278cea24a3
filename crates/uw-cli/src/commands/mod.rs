//! CLI subcommand implementations.

pub mod access;
pub mod call;
pub mod foreground;
pub mod ingest;
pub mod summary;
pub mod util;
