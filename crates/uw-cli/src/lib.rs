//! Usage watcher CLI library.
//!
//! This crate provides the CLI interface for the usage watcher.

mod cli;
pub mod commands;
mod config;

pub use cli::{AccessAction, Cli, Commands};
pub use config::Config;
