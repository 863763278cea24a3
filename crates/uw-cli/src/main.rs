use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use uw_cli::commands::summary::SummaryArgs;
use uw_cli::commands::{access, call, foreground, ingest, summary, util};
use uw_cli::{Cli, Commands, Config};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(uw_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = uw_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so JSON output on stdout stays parseable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let now = Utc::now();
    let mut stdout = io::stdout().lock();

    match &cli.command {
        Some(Commands::Foreground { json }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            foreground::run(
                &mut stdout,
                &db,
                &config.query_config(),
                now.timestamp_millis(),
                *json,
            )?;
        }
        Some(Commands::Summary {
            begin,
            end,
            apps,
            json,
        }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let args = SummaryArgs {
                begin: begin.as_deref(),
                end: end.as_deref(),
                apps,
                json: *json,
            };
            summary::run(&mut stdout, &db, &config.query_config(), now, &args)?;
        }
        Some(Commands::Access { action }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            access::run(&mut stdout, &mut db, *action)?;
        }
        Some(Commands::Ingest { app, kind, at }) => {
            let timestamp_ms = match at {
                Some(raw) => util::parse_time_ms(raw, now).context("invalid --at")?,
                None => now.timestamp_millis(),
            };
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            ingest::run(&mut db, app, *kind, timestamp_ms)?;
        }
        Some(Commands::Call { method, args }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            call::run(
                &mut stdout,
                &db,
                config.query_config(),
                now.timestamp_millis(),
                method,
                args.as_deref(),
            )?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}
