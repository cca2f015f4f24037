// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Libra Sync CLI
//!
//! The `libra-sync` binary runs one synchronizer over a batch of domain
//! events read from a file or stdin.
//!
//! ## Commands
//!
//! - `libra-sync doi|sis-notify|orcid [--events FILE]` - process events
//! - `libra-sync resync --namespace NS --source-id ID` - force a DOI refresh
//! - `libra-sync audit show --namespace NS --id ID` - print an object's audit records
//! - `libra-sync config show` - print the effective (redacted) configuration
//!
//! `--audit-log FILE` appends every audit record to a JSON-lines file, which
//! `audit show` reads back.
//!
//! Configuration comes from the environment; a `.env` file in the working
//! directory is loaded first.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

mod commands;
mod wiring;

use commands::{AuditCommand, ConfigCommand};

/// Libra Sync - keep Libra works in step with DOI, SIS and ORCID
#[derive(Parser)]
#[command(name = "libra-sync")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "LIBRA_SYNC_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// JSON-lines file that audit records are appended to and queried from
    #[arg(long, global = true, env = "LIBRA_SYNC_AUDIT_LOG", value_name = "FILE")]
    audit_log: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register or refresh DOIs
    #[command(name = "doi")]
    Doi {
        /// Events file (JSON array, object or one object per line); `-` reads stdin
        #[arg(long, value_name = "FILE", default_value = "-")]
        events: PathBuf,
    },

    /// Notify SIS of published theses
    #[command(name = "sis-notify")]
    SisNotify {
        #[arg(long, value_name = "FILE", default_value = "-")]
        events: PathBuf,
    },

    /// Push published works to authors' ORCID records
    #[command(name = "orcid")]
    Orcid {
        #[arg(long, value_name = "FILE", default_value = "-")]
        events: PathBuf,
    },

    /// Re-synchronize the DOI of the object with a given source id
    #[command(name = "resync")]
    Resync {
        #[arg(long, default_value = "libraetd")]
        namespace: String,

        /// Value of the object's `source-id` field, e.g. `sis:12345`
        #[arg(long)]
        source_id: String,
    },

    /// Query the audit log
    #[command(name = "audit")]
    Audit {
        #[command(subcommand)]
        command: AuditCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // before parsing so `.env` can supply clap's env defaults
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => return Err(e).context("Failed to load .env file"),
    }

    let audit_log = cli.audit_log.as_deref();
    match cli.command {
        Commands::Doi { events } => {
            commands::sync::run(commands::sync::Synchronizer::Doi, &events, audit_log).await
        }
        Commands::SisNotify { events } => {
            commands::sync::run(commands::sync::Synchronizer::SisNotify, &events, audit_log).await
        }
        Commands::Orcid { events } => {
            commands::sync::run(commands::sync::Synchronizer::Orcid, &events, audit_log).await
        }
        Commands::Resync { namespace, source_id } => {
            commands::resync::run(&namespace, &source_id, audit_log).await
        }
        Commands::Audit { command } => commands::audit::handle_command(command, audit_log).await,
        Commands::Config { command } => commands::config::handle_command(command).await,
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
