// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use libra_sync_core::domain::sync_config::SyncConfig;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (secrets redacted)
    Show,
}

pub async fn handle_command(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => show(),
    }
}

fn show() -> Result<()> {
    let config = SyncConfig::from_env().context("Failed to load configuration")?;

    println!("{}", "Current configuration:".bold());
    println!();
    println!("  Object store: {}", config.store_url);
    println!(
        "  HTTP: timeout {:?}, {} attempts, {:?} between attempts",
        config.transport.timeout, config.transport.max_attempts, config.transport.retry_delay
    );
    println!(
        "  Store retry: {} retries, {:?} backoff",
        config.store_retry.max_retries, config.store_retry.delay
    );
    if config.bus.is_enabled() {
        println!("  Audit bus: {} (source {})", config.bus.bus_name, config.bus.source);
    } else {
        println!("  Audit bus: {}", "(disabled)".dimmed());
    }
    println!();

    match config.registrar() {
        Ok(registrar) => println!("  {} {:?}", "DOI:".bold(), registrar),
        Err(e) => println!("  {} {}", "DOI:".bold(), e.to_string().dimmed()),
    }
    match config.sis() {
        Ok(sis) => println!("  {} {:?}", "SIS:".bold(), sis),
        Err(e) => println!("  {} {}", "SIS:".bold(), e.to_string().dimmed()),
    }
    match config.orcid() {
        Ok(orcid) => println!("  {} {:?}", "ORCID:".bold(), orcid),
        Err(e) => println!("  {} {}", "ORCID:".bold(), e.to_string().dimmed()),
    }

    Ok(())
}
