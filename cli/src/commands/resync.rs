// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `resync`: locate an object by source id and re-run the DOI synchronizer

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use libra_sync_core::application::{locate_by_source_id, resync_event, EventProcessor, LocateError};
use libra_sync_core::domain::events::EventEnvelope;

use crate::wiring::Services;

pub async fn run(namespace: &str, source_id: &str, audit_log: Option<&Path>) -> Result<()> {
    let services = Services::from_env(audit_log)?;

    let object = match locate_by_source_id(services.store.as_ref(), namespace, source_id).await {
        Ok(Some(object)) => object,
        Ok(None) => {
            println!("{} no object in {} with source id {}", "!".yellow(), namespace, source_id);
            return Ok(());
        }
        Err(e @ LocateError::Ambiguous { .. }) => {
            // treated as a no-op; duplicate source ids need manual cleanup
            warn!(error = %e, "resync skipped");
            println!("{} {}", "!".yellow(), e);
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to look up object"),
    };

    let processor = EventProcessor::new(Arc::new(services.doi_synchronizer()?));
    let envelope = EventEnvelope::new(services.config.bus.source.clone(), resync_event(&object));
    let result = processor.process_envelope(&envelope).await;
    drop(processor);
    services.shutdown().await;

    let outcome = result.with_context(|| format!("Failed to resync {}", object.key()))?;
    println!("{} {}: {}", "✓".green(), object.key(), outcome.label());
    Ok(())
}
