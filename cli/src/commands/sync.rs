// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Event processing commands: doi, sis-notify, orcid

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use libra_sync_core::application::{decode_events, BatchReport, EventHandler, EventProcessor, SyncOutcome};

use crate::wiring::Services;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Synchronizer {
    Doi,
    SisNotify,
    Orcid,
}

pub async fn run(which: Synchronizer, events: &Path, audit_log: Option<&Path>) -> Result<()> {
    let input = read_events(events)?;
    let envelopes = decode_events(&input).context("Failed to decode events")?;

    let services = Services::from_env(audit_log)?;
    let handler: Arc<dyn EventHandler> = match which {
        Synchronizer::Doi => Arc::new(services.doi_synchronizer()?),
        Synchronizer::SisNotify => Arc::new(services.sis_notifier()?),
        Synchronizer::Orcid => Arc::new(services.orcid_synchronizer()?),
    };

    let processor = EventProcessor::new(handler);
    info!(handler = processor.handler_name(), events = envelopes.len(), "processing batch");

    let summary = Summary::from_report(&processor.process_batch(&envelopes).await);
    drop(processor);

    let audited = services.shutdown().await;
    summary.print(audited);

    if summary.failed > 0 {
        anyhow::bail!("{} of {} events failed", summary.failed, envelopes.len());
    }
    Ok(())
}

fn read_events(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read events from stdin")?;
        return Ok(input);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read events from {}", path.display()))
}

#[derive(Debug, Default)]
struct Summary {
    updated: usize,
    unchanged: usize,
    skipped: usize,
    rejected: usize,
    failed: usize,
}

impl Summary {
    fn from_report(report: &BatchReport) -> Self {
        let mut summary = Summary {
            failed: report.failed,
            ..Default::default()
        };
        for outcome in &report.outcomes {
            summary.add(outcome);
        }
        summary
    }

    fn add(&mut self, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::Updated { .. } => self.updated += 1,
            SyncOutcome::Unchanged => self.unchanged += 1,
            SyncOutcome::Ignored(_) | SyncOutcome::NoAction => self.skipped += 1,
            SyncOutcome::Rejected(_) => self.rejected += 1,
        }
    }

    fn print(&self, audited: u64) {
        println!("{}", "Sync summary:".bold());
        println!("  Updated:   {}", self.updated.to_string().green());
        println!("  Unchanged: {}", self.unchanged);
        println!("  Skipped:   {}", self.skipped);
        println!("  Rejected:  {}", self.rejected.to_string().yellow());
        println!("  Failed:    {}", self.failed.to_string().red());
        println!("  Audited:   {}", audited);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libra_sync_core::application::Violation;
    use std::io::Write;

    #[test]
    fn test_read_events_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"event_name":"object-published","namespace":"libraetd","identifier":"oid:1"}}"#).unwrap();
        let input = read_events(file.path()).unwrap();
        assert_eq!(decode_events(&input).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(read_events(Path::new("/nonexistent/events.json")).is_err());
    }

    #[test]
    fn test_summary_from_batch_report() {
        let report = BatchReport {
            outcomes: vec![
                SyncOutcome::Updated {
                    field: "doi".into(),
                    before: "".into(),
                    after: "https://doi.org/10.1/abc".into(),
                },
                SyncOutcome::NoAction,
            ],
            failed: 2,
            last_error: None,
        };
        let summary = Summary::from_report(&report);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 2);
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = Summary::default();
        summary.add(&SyncOutcome::Unchanged);
        summary.add(&SyncOutcome::NoAction);
        summary.add(&SyncOutcome::Ignored("x".into()));
        summary.add(&SyncOutcome::Rejected(Violation::IllegalTransition {
            event: "object-published".into(),
            reason: "draft".into(),
        }));
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.rejected, 1);
    }
}
