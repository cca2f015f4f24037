// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Audit log queries

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::Path;

use libra_sync_core::domain::events::AuditRecord;
use libra_sync_core::domain::repository::AuditRepository;
use libra_sync_core::infrastructure::JsonLinesAuditRepository;

#[derive(Subcommand)]
pub enum AuditCommand {
    /// Print the audit records of one object as JSON lines, oldest first
    Show {
        #[arg(long, default_value = "libraetd")]
        namespace: String,

        /// Object identifier
        #[arg(long)]
        id: String,
    },
}

pub async fn handle_command(command: AuditCommand, audit_log: Option<&Path>) -> Result<()> {
    let path = audit_log.context("--audit-log (or LIBRA_SYNC_AUDIT_LOG) is required to query audit records")?;
    match command {
        AuditCommand::Show { namespace, id } => {
            for line in show(path, &namespace, &id).await? {
                println!("{}", line);
            }
            Ok(())
        }
    }
}

async fn show(path: &Path, namespace: &str, id: &str) -> Result<Vec<String>> {
    let records = JsonLinesAuditRepository::new(path)
        .find_by_object(namespace, id)
        .await
        .with_context(|| format!("Failed to read audit log {}", path.display()))?;
    records.iter().map(render).collect()
}

fn render(record: &AuditRecord) -> Result<String> {
    serde_json::to_string(record).context("Failed to encode audit record")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(id: &str, before: &str, after: &str) -> AuditRecord {
        AuditRecord {
            who: "libra-sis-notify".into(),
            namespace: "libraetd".into(),
            identifier: id.into(),
            field_name: "sis-sent".into(),
            before: before.into(),
            after: after.into(),
            event_time: Utc.with_ymd_and_hms(2026, 5, 20, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_show_filters_by_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let repo = JsonLinesAuditRepository::new(&path);
        repo.append(&record("oid:1", "", "2026-05-20T12:00:00Z")).await.unwrap();
        repo.append(&record("oid:2", "", "2026-05-20T12:00:01Z")).await.unwrap();
        repo.append(&record("oid:1", "2026-05-20T12:00:00Z", "2026-05-21T08:00:00Z")).await.unwrap();

        let lines = show(&path, "libraetd", "oid:1").await.unwrap();
        assert_eq!(lines.len(), 2);
        let last: AuditRecord = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(last.before, "2026-05-20T12:00:00Z");
        assert_eq!(last.after, "2026-05-21T08:00:00Z");
    }

    #[tokio::test]
    async fn test_show_without_log_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(show(&dir.path().join("none.jsonl"), "libraetd", "oid:1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_audit_log_path_is_required() {
        let err = handle_command(AuditCommand::Show { namespace: "libraetd".into(), id: "oid:1".into() }, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--audit-log"));
    }
}
