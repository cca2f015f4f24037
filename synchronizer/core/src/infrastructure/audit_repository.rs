// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Audit log implementations.
//!
//! | Implementation | Durability |
//! |----------------|------------|
//! | [`InMemoryAuditRepository`] | process lifetime; tests and dry runs |
//! | [`JsonLinesAuditRepository`] | append-only file, one JSON record per line |

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::domain::events::AuditRecord;
use crate::domain::repository::{AuditRepository, StoreError};

/// Append-only audit log held in memory
#[derive(Clone, Default)]
pub struct InMemoryAuditRepository {
    records: Arc<RwLock<Vec<AuditRecord>>>,
}

impl InMemoryAuditRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn append(&self, record: &AuditRecord) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Unavailable("audit log lock poisoned".to_string()))?;
        records.push(record.clone());
        Ok(())
    }

    async fn find_by_object(&self, namespace: &str, identifier: &str) -> Result<Vec<AuditRecord>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Unavailable("audit log lock poisoned".to_string()))?;
        Ok(records
            .iter()
            .filter(|r| r.namespace == namespace && r.identifier == identifier)
            .cloned()
            .collect())
    }
}

/// Append-only audit log kept in a JSON-lines file
pub struct JsonLinesAuditRepository {
    path: PathBuf,
    // serializes appends from concurrent recorders in this process
    write_lock: Mutex<()>,
}

impl JsonLinesAuditRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every record in the file, oldest first; a missing file is an empty log
    pub async fn records(&self) -> Result<Vec<AuditRecord>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).map_err(|e| {
                    StoreError::Serialization(format!("{} line {}: {}", self.path.display(), n + 1, e))
                })
            })
            .collect()
    }

    fn io_error(&self, err: std::io::Error) -> StoreError {
        StoreError::Unavailable(format!("audit log {}: {}", self.path.display(), err))
    }
}

#[async_trait]
impl AuditRepository for JsonLinesAuditRepository {
    async fn append(&self, record: &AuditRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(&line).await.map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))
    }

    async fn find_by_object(&self, namespace: &str, identifier: &str) -> Result<Vec<AuditRecord>, StoreError> {
        Ok(self
            .records()
            .await?
            .into_iter()
            .filter(|r| r.namespace == namespace && r.identifier == identifier)
            .collect())
    }
}
