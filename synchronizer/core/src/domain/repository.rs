// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts used by the synchronizers. Interfaces live in the
//! domain layer, implementations in `crate::infrastructure`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `ObjectStore` | `VersionedObject` | `InMemoryObjectStore`, `HttpObjectStore` |
//! | `AuditRepository` | `AuditRecord` | `InMemoryAuditRepository` |
//!
//! ## Optimistic Concurrency
//!
//! `ObjectStore::update` only succeeds when the presented version equals the
//! stored one. A mismatch is reported as [`StoreError::StaleVersion`], the one
//! error callers are expected to recover from programmatically (see
//! `crate::application::update_with_retry`). The store never merges.

use async_trait::async_trait;
use crate::domain::events::AuditRecord;
use crate::domain::object::{ObjectFields, Projection, VersionedObject};

/// Client contract for the versioned object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one object. Fails with `NotFound` if absent.
    async fn get_by_key(
        &self,
        namespace: &str,
        id: &str,
        projection: Projection,
    ) -> Result<VersionedObject, StoreError>;

    /// Fetch every object in the namespace whose fields contain all of `matches`
    async fn get_by_fields(
        &self,
        namespace: &str,
        matches: &ObjectFields,
        projection: Projection,
    ) -> Result<Vec<VersionedObject>, StoreError>;

    /// Create an object; the store assigns the id (unless pre-assigned) and the
    /// initial version.
    async fn create(&self, object: &VersionedObject) -> Result<VersionedObject, StoreError>;

    /// Version-checked write of the projected parts of `object`.
    /// Returns the object as stored, carrying its new version.
    async fn update(
        &self,
        object: &VersionedObject,
        projection: Projection,
    ) -> Result<VersionedObject, StoreError>;
}

/// Append-only store of audit records
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append(&self, record: &AuditRecord) -> Result<(), StoreError>;

    /// Records for one object, oldest first
    async fn find_by_object(&self, namespace: &str, identifier: &str) -> Result<Vec<AuditRecord>, StoreError>;
}

/// Object store errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Object already exists: {0}")]
    Conflict(String),

    #[error("Stale object version: {0}")]
    StaleVersion(String),

    #[error("Bad parameter: {0}")]
    BadParameter(String),

    #[error("Object store unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn is_stale(&self) -> bool {
        matches!(self, StoreError::StaleVersion(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
