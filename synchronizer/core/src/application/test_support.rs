// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Mocks shared by the synchronizer tests.

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::domain::external::{AuthTokenSource, ExternalError};
use crate::domain::object::{ObjectFields, ObjectMetadata, Projection, VersionedObject};
use crate::domain::registrar::{IdentifierRegistrar, RegistrarError, RegistrationRequest};
use crate::domain::repository::{ObjectStore, StoreError};
use crate::infrastructure::store::InMemoryObjectStore;

/// In-memory store whose updates always fail with a fixed error
pub struct FailingStore {
    pub inner: InMemoryObjectStore,
    error: StoreError,
    pub updates: AtomicUsize,
    pub fetches: AtomicUsize,
}

impl FailingStore {
    pub fn new(error: StoreError) -> Self {
        Self {
            inner: InMemoryObjectStore::new(),
            error,
            updates: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ObjectStore for FailingStore {
    async fn get_by_key(&self, ns: &str, id: &str, p: Projection) -> Result<VersionedObject, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.get_by_key(ns, id, p).await
    }

    async fn get_by_fields(&self, ns: &str, m: &ObjectFields, p: Projection) -> Result<Vec<VersionedObject>, StoreError> {
        self.inner.get_by_fields(ns, m, p).await
    }

    async fn create(&self, object: &VersionedObject) -> Result<VersionedObject, StoreError> {
        self.inner.create(object).await
    }

    async fn update(&self, _object: &VersionedObject, _p: Projection) -> Result<VersionedObject, StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

/// In-memory store that counts update calls; writes through `inner` bypass the count
#[derive(Default)]
pub struct CountingStore {
    pub inner: InMemoryObjectStore,
    pub updates: AtomicUsize,
}

impl CountingStore {
    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Simulates another worker changing `field` between our read and write
    pub async fn concurrent_set(&self, ns: &str, id: &str, field: &str, value: &str) {
        let mut object = self.inner.get_by_key(ns, id, Projection::FIELDS).await.unwrap();
        object.fields.set(field, value);
        self.inner.update(&object, Projection::FIELDS).await.unwrap();
    }
}

#[async_trait]
impl ObjectStore for CountingStore {
    async fn get_by_key(&self, ns: &str, id: &str, p: Projection) -> Result<VersionedObject, StoreError> {
        self.inner.get_by_key(ns, id, p).await
    }

    async fn get_by_fields(&self, ns: &str, m: &ObjectFields, p: Projection) -> Result<Vec<VersionedObject>, StoreError> {
        self.inner.get_by_fields(ns, m, p).await
    }

    async fn create(&self, object: &VersionedObject) -> Result<VersionedObject, StoreError> {
        self.inner.create(object).await
    }

    async fn update(&self, object: &VersionedObject, p: Projection) -> Result<VersionedObject, StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(object, p).await
    }
}

/// Registrar that answers every request with the same DOI (or error)
pub struct RecordingRegistrar {
    response: Result<String, u16>,
    pub requests: Mutex<Vec<RegistrationRequest>>,
}

impl RecordingRegistrar {
    pub fn returning(doi: &str) -> Self {
        Self {
            response: Ok(doi.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(status: u16) -> Self {
        Self {
            response: Err(status),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl IdentifierRegistrar for RecordingRegistrar {
    async fn submit(&self, request: &RegistrationRequest) -> Result<String, RegistrarError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.response {
            Ok(doi) => Ok(doi.clone()),
            Err(status) => Err(RegistrarError::Rejected {
                status: *status,
                body: "rejected".to_string(),
            }),
        }
    }
}

pub struct StaticToken;

#[async_trait]
impl AuthTokenSource for StaticToken {
    async fn token(&self) -> Result<String, ExternalError> {
        Ok("tkn".to_string())
    }
}

pub fn etd_metadata() -> ObjectMetadata {
    ObjectMetadata::new(json!({
        "title": "Sediment Transport in Braided Rivers",
        "abstract": "We measure things.",
        "author": { "computeId": "abc1x", "firstName": "Ada", "lastName": "Byron", "institution": "University of Virginia" },
        "degree": "PHD (Doctor of Philosophy)",
        "publicationDate": "2026-05-20"
    }))
}

pub fn fields(pairs: &[(&str, &str)]) -> ObjectFields {
    pairs.iter().copied().collect()
}
