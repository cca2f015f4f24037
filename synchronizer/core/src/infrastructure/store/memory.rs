// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-memory object store.
//!
//! Enforces the same optimistic-concurrency contract as the proxy-backed
//! store: every accepted write advances a per-object counter and a write
//! presenting any other version is rejected with `StaleVersion`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::domain::object::{ObjectFields, ObjectId, ObjectMetadata, Projection, Version, VersionedObject};
use crate::domain::repository::{ObjectStore, StoreError};

#[derive(Debug, Clone)]
struct StoredObject {
    revision: u64,
    fields: ObjectFields,
    metadata: Option<ObjectMetadata>,
}

type Key = (String, String);

#[derive(Clone, Default)]
pub struct InMemoryObjectStore {
    objects: Arc<RwLock<HashMap<Key, StoredObject>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().map(|objects| objects.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<Key, StoredObject>>, StoreError> {
        self.objects
            .read()
            .map_err(|_| StoreError::Unavailable("object map lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<Key, StoredObject>>, StoreError> {
        self.objects
            .write()
            .map_err(|_| StoreError::Unavailable("object map lock poisoned".to_string()))
    }

    fn project(namespace: &str, id: &str, stored: &StoredObject, projection: Projection) -> VersionedObject {
        VersionedObject {
            namespace: namespace.to_string(),
            id: ObjectId::new(id),
            version: Version::new(stored.revision.to_string()),
            fields: if projection.includes_fields() { stored.fields.clone() } else { ObjectFields::new() },
            metadata: if projection.includes_metadata() { stored.metadata.clone() } else { None },
        }
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get_by_key(&self, namespace: &str, id: &str, projection: Projection) -> Result<VersionedObject, StoreError> {
        let objects = self.read()?;
        objects
            .get(&(namespace.to_string(), id.to_string()))
            .map(|stored| Self::project(namespace, id, stored, projection))
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", namespace, id)))
    }

    async fn get_by_fields(
        &self,
        namespace: &str,
        matches: &ObjectFields,
        projection: Projection,
    ) -> Result<Vec<VersionedObject>, StoreError> {
        let objects = self.read()?;
        let mut found: Vec<VersionedObject> = objects
            .iter()
            .filter(|((ns, _), stored)| ns == namespace && stored.fields.matches_all(matches))
            .map(|((ns, id), stored)| Self::project(ns, id, stored, projection))
            .collect();
        found.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(found)
    }

    async fn create(&self, object: &VersionedObject) -> Result<VersionedObject, StoreError> {
        if object.namespace.is_empty() {
            return Err(StoreError::BadParameter("namespace is required".to_string()));
        }
        let id = if object.id.is_assigned() {
            object.id.as_str().to_string()
        } else {
            format!("oid:{}", Uuid::new_v4().simple())
        };

        let mut objects = self.write()?;
        let key = (object.namespace.clone(), id.clone());
        if objects.contains_key(&key) {
            return Err(StoreError::Conflict(format!("{}/{}", object.namespace, id)));
        }
        let stored = StoredObject {
            revision: 1,
            fields: object.fields.clone(),
            metadata: object.metadata.clone(),
        };
        let created = Self::project(&object.namespace, &id, &stored, Projection::ALL);
        objects.insert(key, stored);
        Ok(created)
    }

    async fn update(&self, object: &VersionedObject, projection: Projection) -> Result<VersionedObject, StoreError> {
        let mut objects = self.write()?;
        let key = (object.namespace.clone(), object.id.as_str().to_string());
        let stored = objects
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound(object.key()))?;

        if object.version.as_str() != stored.revision.to_string() {
            return Err(StoreError::StaleVersion(format!(
                "{} presented version {}, current is {}",
                object.key(),
                object.version,
                stored.revision
            )));
        }

        if projection.includes_fields() {
            stored.fields = object.fields.clone();
        }
        if projection.includes_metadata() {
            stored.metadata = object.metadata.clone();
        }
        stored.revision += 1;
        Ok(Self::project(&object.namespace, object.id.as_str(), stored, projection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(pairs: &[(&str, &str)]) -> ObjectFields {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_version() {
        let store = InMemoryObjectStore::new();
        let created = store
            .create(&VersionedObject::new("libraetd").with_fields(fields(&[("draft", "true")])))
            .await
            .unwrap();
        assert!(created.id.is_assigned());
        assert_eq!(created.version.as_str(), "1");

        let fetched = store.get_by_key("libraetd", created.id.as_str(), Projection::ALL).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_with_taken_id_conflicts() {
        let store = InMemoryObjectStore::new();
        let obj = VersionedObject::new("libraetd").with_id("oid:1");
        store.create(&obj).await.unwrap();
        assert!(matches!(store.create(&obj).await, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_get_missing_object() {
        let store = InMemoryObjectStore::new();
        let err = store.get_by_key("libraetd", "oid:nope", Projection::FIELDS).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_second_writer_on_same_version_is_stale() {
        let store = InMemoryObjectStore::new();
        let created = store.create(&VersionedObject::new("libraopen").with_id("oid:1")).await.unwrap();

        let mut first = created.clone();
        first.fields.set("sis-sent", "2026-01-01T00:00:00Z");
        let mut second = created.clone();
        second.fields.set_doi("https://doi.org/10.1/abc");

        let updated = store.update(&first, Projection::FIELDS).await.unwrap();
        assert_eq!(updated.version.as_str(), "2");
        let err = store.update(&second, Projection::FIELDS).await.unwrap_err();
        assert!(err.is_stale());

        let stored = store.get_by_key("libraopen", "oid:1", Projection::FIELDS).await.unwrap();
        assert_eq!(stored.fields.doi(), None);
        assert_eq!(stored.fields.sis_sent(), Some("2026-01-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn test_fields_projection_leaves_metadata_alone() {
        let store = InMemoryObjectStore::new();
        let created = store
            .create(
                &VersionedObject::new("libraetd")
                    .with_id("oid:1")
                    .with_metadata(ObjectMetadata::new(json!({"title": "T"}))),
            )
            .await
            .unwrap();

        let mut fields_only = store.get_by_key("libraetd", "oid:1", Projection::FIELDS).await.unwrap();
        assert!(fields_only.metadata.is_none());
        fields_only.fields.set_draft(false);
        store.update(&fields_only, Projection::FIELDS).await.unwrap();

        let stored = store.get_by_key("libraetd", created.id.as_str(), Projection::ALL).await.unwrap();
        assert_eq!(stored.metadata, created.metadata);
        assert_eq!(stored.fields.draft(), Some(false));
        assert_eq!(stored.version.as_str(), "2");
    }

    #[tokio::test]
    async fn test_get_by_fields_filters_namespace_and_values() {
        let store = InMemoryObjectStore::new();
        for (ns, id, source) in [
            ("libraetd", "oid:1", "sis:1"),
            ("libraetd", "oid:2", "sis:2"),
            ("libraopen", "oid:3", "sis:1"),
        ] {
            store
                .create(&VersionedObject::new(ns).with_id(id).with_fields(fields(&[("source-id", source)])))
                .await
                .unwrap();
        }

        let found = store
            .get_by_fields("libraetd", &fields(&[("source-id", "sis:1")]), Projection::FIELDS)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id.as_str(), "oid:1");
    }
}
