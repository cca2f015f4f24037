// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Versioned Object Model
//!
//! The unit of storage in the Libra object store: a namespaced, versioned
//! record made of an ordered string field map plus an optional opaque
//! metadata payload.
//!
//! # Invariants
//!
//! - `(namespace, id)` identifies an object. The id is assigned by the store
//!   at creation and never changes afterwards.
//! - `version` is an opaque concurrency token owned by the store. Clients only
//!   ever echo back the version they read.
//! - Field order is insertion order and keys are unique.
//!
//! Synchronizers own disjoint subsets of the fields; the typed accessors on
//! [`ObjectFields`] cover the fields they own so that field names are not
//! repeated as string literals across the crate.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// Well known field names.
pub mod field_names {
    pub const DOI: &str = "doi";
    pub const DRAFT: &str = "draft";
    pub const SOURCE_ID: &str = "source-id";
    pub const PUBLISH_DATE: &str = "publish-date";
    pub const SIS_SENT: &str = "sis-sent";
    pub const ORCID_UPDATE_CODE: &str = "orcid-update-code";
}

// ============================================================================
// Value Objects
// ============================================================================

/// Store-assigned object identifier. Empty until the object is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Placeholder for objects that have not been created yet
    pub fn unassigned() -> Self {
        Self(String::new())
    }

    pub fn is_assigned(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque optimistic-concurrency token
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Selects which parts of an object are read or written by a store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Projection {
    fields: bool,
    metadata: bool,
}

impl Projection {
    pub const FIELDS: Projection = Projection { fields: true, metadata: false };
    pub const METADATA: Projection = Projection { fields: false, metadata: true };
    pub const ALL: Projection = Projection { fields: true, metadata: true };

    pub fn includes_fields(&self) -> bool {
        self.fields
    }

    pub fn includes_metadata(&self) -> bool {
        self.metadata
    }

    /// Wire form used by the store proxy (`what=` query parameter)
    pub fn as_query(&self) -> &'static str {
        match (self.fields, self.metadata) {
            (true, true) => "fields,metadata",
            (true, false) => "fields",
            (false, true) => "metadata",
            (false, false) => "",
        }
    }
}

impl BitOr for Projection {
    type Output = Projection;

    fn bitor(self, rhs: Self) -> Self::Output {
        Projection {
            fields: self.fields || rhs.fields,
            metadata: self.metadata || rhs.metadata,
        }
    }
}

// ============================================================================
// Fields
// ============================================================================

/// Ordered string -> string map of queryable object state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectFields(IndexMap<String, String>);

impl ObjectFields {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Value of a field, treating an empty value the same as an absent one
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    /// Sets a field. An existing key keeps its position.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when every `(name, value)` in `matches` is present with the same value
    pub fn matches_all(&self, matches: &ObjectFields) -> bool {
        matches.iter().all(|(name, value)| self.get(name) == Some(value))
    }

    // Typed accessors for synchronizer-owned fields

    pub fn doi(&self) -> Option<&str> {
        self.non_empty(field_names::DOI)
    }

    pub fn set_doi(&mut self, value: impl Into<String>) {
        self.set(field_names::DOI, value);
    }

    /// `None` when the flag is missing or not a boolean
    pub fn draft(&self) -> Option<bool> {
        match self.get(field_names::DRAFT)?.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    pub fn set_draft(&mut self, draft: bool) {
        self.set(field_names::DRAFT, draft.to_string());
    }

    pub fn source_id(&self) -> Option<&str> {
        self.non_empty(field_names::SOURCE_ID)
    }

    pub fn publish_date(&self) -> Option<&str> {
        self.non_empty(field_names::PUBLISH_DATE)
    }

    pub fn sis_sent(&self) -> Option<&str> {
        self.non_empty(field_names::SIS_SENT)
    }

    pub fn orcid_update_code(&self) -> Option<&str> {
        self.non_empty(field_names::ORCID_UPDATE_CODE)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ObjectFields {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Opaque structured payload attached to an object (the "work" record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectMetadata(serde_json::Value);

impl ObjectMetadata {
    pub fn new(payload: serde_json::Value) -> Self {
        Self(payload)
    }

    pub fn from_typed<T: Serialize>(payload: &T) -> Result<Self, serde_json::Error> {
        Ok(Self(serde_json::to_value(payload)?))
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.0)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

// ============================================================================
// Aggregate
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedObject {
    pub namespace: String,
    #[serde(default)]
    pub id: ObjectId,
    #[serde(default)]
    pub version: Version,
    #[serde(default)]
    pub fields: ObjectFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ObjectMetadata>,
}

impl VersionedObject {
    /// A not-yet-created object; the store assigns id and version on create
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            id: ObjectId::unassigned(),
            version: Version::default(),
            fields: ObjectFields::new(),
            metadata: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = ObjectId::new(id);
        self
    }

    pub fn with_fields(mut self, fields: ObjectFields) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_metadata(mut self, metadata: ObjectMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// `ns/id` form used in log lines
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_preserve_insertion_order_on_overwrite() {
        let mut fields: ObjectFields = [("doi", ""), ("draft", "true"), ("source-id", "sis:1")]
            .into_iter()
            .collect();
        fields.set_doi("https://doi.org/10.1/abc");
        fields.set("depositor", "abc1x");

        let keys: Vec<&str> = fields.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["doi", "draft", "source-id", "depositor"]);
        assert_eq!(fields.doi(), Some("https://doi.org/10.1/abc"));
    }

    #[test]
    fn test_empty_doi_reads_as_absent() {
        let fields: ObjectFields = [("doi", "")].into_iter().collect();
        assert_eq!(fields.doi(), None);
        assert!(fields.contains("doi"));
    }

    #[test]
    fn test_draft_parsing() {
        let mut fields = ObjectFields::new();
        assert_eq!(fields.draft(), None);
        fields.set("draft", "TRUE");
        assert_eq!(fields.draft(), Some(true));
        fields.set_draft(false);
        assert_eq!(fields.draft(), Some(false));
        fields.set("draft", "maybe");
        assert_eq!(fields.draft(), None);
    }

    #[test]
    fn test_projection_union_and_wire_form() {
        assert_eq!(Projection::FIELDS | Projection::METADATA, Projection::ALL);
        assert_eq!(Projection::ALL.as_query(), "fields,metadata");
        assert_eq!(Projection::FIELDS.as_query(), "fields");
        assert!(!Projection::METADATA.includes_fields());
    }

    #[test]
    fn test_matches_all() {
        let fields: ObjectFields = [("source-id", "sis:42"), ("draft", "false")]
            .into_iter()
            .collect();
        let wanted: ObjectFields = [("source-id", "sis:42")].into_iter().collect();
        let other: ObjectFields = [("source-id", "sis:43")].into_iter().collect();
        assert!(fields.matches_all(&wanted));
        assert!(!fields.matches_all(&other));
    }

    #[test]
    fn test_object_json_shape() {
        let obj = VersionedObject::new("libraetd")
            .with_id("oid:1")
            .with_fields([("doi", ""), ("draft", "true")].into_iter().collect());
        let json = serde_json::to_value(&obj).unwrap();
        assert_eq!(json["namespace"], "libraetd");
        assert_eq!(json["id"], "oid:1");
        assert_eq!(json["fields"]["draft"], "true");
        assert!(json.get("metadata").is_none());
    }
}
