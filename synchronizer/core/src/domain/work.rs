// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Work metadata carried in an object's metadata payload.
//!
//! Two namespaces are synchronized and their payloads differ: dissertations
//! (`libraetd`) have a single student author plus advisors, open access works
//! (`libraopen`) have author and contributor lists and a free resource type.

use crate::domain::object::ObjectMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkNamespace {
    #[serde(rename = "libraetd")]
    Etd,
    #[serde(rename = "libraopen")]
    Open,
}

impl WorkNamespace {
    pub fn parse(namespace: &str) -> Option<Self> {
        match namespace {
            "libraetd" => Some(Self::Etd),
            "libraopen" => Some(Self::Open),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Etd => "libraetd",
            Self::Open => "libraopen",
        }
    }

    /// Path segment used in public landing page URLs
    pub fn url_path(&self) -> &'static str {
        match self {
            Self::Etd => "etd",
            Self::Open => "oa",
        }
    }
}

impl fmt::Display for WorkNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A student author of a dissertation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentData {
    #[serde(rename = "computeId")]
    pub compute_id: String,
    pub first_name: String,
    pub last_name: String,
    pub program: String,
    pub institution: String,
    pub orcid: String,
}

/// Any other person attached to a work (advisor, author, contributor)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContributorData {
    #[serde(rename = "computeId")]
    pub compute_id: String,
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    pub institution: String,
    pub orcid: String,
}

impl From<&StudentData> for ContributorData {
    fn from(student: &StudentData) -> Self {
        Self {
            compute_id: student.compute_id.clone(),
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            department: student.program.clone(),
            institution: student.institution.clone(),
            orcid: student.orcid.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EtdWork {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub author: StudentData,
    pub advisors: Vec<ContributorData>,
    pub degree: String,
    pub keywords: Vec<String>,
    pub language: String,
    pub license: String,
    pub sponsors: Vec<String>,
    pub publication_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OaWork {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub authors: Vec<ContributorData>,
    pub contributors: Vec<ContributorData>,
    pub resource_type: String,
    pub publisher: String,
    pub keywords: Vec<String>,
    pub languages: Vec<String>,
    pub license: String,
    pub sponsors: Vec<String>,
    pub publication_date: String,
}

#[derive(Debug, Error)]
pub enum WorkError {
    #[error("object has no metadata payload")]
    NoMetadata,

    #[error("unable to decode {namespace} work: {source}")]
    Decode {
        namespace: WorkNamespace,
        #[source]
        source: serde_json::Error,
    },
}

/// Decoded work metadata, tagged by namespace
#[derive(Debug, Clone, PartialEq)]
pub enum Work {
    Etd(EtdWork),
    Open(OaWork),
}

impl Work {
    pub fn decode(namespace: WorkNamespace, metadata: Option<&ObjectMetadata>) -> Result<Self, WorkError> {
        let metadata = metadata.ok_or(WorkError::NoMetadata)?;
        let decode_err = |source| WorkError::Decode { namespace, source };
        match namespace {
            WorkNamespace::Etd => metadata.decode().map(Work::Etd).map_err(decode_err),
            WorkNamespace::Open => metadata.decode().map(Work::Open).map_err(decode_err),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Work::Etd(w) => &w.title,
            Work::Open(w) => &w.title,
        }
    }

    pub fn abstract_text(&self) -> &str {
        match self {
            Work::Etd(w) => &w.abstract_text,
            Work::Open(w) => &w.abstract_text,
        }
    }

    pub fn publication_date(&self) -> &str {
        match self {
            Work::Etd(w) => &w.publication_date,
            Work::Open(w) => &w.publication_date,
        }
    }

    /// Computing id of the primary author, if the author is a local user
    pub fn primary_author_id(&self) -> Option<&str> {
        let id = match self {
            Work::Etd(w) => w.author.compute_id.as_str(),
            Work::Open(w) => w.authors.first().map(|a| a.compute_id.as_str()).unwrap_or_default(),
        };
        (!id.is_empty()).then_some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_namespace_round_trip() {
        assert_eq!(WorkNamespace::parse("libraetd"), Some(WorkNamespace::Etd));
        assert_eq!(WorkNamespace::parse("libraopen"), Some(WorkNamespace::Open));
        assert_eq!(WorkNamespace::parse("other"), None);
        assert_eq!(WorkNamespace::Open.url_path(), "oa");
    }

    #[test]
    fn test_decode_etd_work_with_partial_payload() {
        let metadata = ObjectMetadata::new(json!({
            "title": "On Rivers",
            "abstract": "Water flows.",
            "author": { "computeId": "abc1x", "firstName": "Ada", "lastName": "Byron" }
        }));
        let work = Work::decode(WorkNamespace::Etd, Some(&metadata)).unwrap();
        assert_eq!(work.title(), "On Rivers");
        assert_eq!(work.abstract_text(), "Water flows.");
        assert_eq!(work.primary_author_id(), Some("abc1x"));
    }

    #[test]
    fn test_open_work_without_local_author() {
        let metadata = ObjectMetadata::new(json!({
            "title": "Field Notes",
            "authors": [{ "firstName": "Jo", "lastName": "March", "institution": "Elsewhere" }]
        }));
        let work = Work::decode(WorkNamespace::Open, Some(&metadata)).unwrap();
        assert_eq!(work.primary_author_id(), None);
    }

    #[test]
    fn test_missing_metadata() {
        let result = Work::decode(WorkNamespace::Etd, None);
        assert!(matches!(result, Err(WorkError::NoMetadata)));
    }

    #[test]
    fn test_malformed_metadata() {
        let metadata = ObjectMetadata::new(json!({ "title": 12 }));
        let result = Work::decode(WorkNamespace::Open, Some(&metadata));
        assert!(matches!(result, Err(WorkError::Decode { namespace: WorkNamespace::Open, .. })));
    }
}
