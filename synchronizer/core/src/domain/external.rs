// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Contracts for the token-authenticated university services: the auth
//! token minter, the student information system (SIS) and the ORCID
//! activity service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("service rejected request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("invalid service response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait AuthTokenSource: Send + Sync {
    /// A short-lived token for `{:auth}` URL templates
    async fn token(&self) -> Result<String, ExternalError>;
}

#[async_trait]
pub trait StudentInformationSystem: Send + Sync {
    /// Tells SIS that the thesis with `sis_id` is published under `doi`
    async fn notify_published(&self, sis_id: &str, doi: &str, token: &str) -> Result<(), ExternalError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrcidPerson {
    pub index: usize,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_name: String,
}

/// Work summary pushed to an author's ORCID record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrcidActivity {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, rename = "abstract", skip_serializing_if = "String::is_empty")]
    pub abstract_text: String,
    /// Four digit year
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub publication_date: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<OrcidPerson>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_type: String,
}

#[async_trait]
pub trait OrcidActivityFeed: Send + Sync {
    /// The ORCID iD registered for a computing id; `None` when the user has none
    async fn find_orcid(&self, compute_id: &str, token: &str) -> Result<Option<String>, ExternalError>;

    /// Creates or updates the activity; returns the update code to present next time
    async fn update_activity(
        &self,
        compute_id: &str,
        update_code: Option<&str>,
        activity: &OrcidActivity,
        token: &str,
    ) -> Result<String, ExternalError>;
}
