// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Identifier registrar contract.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::lifecycle::DoiAction;
use crate::domain::work::{Work, WorkNamespace};

/// Everything a registrar needs to create or refresh one DOI registration
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub action: DoiAction,
    pub namespace: WorkNamespace,
    pub object_id: String,
    /// Bare DOI already registered for this object; `None` creates a new one
    pub existing_doi: Option<String>,
    pub work: Work,
    /// `fields.publish-date` as stored (RFC 3339)
    pub publish_date: Option<String>,
}

#[async_trait]
pub trait IdentifierRegistrar: Send + Sync {
    /// Creates (POST) or upserts (PUT) the registration and returns the bare
    /// DOI the registrar holds for it.
    async fn submit(&self, request: &RegistrationRequest) -> Result<String, RegistrarError>;
}

#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error("registrar rejected request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("registrar unavailable: {0}")]
    Unavailable(String),

    #[error("invalid registrar response: {0}")]
    InvalidResponse(String),

    #[error("unable to build registrar payload: {0}")]
    Payload(String),
}
