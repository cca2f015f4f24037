// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! ORCID service client.
//!
//! # API Endpoints
//!
//! - `GET {ORCID_GET_DETAILS_URL}` -> `{"results": [{"orcid": ..}]}`; 404 means
//!   the user has no ORCID
//! - `PUT {ORCID_SET_ACTIVITY_URL}` with `{"update_code": .., "work": {..}}`
//!   -> `{"update_code": ..}`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::domain::external::{ExternalError, OrcidActivity, OrcidActivityFeed};
use crate::infrastructure::http::{expand_template, HttpTransport, OutboundRequest};

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    #[serde(default)]
    results: Vec<OrcidDetails>,
}

#[derive(Debug, Deserialize)]
struct OrcidDetails {
    #[serde(default)]
    orcid: String,
}

#[derive(Debug, Serialize)]
struct ActivityUpdate<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    update_code: Option<&'a str>,
    work: &'a OrcidActivity,
}

#[derive(Debug, Deserialize)]
struct ActivityUpdateResponse {
    #[serde(default)]
    update_code: String,
}

pub struct OrcidClient {
    transport: Arc<HttpTransport>,
    details_url: String,
    activity_url: String,
}

impl OrcidClient {
    pub fn new(transport: Arc<HttpTransport>, details_url: impl Into<String>, activity_url: impl Into<String>) -> Self {
        Self {
            transport,
            details_url: details_url.into(),
            activity_url: activity_url.into(),
        }
    }
}

#[async_trait]
impl OrcidActivityFeed for OrcidClient {
    async fn find_orcid(&self, compute_id: &str, token: &str) -> Result<Option<String>, ExternalError> {
        let url = expand_template(&self.details_url, &[("id", compute_id), ("auth", token)]);
        let body = match self.transport.send(&OutboundRequest::get(url)).await {
            Ok(body) => body,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let response: DetailsResponse =
            serde_json::from_slice(&body).map_err(|e| ExternalError::InvalidResponse(e.to_string()))?;
        let orcid = response.results.into_iter().map(|d| d.orcid).find(|o| !o.is_empty());
        if let Some(orcid) = &orcid {
            info!(compute_id, orcid = %orcid, "located ORCID");
        }
        Ok(orcid)
    }

    async fn update_activity(
        &self,
        compute_id: &str,
        update_code: Option<&str>,
        activity: &OrcidActivity,
        token: &str,
    ) -> Result<String, ExternalError> {
        let url = expand_template(&self.activity_url, &[("id", compute_id), ("auth", token)]);
        let payload = ActivityUpdate {
            update_code: update_code.filter(|code| !code.is_empty()),
            work: activity,
        };
        let request = OutboundRequest::put(url)
            .with_json(&payload)
            .map_err(|e| ExternalError::InvalidResponse(e.to_string()))?;

        let body = self.transport.send(&request).await?;
        let response: ActivityUpdateResponse =
            serde_json::from_slice(&body).map_err(|e| ExternalError::InvalidResponse(e.to_string()))?;
        Ok(response.update_code)
    }
}
