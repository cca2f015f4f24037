// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! SIS notification client.
//!
//! `PUT` to the notify URL template with `{:id}` (SIS id without the `sis:`
//! prefix), `{:auth}` and `{:doi}` substituted; no request body.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::external::{ExternalError, StudentInformationSystem};
use crate::infrastructure::http::{expand_template, HttpTransport, OutboundRequest};

pub struct SisClient {
    transport: Arc<HttpTransport>,
    notify_url: String,
}

impl SisClient {
    pub fn new(transport: Arc<HttpTransport>, notify_url: impl Into<String>) -> Self {
        Self {
            transport,
            notify_url: notify_url.into(),
        }
    }
}

#[async_trait]
impl StudentInformationSystem for SisClient {
    async fn notify_published(&self, sis_id: &str, doi: &str, token: &str) -> Result<(), ExternalError> {
        let url = expand_template(&self.notify_url, &[("id", sis_id), ("auth", token), ("doi", doi)]);
        self.transport.send(&OutboundRequest::put(url)).await?;
        Ok(())
    }
}
