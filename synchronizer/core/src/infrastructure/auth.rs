// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Mint auth-token client: `GET {MINT_AUTH_URL}` -> `{"token": .., "expires": ..}`

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::domain::external::{AuthTokenSource, ExternalError};
use crate::infrastructure::http::{HttpTransport, OutboundRequest};

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    token: String,
}

pub struct MintAuthClient {
    transport: Arc<HttpTransport>,
    url: String,
}

impl MintAuthClient {
    pub fn new(transport: Arc<HttpTransport>, url: impl Into<String>) -> Self {
        Self { transport, url: url.into() }
    }
}

#[async_trait]
impl AuthTokenSource for MintAuthClient {
    async fn token(&self) -> Result<String, ExternalError> {
        let body = self.transport.send(&OutboundRequest::get(self.url.as_str())).await?;
        let response: AuthResponse =
            serde_json::from_slice(&body).map_err(|e| ExternalError::InvalidResponse(e.to_string()))?;
        if response.token.is_empty() {
            return Err(ExternalError::InvalidResponse("auth response carries no token".to_string()));
        }
        Ok(response.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sync_config::TransportConfig;

    fn client(server: &mockito::Server) -> MintAuthClient {
        let transport = Arc::new(HttpTransport::new(&TransportConfig::default()).unwrap());
        MintAuthClient::new(transport, format!("{}/authtoken", server.url()))
    }

    #[tokio::test]
    async fn test_token() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/authtoken")
            .with_status(200)
            .with_body(r#"{"token":"abc.def","expires":"2026-10-18T12:00:00Z"}"#)
            .create_async()
            .await;

        assert_eq!(client(&server).token().await.unwrap(), "abc.def");
    }

    #[tokio::test]
    async fn test_empty_token_is_invalid() {
        let mut server = mockito::Server::new_async().await;
        let _m = server.mock("GET", "/authtoken").with_status(200).with_body("{}").create_async().await;

        assert!(matches!(client(&server).token().await, Err(ExternalError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let _m = server.mock("GET", "/authtoken").with_status(401).create_async().await;

        assert!(matches!(
            client(&server).token().await,
            Err(ExternalError::Rejected { status: 401, .. })
        ));
    }
}
