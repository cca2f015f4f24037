// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Transient-Failure HTTP Transport
//!
//! Shared outbound HTTP path for every external collaborator (object store
//! proxy, registrar, SIS, ORCID, auth service).
//!
//! # Retry Policy
//!
//! - 2xx: the response body is returned.
//! - Non-2xx: never retried. The body is returned inside
//!   [`TransportError::Status`] so callers can inspect it. 404 is logged at
//!   info, everything else at error.
//! - Transport failure: retried only when it matches a known transient
//!   signature (timeouts, broken pipes, DNS failures, network down), up to
//!   `max_attempts` total attempts with a fixed delay. No backoff, no jitter.
//!   Only idempotent methods (GET, HEAD, PUT, DELETE) are replayed; a POST
//!   returns its first failure to the caller.

use bytes::Bytes;
use metrics::counter;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use std::error::Error as StdError;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::domain::external::ExternalError;
use crate::domain::sync_config::TransportConfig;

/// Lower-cased fragments of error messages that indicate a transient failure
const TRANSIENT_SIGNATURES: &[&str] = &[
    "timed out",
    "timeout",
    "broken pipe",
    "dns error",
    "failed to lookup address",
    "no such host",
    "network is down",
    "network is unreachable",
];

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP {status}")]
    Status { status: u16, body: Bytes },

    #[error("network failure (retryable: {retryable}): {message}")]
    Network { message: String, retryable: bool },

    #[error("invalid request: {0}")]
    Request(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }

    /// Response body of a non-2xx reply, lossily decoded
    pub fn body_text(&self) -> String {
        match self {
            TransportError::Status { body, .. } => String::from_utf8_lossy(body).into_owned(),
            _ => String::new(),
        }
    }
}

impl From<TransportError> for ExternalError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Status { status, body } => ExternalError::Rejected {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            },
            TransportError::Network { message, .. } => ExternalError::Unavailable(message),
            TransportError::Request(message) => ExternalError::Unavailable(message),
        }
    }
}

/// Fills `{:name}` placeholders in a service URL template
pub fn expand_template(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |url, (name, value)| {
        url.replacen(&format!("{{:{}}}", name), value, 1)
    })
}

/// One outbound request, cheap to clone so it can be replayed on retry
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    method: Method,
    url: String,
    body: Option<Bytes>,
    content_type: Option<String>,
    headers: Vec<(String, String)>,
    basic_auth: Option<(String, String)>,
}

impl OutboundRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            content_type: None,
            headers: Vec::new(),
            basic_auth: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn with_body(mut self, body: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_json<T: Serialize>(self, payload: &T) -> Result<Self, TransportError> {
        let body = serde_json::to_vec(payload).map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(self.with_body(body, "application/json"))
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((user.into(), password.into()));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// True when replaying the request cannot create a second resource
    pub fn is_idempotent(&self) -> bool {
        matches!(self.method, Method::GET | Method::HEAD | Method::PUT | Method::DELETE)
    }
}

pub struct HttpTransport {
    client: Client,
    max_attempts: u32,
    retry_delay: Duration,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Request(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_attempts: config.max_attempts.max(1),
            retry_delay: config.retry_delay,
        })
    }

    pub async fn send(&self, request: &OutboundRequest) -> Result<Bytes, TransportError> {
        let mut attempt = 1;
        loop {
            let started = Instant::now();
            let result = self.attempt(request).await;
            info!(
                method = %request.method,
                url = %request.url,
                attempt,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "http request"
            );

            match result {
                Err(TransportError::Network { message, retryable: true })
                    if attempt < self.max_attempts && request.is_idempotent() =>
                {
                    warn!(url = %request.url, attempt, error = %message, "retryable network failure, retrying");
                    counter!("libra_sync_http_retries_total").increment(1);
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn attempt(&self, request: &OutboundRequest) -> Result<Bytes, TransportError> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(content_type) = &request.content_type {
            builder = builder.header(reqwest::header::CONTENT_TYPE, content_type.as_str());
        }
        if let Some((user, password)) = &request.basic_auth {
            builder = builder.basic_auth(user, Some(password));
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        let body = response.bytes().await.map_err(classify)?;

        if status.is_success() {
            return Ok(body);
        }
        if status == StatusCode::NOT_FOUND {
            info!(method = %request.method, url = %request.url, status = status.as_u16(), "resource not found");
        } else {
            error!(
                method = %request.method,
                url = %request.url,
                status = status.as_u16(),
                body = %String::from_utf8_lossy(&body),
                "request returned unexpected status"
            );
        }
        Err(TransportError::Status { status: status.as_u16(), body })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_builder() {
        return TransportError::Request(err.to_string());
    }
    let message = error_chain(&err);
    let retryable = err.is_timeout() || is_transient(&message);
    TransportError::Network { message, retryable }
}

/// Joins an error and all of its sources into one message
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

pub(crate) fn is_transient(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    TRANSIENT_SIGNATURES.iter().any(|sig| message.contains(sig))
}
