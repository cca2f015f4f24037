// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Object Store Proxy Client
//!
//! Implements [`ObjectStore`] against the object store's REST proxy, on top
//! of the shared [`HttpTransport`].
//!
//! # API Endpoints
//!
//! - `GET {base}/{ns}/{id}?what=fields,metadata` - fetch one object
//! - `GET {base}/{ns}?what=fields&field=name:value` - field-match query
//! - `POST {base}/{ns}` - create
//! - `PUT {base}/{ns}/{id}?what=fields` with `If-Match: {version}` - update
//!
//! # Status Mapping
//!
//! | Status | Error |
//! |--------|-------|
//! | 404 | `NotFound` (empty result for field-match queries) |
//! | 409 on create | `Conflict` |
//! | 409 / 412 on update | `StaleVersion` |
//! | other 4xx | `BadParameter` |
//! | 5xx, network | `Unavailable` |

use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

use crate::domain::object::{ObjectFields, Projection, VersionedObject};
use crate::domain::repository::{ObjectStore, StoreError};
use crate::infrastructure::http::{HttpTransport, OutboundRequest, TransportError};

pub struct HttpObjectStore {
    transport: Arc<HttpTransport>,
    base_url: Url,
}

impl HttpObjectStore {
    pub fn new(transport: Arc<HttpTransport>, base_url: &str) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StoreError::BadParameter(format!("invalid object store url {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::BadParameter(format!("object store url {} cannot be a base", base_url)));
        }
        Ok(Self { transport, base_url })
    }

    fn build_url(&self, segments: &[&str], projection: Projection) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::BadParameter(format!("object store url {} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().append_pair("what", projection.as_query());
        Ok(url)
    }

    async fn send(&self, request: OutboundRequest) -> Result<ResponseBody, TransportError> {
        self.transport.send(&request).await.map(ResponseBody)
    }
}

/// Raw response body pending decode
struct ResponseBody(bytes::Bytes);

impl ResponseBody {
    fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(&self.0)?)
    }
}

fn map_error(err: TransportError, key: &str) -> StoreError {
    match &err {
        TransportError::Status { status: 404, .. } => StoreError::NotFound(key.to_string()),
        TransportError::Status { status, .. } if (400..500).contains(status) => {
            StoreError::BadParameter(format!("{}: HTTP {}: {}", key, status, err.body_text()))
        }
        TransportError::Request(msg) => StoreError::BadParameter(msg.clone()),
        _ => StoreError::Unavailable(format!("{}: {}", key, err)),
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn get_by_key(&self, namespace: &str, id: &str, projection: Projection) -> Result<VersionedObject, StoreError> {
        let key = format!("{}/{}", namespace, id);
        let url = self.build_url(&[namespace, id], projection)?;
        self.send(OutboundRequest::get(url.as_str()))
            .await
            .map_err(|e| map_error(e, &key))?
            .decode()
    }

    async fn get_by_fields(
        &self,
        namespace: &str,
        matches: &ObjectFields,
        projection: Projection,
    ) -> Result<Vec<VersionedObject>, StoreError> {
        let mut url = self.build_url(&[namespace], projection)?;
        {
            let mut query = url.query_pairs_mut();
            for (name, value) in matches.iter() {
                query.append_pair("field", &format!("{}:{}", name, value));
            }
        }

        match self.send(OutboundRequest::get(url.as_str())).await {
            Ok(body) => body.decode(),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(map_error(e, namespace)),
        }
    }

    async fn create(&self, object: &VersionedObject) -> Result<VersionedObject, StoreError> {
        if object.namespace.is_empty() {
            return Err(StoreError::BadParameter("namespace is required".to_string()));
        }
        let url = self.build_url(&[object.namespace.as_str()], Projection::ALL)?;
        let request = OutboundRequest::post(url.as_str())
            .with_json(object)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        match self.send(request).await {
            Ok(body) => body.decode(),
            Err(e) if e.status() == Some(409) => Err(StoreError::Conflict(object.key())),
            Err(e) => Err(map_error(e, &object.key())),
        }
    }

    async fn update(&self, object: &VersionedObject, projection: Projection) -> Result<VersionedObject, StoreError> {
        let url = self.build_url(&[object.namespace.as_str(), object.id.as_str()], projection)?;
        let request = OutboundRequest::put(url.as_str())
            .with_header("If-Match", object.version.as_str())
            .with_json(object)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        match self.send(request).await {
            Ok(body) => body.decode(),
            Err(e) if matches!(e.status(), Some(409) | Some(412)) => Err(StoreError::StaleVersion(format!(
                "{} presented version {}",
                object.key(),
                object.version
            ))),
            Err(e) => Err(map_error(e, &object.key())),
        }
    }
}
