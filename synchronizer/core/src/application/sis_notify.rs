// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! SIS-Notify Synchronizer
//!
//! Tells the student information system that a SIS-originated thesis has
//! been published, then records the time in `fields.sis-sent`. Owns the
//! `sis-sent` field only.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::application::audit_emitter::AuditEmitter;
use crate::application::event_processor::EventHandler;
use crate::application::outcome::{SyncError, SyncOutcome};
use crate::application::update_with_retry::ApplyFieldThenRetry;
use crate::domain::events::{BusEvent, EventName};
use crate::domain::external::{AuthTokenSource, StudentInformationSystem};
use crate::domain::object::{field_names, Projection};
use crate::domain::repository::{ObjectStore, StoreError};
use crate::domain::sync_config::StoreRetryConfig;
use crate::domain::work::WorkNamespace;

const SIS_PREFIX: &str = "sis:";

pub struct SisNotifier {
    store: Arc<dyn ObjectStore>,
    sis: Arc<dyn StudentInformationSystem>,
    auth: Arc<dyn AuthTokenSource>,
    writer: ApplyFieldThenRetry,
    audit: AuditEmitter,
}

impl SisNotifier {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        sis: Arc<dyn StudentInformationSystem>,
        auth: Arc<dyn AuthTokenSource>,
        retry: StoreRetryConfig,
        audit: AuditEmitter,
    ) -> Self {
        Self {
            writer: ApplyFieldThenRetry::new(store.clone(), retry),
            store,
            sis,
            auth,
            audit,
        }
    }

    pub async fn notify(&self, event: &BusEvent) -> Result<SyncOutcome, SyncError> {
        if WorkNamespace::parse(&event.namespace) != Some(WorkNamespace::Etd) {
            return Ok(SyncOutcome::Ignored(format!("unsupported namespace {}", event.namespace)));
        }
        let commanded = match event.event_name {
            EventName::ObjectPublished => false,
            EventName::CommandSisNotify => true,
            _ => return Ok(SyncOutcome::Ignored(format!("uninteresting event {}", event.event_name))),
        };

        let object = self
            .store
            .get_by_key(&event.namespace, &event.identifier, Projection::FIELDS)
            .await
            .map_err(|source| SyncError::Load {
                namespace: event.namespace.clone(),
                id: event.identifier.clone(),
                source,
            })?;

        let Some(sis_id) = object.fields.source_id().and_then(|s| s.strip_prefix(SIS_PREFIX)) else {
            debug!(object = %object.key(), source = ?object.fields.source_id(), "not a SIS work, ignoring");
            return Ok(SyncOutcome::NoAction);
        };
        let Some(doi) = object.fields.doi() else {
            info!(object = %object.key(), "no DOI assigned yet, SIS not notified");
            return Ok(SyncOutcome::NoAction);
        };
        if let Some(sent) = object.fields.sis_sent() {
            if !commanded {
                debug!(object = %object.key(), sent, "SIS already notified");
                return Ok(SyncOutcome::NoAction);
            }
        }

        let token = self.auth.token().await.map_err(SyncError::external("auth"))?;
        self.sis
            .notify_published(sis_id, doi, &token)
            .await
            .map_err(SyncError::external("sis"))?;
        info!(object = %object.key(), sis_id, doi, "SIS notified");

        let sent_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let (namespace, id) = (object.namespace.clone(), object.id.as_str().to_string());
        let not_persisted = |source: StoreError| {
            error!(namespace = %namespace, id = %id, sent_at = %sent_at, error = %source, "SIS notified but sis-sent not persisted");
            SyncError::NotPersisted {
                namespace: namespace.clone(),
                id: id.clone(),
                field: field_names::SIS_SENT.to_string(),
                value: sent_at.clone(),
                source,
            }
        };

        let fresh = self
            .store
            .get_by_key(&namespace, &id, Projection::FIELDS)
            .await
            .map_err(not_persisted)?;
        let before = fresh.fields.get(field_names::SIS_SENT).unwrap_or_default().to_string();
        let updated = self
            .writer
            .apply(fresh, |fields| fields.set(field_names::SIS_SENT, sent_at.as_str()))
            .await
            .map_err(not_persisted)?;

        self.audit.record(&updated, field_names::SIS_SENT, &before, &sent_at).await;
        Ok(SyncOutcome::Updated {
            field: field_names::SIS_SENT.to_string(),
            before,
            after: sent_at,
        })
    }
}

#[async_trait]
impl EventHandler for SisNotifier {
    fn name(&self) -> &'static str {
        "sis-notify"
    }

    async fn handle(&self, event: &BusEvent) -> Result<SyncOutcome, SyncError> {
        self.notify(event).await
    }
}
