// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! DOI Synchronizer
//!
//! Keeps an object's registrar entry in step with its lifecycle. One call
//! handles one domain event:
//!
//! 1. load the object (fields and metadata)
//! 2. derive the registrar action from the [`DoiLifecycle`] table
//! 3. refuse DOIs minted under another environment's prefix
//! 4. submit the registration (POST when new, PUT when a DOI exists)
//! 5. compare the returned DOI with the stored one; equal means done
//! 6. re-fetch, write `fields.doi` through [`ApplyFieldThenRetry`], audit
//!
//! The registrar call happens outside any store transaction, so step 6
//! always works on a fresh copy of the object.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::application::audit_emitter::AuditEmitter;
use crate::application::event_processor::EventHandler;
use crate::application::outcome::{SyncError, SyncOutcome, Violation};
use crate::application::update_with_retry::ApplyFieldThenRetry;
use crate::domain::doi::{bare_doi, DoiFormat};
use crate::domain::events::BusEvent;
use crate::domain::lifecycle::{DoiLifecycle, DoiState, RuleOutcome};
use crate::domain::object::{field_names, Projection};
use crate::domain::registrar::{IdentifierRegistrar, RegistrationRequest};
use crate::domain::repository::{ObjectStore, StoreError};
use crate::domain::sync_config::StoreRetryConfig;
use crate::domain::work::{Work, WorkNamespace};

pub struct DoiSynchronizer {
    store: Arc<dyn ObjectStore>,
    registrar: Arc<dyn IdentifierRegistrar>,
    lifecycle: DoiLifecycle,
    format: DoiFormat,
    writer: ApplyFieldThenRetry,
    audit: AuditEmitter,
}

impl DoiSynchronizer {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        registrar: Arc<dyn IdentifierRegistrar>,
        format: DoiFormat,
        retry: StoreRetryConfig,
        audit: AuditEmitter,
    ) -> Self {
        Self {
            writer: ApplyFieldThenRetry::new(store.clone(), retry),
            store,
            registrar,
            lifecycle: DoiLifecycle::standard(),
            format,
            audit,
        }
    }

    /// Replaces the standard transition table
    pub fn with_lifecycle(mut self, lifecycle: DoiLifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub async fn synchronize(&self, event: &BusEvent) -> Result<SyncOutcome, SyncError> {
        let Some(namespace) = WorkNamespace::parse(&event.namespace) else {
            return Ok(SyncOutcome::Ignored(format!("unsupported namespace {}", event.namespace)));
        };
        if !self.lifecycle.handles(&event.event_name) {
            return Ok(SyncOutcome::Ignored(format!("uninteresting event {}", event.event_name)));
        }

        let object = self
            .store
            .get_by_key(namespace.as_str(), &event.identifier, Projection::ALL)
            .await
            .map_err(|source| SyncError::Load {
                namespace: event.namespace.clone(),
                id: event.identifier.clone(),
                source,
            })?;

        let action = match self.lifecycle.decide(&event.event_name, &DoiState::from_fields(&object.fields)) {
            RuleOutcome::Act(action) => action,
            RuleOutcome::NoAction => {
                debug!(object = %object.key(), event = %event.event_name, "no DOI action required");
                return Ok(SyncOutcome::NoAction);
            }
            RuleOutcome::Reject(reason) => {
                warn!(object = %object.key(), event = %event.event_name, reason = %reason, "illegal DOI transition, ignoring");
                return Ok(SyncOutcome::Rejected(Violation::IllegalTransition {
                    event: event.event_name.to_string(),
                    reason,
                }));
            }
        };

        let stored_doi = object.fields.doi().map(str::to_string);
        if let Some(stored) = stored_doi.as_deref() {
            if !self.format.owns(stored) {
                warn!(
                    object = %object.key(),
                    doi = stored,
                    expected_prefix = self.format.shoulder(),
                    "DOI belongs to another environment, not sent to registrar"
                );
                return Ok(SyncOutcome::Rejected(Violation::CrossEnvironmentIdentifier {
                    doi: stored.to_string(),
                    expected_prefix: self.format.shoulder().to_string(),
                }));
            }
        }

        let work = Work::decode(namespace, object.metadata.as_ref()).map_err(|source| SyncError::Metadata {
            namespace: event.namespace.clone(),
            id: event.identifier.clone(),
            source,
        })?;

        let request = RegistrationRequest {
            action,
            namespace,
            object_id: object.id.as_str().to_string(),
            existing_doi: stored_doi.as_deref().map(|d| bare_doi(d).to_string()),
            work,
            publish_date: object.fields.publish_date().map(str::to_string),
        };
        info!(object = %object.key(), action = %action, existing = ?request.existing_doi, "submitting DOI registration");
        let registered = self.registrar.submit(&request).await?;

        if stored_doi.as_deref().map(bare_doi) == Some(bare_doi(&registered)) {
            info!(object = %object.key(), doi = %registered, "DOI unchanged, nothing to write");
            return Ok(SyncOutcome::Unchanged);
        }

        let new_value = self.format.stored_form(&registered);
        self.write_back(&event.namespace, &event.identifier, new_value).await
    }

    async fn write_back(&self, namespace: &str, id: &str, new_value: String) -> Result<SyncOutcome, SyncError> {
        let not_persisted = |source: StoreError| {
            error!(
                namespace,
                id,
                doi = %new_value,
                error = %source,
                "DOI registered but not persisted locally, manual reconciliation required"
            );
            SyncError::NotPersisted {
                namespace: namespace.to_string(),
                id: id.to_string(),
                field: field_names::DOI.to_string(),
                value: new_value.clone(),
                source,
            }
        };

        let fresh = match self.store.get_by_key(namespace, id, Projection::FIELDS).await {
            Ok(fresh) => fresh,
            Err(e) => return Err(not_persisted(e)),
        };
        let before = fresh.fields.get(field_names::DOI).unwrap_or_default().to_string();
        if bare_doi(&before) == bare_doi(&new_value) {
            info!(object = %fresh.key(), doi = %new_value, "DOI already written by another worker");
            return Ok(SyncOutcome::Unchanged);
        }

        let updated = match self.writer.apply(fresh, |fields| fields.set_doi(new_value.as_str())).await {
            Ok(updated) => updated,
            Err(e) => return Err(not_persisted(e)),
        };
        info!(object = %updated.key(), before = %before, after = %new_value, "DOI written back");

        self.audit.record(&updated, field_names::DOI, &before, &new_value).await;
        Ok(SyncOutcome::Updated {
            field: field_names::DOI.to_string(),
            before,
            after: new_value,
        })
    }
}

#[async_trait]
impl EventHandler for DoiSynchronizer {
    fn name(&self) -> &'static str {
        "doi"
    }

    async fn handle(&self, event: &BusEvent) -> Result<SyncOutcome, SyncError> {
        self.synchronize(event).await
    }
}
