// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! ORCID-Activity Synchronizer
//!
//! Pushes a published work to its primary author's ORCID record. The ORCID
//! service answers with an update code that must be presented on the next
//! update of the same activity; it is kept in `fields.orcid-update-code`.

use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, error, info, warn};

use crate::application::audit_emitter::AuditEmitter;
use crate::application::event_processor::EventHandler;
use crate::application::outcome::{SyncError, SyncOutcome};
use crate::application::update_with_retry::ApplyFieldThenRetry;
use crate::domain::events::{BusEvent, EventName};
use crate::domain::external::{AuthTokenSource, OrcidActivity, OrcidActivityFeed, OrcidPerson};
use crate::domain::object::{field_names, Projection};
use crate::domain::repository::{ObjectStore, StoreError};
use crate::domain::sync_config::StoreRetryConfig;
use crate::domain::work::{Work, WorkNamespace};

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new("[0-9]{4}").expect("YEAR is a valid regex pattern"));

/// First four digit run in a free-form date, or empty
pub fn publication_year(date: &str) -> String {
    YEAR.find(date).map(|m| m.as_str().to_string()).unwrap_or_default()
}

/// ORCID work type for an open access resource type
pub fn orcid_resource_type(resource_type: &str) -> &'static str {
    match resource_type {
        "Article" => "journal-article",
        "Book" => "book",
        "Conference Paper" => "conference-paper",
        "Part of Book" => "book-chapter",
        "Report" => "report",
        "Journal" => "journal-issue",
        "Poster" => "conference-poster",
        _ => "other",
    }
}

/// Builds the activity; `None` when the work lacks a title or a DOI.
pub fn build_activity(work: &Work, doi: Option<&str>) -> Option<OrcidActivity> {
    let url = doi.filter(|d| !d.is_empty())?;
    if work.title().trim().is_empty() {
        return None;
    }

    let (authors, resource_type) = match work {
        Work::Etd(etd) => {
            let author = OrcidPerson {
                index: 0,
                first_name: etd.author.first_name.clone(),
                last_name: etd.author.last_name.clone(),
            };
            let kind = if etd.degree.contains("Doctor") {
                "dissertation-thesis"
            } else {
                "supervised-student-publication"
            };
            (vec![author], kind)
        }
        Work::Open(oa) => {
            let authors = oa
                .authors
                .iter()
                .enumerate()
                .map(|(index, a)| OrcidPerson {
                    index,
                    first_name: a.first_name.clone(),
                    last_name: a.last_name.clone(),
                })
                .collect();
            (authors, orcid_resource_type(&oa.resource_type))
        }
    };

    Some(OrcidActivity {
        title: work.title().to_string(),
        abstract_text: work.abstract_text().to_string(),
        publication_date: publication_year(work.publication_date()),
        url: url.to_string(),
        authors,
        resource_type: resource_type.to_string(),
    })
}

pub struct OrcidSynchronizer {
    store: Arc<dyn ObjectStore>,
    orcid: Arc<dyn OrcidActivityFeed>,
    auth: Arc<dyn AuthTokenSource>,
    writer: ApplyFieldThenRetry,
    audit: AuditEmitter,
}

impl OrcidSynchronizer {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        orcid: Arc<dyn OrcidActivityFeed>,
        auth: Arc<dyn AuthTokenSource>,
        retry: StoreRetryConfig,
        audit: AuditEmitter,
    ) -> Self {
        Self {
            writer: ApplyFieldThenRetry::new(store.clone(), retry),
            store,
            orcid,
            auth,
            audit,
        }
    }

    pub async fn synchronize(&self, event: &BusEvent) -> Result<SyncOutcome, SyncError> {
        let Some(namespace) = WorkNamespace::parse(&event.namespace) else {
            return Ok(SyncOutcome::Ignored(format!("unsupported namespace {}", event.namespace)));
        };
        if !matches!(
            event.event_name,
            EventName::ObjectPublished | EventName::MetadataUpdated | EventName::CommandOrcidSync
        ) {
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

        if object.fields.draft() == Some(true) {
            debug!(object = %object.key(), "draft work, not sent to ORCID");
            return Ok(SyncOutcome::NoAction);
        }

        let work = Work::decode(namespace, object.metadata.as_ref()).map_err(|source| SyncError::Metadata {
            namespace: event.namespace.clone(),
            id: event.identifier.clone(),
            source,
        })?;

        let Some(author_id) = work.primary_author_id() else {
            warn!(object = %object.key(), "cannot locate author computing id");
            return Ok(SyncOutcome::NoAction);
        };
        let Some(activity) = build_activity(&work, object.fields.doi()) else {
            warn!(object = %object.key(), "incomplete data for ORCID activity");
            return Ok(SyncOutcome::NoAction);
        };

        let token = self.auth.token().await.map_err(SyncError::external("auth"))?;
        let orcid = self
            .orcid
            .find_orcid(author_id, &token)
            .await
            .map_err(SyncError::external("orcid"))?;
        if orcid.is_none() {
            info!(object = %object.key(), author = author_id, "author has no ORCID");
            return Ok(SyncOutcome::NoAction);
        }

        let current = object.fields.orcid_update_code();
        let code = self
            .orcid
            .update_activity(author_id, current, &activity, &token)
            .await
            .map_err(SyncError::external("orcid"))?;
        info!(object = %object.key(), author = author_id, "ORCID activity updated");

        if code.is_empty() || Some(code.as_str()) == current {
            return Ok(SyncOutcome::Unchanged);
        }

        let (ns, id) = (object.namespace.clone(), object.id.as_str().to_string());
        let not_persisted = |source: StoreError| {
            error!(namespace = %ns, id = %id, update_code = %code, error = %source, "ORCID updated but update code not persisted");
            SyncError::NotPersisted {
                namespace: ns.clone(),
                id: id.clone(),
                field: field_names::ORCID_UPDATE_CODE.to_string(),
                value: code.clone(),
                source,
            }
        };

        let fresh = self
            .store
            .get_by_key(&ns, &id, Projection::FIELDS)
            .await
            .map_err(not_persisted)?;
        let before = fresh.fields.get(field_names::ORCID_UPDATE_CODE).unwrap_or_default().to_string();
        let updated = self
            .writer
            .apply(fresh, |fields| fields.set(field_names::ORCID_UPDATE_CODE, code.as_str()))
            .await
            .map_err(not_persisted)?;

        self.audit.record(&updated, field_names::ORCID_UPDATE_CODE, &before, &code).await;
        Ok(SyncOutcome::Updated {
            field: field_names::ORCID_UPDATE_CODE.to_string(),
            before,
            after: code,
        })
    }
}

#[async_trait]
impl EventHandler for OrcidSynchronizer {
    fn name(&self) -> &'static str {
        "orcid"
    }

    async fn handle(&self, event: &BusEvent) -> Result<SyncOutcome, SyncError> {
        self.synchronize(event).await
    }
}
