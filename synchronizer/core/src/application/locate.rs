// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Field-match lookups.

use thiserror::Error;
use tracing::warn;

use crate::application::outcome::Violation;
use crate::domain::events::{BusEvent, EventName};
use crate::domain::object::{field_names, ObjectFields, Projection, VersionedObject};
use crate::domain::repository::{ObjectStore, StoreError};

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("{count} objects in {namespace} share source id {source_id}")]
    Ambiguous {
        namespace: String,
        source_id: String,
        count: usize,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LocateError {
    /// Ambiguity is an invariant violation rather than a failure
    pub fn violation(&self) -> Option<Violation> {
        match self {
            LocateError::Ambiguous { namespace, source_id, count } => Some(Violation::AmbiguousLookup {
                namespace: namespace.clone(),
                source_id: source_id.clone(),
                count: *count,
            }),
            LocateError::Store(_) => None,
        }
    }
}

/// The single object whose `source-id` is `source_id`, if any
pub async fn locate_by_source_id(
    store: &dyn ObjectStore,
    namespace: &str,
    source_id: &str,
) -> Result<Option<VersionedObject>, LocateError> {
    let mut matches = ObjectFields::new();
    matches.set(field_names::SOURCE_ID, source_id);

    let mut found = store.get_by_fields(namespace, &matches, Projection::FIELDS).await?;
    match found.len() {
        0 => Ok(None),
        1 => Ok(found.pop()),
        count => {
            warn!(namespace, source_id, count, "ambiguous source id");
            Err(LocateError::Ambiguous {
                namespace: namespace.to_string(),
                source_id: source_id.to_string(),
                count,
            })
        }
    }
}

/// Operator command asking the DOI synchronizer to refresh `object`
pub fn resync_event(object: &VersionedObject) -> BusEvent {
    let mut event = BusEvent::new(EventName::CommandDoiSync, object.namespace.clone(), object.id.as_str());
    event.event_time = Some(chrono::Utc::now());
    event
}
