// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Update-With-Retry
//!
//! Applies one intended field mutation to an object that other writers may
//! be changing concurrently. On `StaleVersion` the object is re-fetched and
//! the *same* mutation is re-applied to the fresh field map, so unrelated
//! fields written by the other writer survive.
//!
//! This is a single-field last-writer-wins policy, not a merge. Two writers
//! racing on the same field will overwrite each other; field ownership is
//! disjoint across synchronizers so that does not happen in practice.
//!
//! Ceiling: one initial update plus at most `max_retries` re-fetch-and-retry
//! rounds. Any error other than `StaleVersion` aborts at once.

use metrics::counter;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::object::{ObjectFields, Projection, VersionedObject};
use crate::domain::repository::{ObjectStore, StoreError};
use crate::domain::sync_config::StoreRetryConfig;

pub struct ApplyFieldThenRetry {
    store: Arc<dyn ObjectStore>,
    policy: StoreRetryConfig,
}

impl ApplyFieldThenRetry {
    pub fn new(store: Arc<dyn ObjectStore>, policy: StoreRetryConfig) -> Self {
        Self { store, policy }
    }

    /// Applies `mutator` to `object` and writes its fields back.
    ///
    /// Returns the stored object (new version) or the last error; a
    /// `StaleVersion` result means the ceiling was reached and the write was
    /// abandoned.
    pub async fn apply<F>(&self, object: VersionedObject, mutator: F) -> Result<VersionedObject, StoreError>
    where
        F: Fn(&mut ObjectFields) + Send + Sync,
    {
        let mut current = object;
        mutator(&mut current.fields);

        let mut retries = 0;
        loop {
            match self.store.update(&current, Projection::FIELDS).await {
                Ok(updated) => {
                    debug!(object = %updated.key(), version = %updated.version, retries, "fields updated");
                    return Ok(updated);
                }
                Err(e) if e.is_stale() && retries < self.policy.max_retries => {
                    retries += 1;
                    counter!("libra_sync_store_conflicts_total").increment(1);
                    warn!(
                        namespace = %current.namespace,
                        id = %current.id,
                        attempt = retries,
                        "stale object version, re-fetching and retrying"
                    );
                    tokio::time::sleep(self.policy.delay).await;

                    current = self
                        .store
                        .get_by_key(&current.namespace, current.id.as_str(), Projection::FIELDS)
                        .await?;
                    mutator(&mut current.fields);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
