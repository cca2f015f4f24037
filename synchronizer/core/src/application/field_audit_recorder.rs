// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Field Audit Recorder Application Service
//!
//! Subscribes to the event bus and appends every `field-update` event to the
//! [`AuditRepository`] as an [`AuditRecord`]. Runs as a background task;
//! errors are logged and never stop the task.

use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::domain::events::{AuditRecord, BusError, BusEvent, EventName};
use crate::domain::repository::{AuditRepository, StoreError};
use crate::infrastructure::event_bus::{EventBus, EventReceiver};

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("malformed audit event: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct FieldAuditRecorder {
    repository: Arc<dyn AuditRepository>,
}

impl FieldAuditRecorder {
    pub fn new(repository: Arc<dyn AuditRepository>) -> Self {
        Self { repository }
    }

    /// Stores one event; anything other than `field-update` is skipped.
    /// Returns whether a record was written.
    pub async fn record_event(&self, event: &BusEvent) -> Result<bool, RecordError> {
        if event.event_name != EventName::FieldUpdate {
            return Ok(false);
        }
        let record = AuditRecord::from_bus_event(event, Utc::now())?;
        self.repository.append(&record).await?;
        info!(
            namespace = %record.namespace,
            id = %record.identifier,
            field = %record.field_name,
            before = %record.before,
            after = %record.after,
            who = %record.who,
            event_time = %record.event_time,
            "audit record stored"
        );
        Ok(true)
    }

    /// Starts the background task. The subscription is taken before the
    /// task is spawned so no event published after `start` returns is missed.
    /// The task ends when the bus is closed and yields the number of records
    /// it stored.
    pub fn start(self: Arc<Self>, bus: &EventBus) -> JoinHandle<u64> {
        info!(bus = bus.name(), "starting field audit recorder");
        let receiver = bus.subscribe();
        tokio::spawn(async move { self.run(receiver).await })
    }

    async fn run(&self, mut receiver: EventReceiver) -> u64 {
        let mut recorded = 0u64;
        let mut errors = 0u64;
        loop {
            match receiver.recv().await {
                Ok(envelope) => match self.record_event(&envelope.detail).await {
                    Ok(true) => recorded += 1,
                    Ok(false) => {}
                    Err(e) => {
                        errors += 1;
                        error!(message_id = %envelope.id, event = %envelope.detail, error = %e, "unable to record audit event");
                    }
                },
                Err(BusError::Lagged(n)) => {
                    errors += 1;
                    warn!(missed = n, "field audit recorder lagged, audit events lost");
                }
                Err(_) => {
                    info!(recorded, errors, "event bus closed, field audit recorder stopping");
                    return recorded;
                }
            }
        }
    }
}
