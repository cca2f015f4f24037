// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod outcome;
pub mod update_with_retry;
pub mod audit_emitter;
pub mod event_processor;
pub mod locate;

pub mod doi_sync;
pub mod sis_notify;
pub mod orcid_sync;
pub mod field_audit_recorder;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export services for convenience
pub use audit_emitter::{AuditEmitter, AuditError};
pub use doi_sync::DoiSynchronizer;
pub use event_processor::{decode_events, BatchReport, EventHandler, EventProcessor};
pub use field_audit_recorder::FieldAuditRecorder;
pub use locate::{locate_by_source_id, resync_event, LocateError};
pub use orcid_sync::OrcidSynchronizer;
pub use outcome::{SyncError, SyncOutcome, Violation};
pub use sis_notify::SisNotifier;
pub use update_with_retry::ApplyFieldThenRetry;
