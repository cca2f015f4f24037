// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Results of processing one domain event.
//!
//! A handler returns `Ok(SyncOutcome)` for anything that should *not* be
//! redelivered, including invariant violations, and `Err(SyncError)` for
//! failures the queue should retry.

use std::fmt;
use thiserror::Error;

use crate::domain::external::ExternalError;
use crate::domain::registrar::RegistrarError;
use crate::domain::repository::StoreError;
use crate::domain::sync_config::ConfigError;
use crate::domain::work::WorkError;

/// Conditions that redelivery cannot fix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Stored DOI was minted under another environment's prefix
    CrossEnvironmentIdentifier { doi: String, expected_prefix: String },
    IllegalTransition { event: String, reason: String },
    AmbiguousLookup { namespace: String, source_id: String, count: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::CrossEnvironmentIdentifier { doi, expected_prefix } => {
                write!(f, "stored DOI {} is not under prefix {}", doi, expected_prefix)
            }
            Violation::IllegalTransition { event, reason } => write!(f, "{}: {}", event, reason),
            Violation::AmbiguousLookup { namespace, source_id, count } => {
                write!(f, "{} objects in {} share source id {}", count, namespace, source_id)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Namespace or event not handled by this synchronizer
    Ignored(String),
    NoAction,
    Rejected(Violation),
    /// External call succeeded and nothing changed locally
    Unchanged,
    Updated { field: String, before: String, after: String },
}

impl SyncOutcome {
    /// Metric label
    pub fn label(&self) -> &'static str {
        match self {
            SyncOutcome::Ignored(_) => "ignored",
            SyncOutcome::NoAction => "no_action",
            SyncOutcome::Rejected(_) => "rejected",
            SyncOutcome::Unchanged => "unchanged",
            SyncOutcome::Updated { .. } => "updated",
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("unable to load {namespace}/{id}: {source}")]
    Load {
        namespace: String,
        id: String,
        #[source]
        source: StoreError,
    },

    #[error("bad work metadata for {namespace}/{id}: {source}")]
    Metadata {
        namespace: String,
        id: String,
        #[source]
        source: WorkError,
    },

    #[error(transparent)]
    Registrar(#[from] RegistrarError),

    #[error("{service} call failed: {source}")]
    External {
        service: &'static str,
        #[source]
        source: ExternalError,
    },

    /// The external system accepted the change but the local write-back was abandoned
    #[error("{field} = {value} accepted externally but not persisted to {namespace}/{id}: {source}")]
    NotPersisted {
        namespace: String,
        id: String,
        field: String,
        value: String,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid event: {0}")]
    InvalidEvent(String),
}

impl SyncError {
    /// Processing step that failed, for operator logs
    pub fn step(&self) -> &'static str {
        match self {
            SyncError::Load { .. } => "load",
            SyncError::Metadata { .. } => "decode-metadata",
            SyncError::Registrar(_) => "registrar",
            SyncError::External { service, .. } => *service,
            SyncError::NotPersisted { .. } => "write-back",
            SyncError::Config(_) => "configuration",
            SyncError::InvalidEvent(_) => "decode-event",
        }
    }

    pub fn is_inconsistency(&self) -> bool {
        matches!(self, SyncError::NotPersisted { .. })
    }

    pub(crate) fn external(service: &'static str) -> impl FnOnce(ExternalError) -> SyncError {
        move |source| SyncError::External { service, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(SyncOutcome::Ignored("x".into()).label(), "ignored");
        assert_eq!(SyncOutcome::Unchanged.label(), "unchanged");
        let updated = SyncOutcome::Updated { field: "doi".into(), before: String::new(), after: "a".into() };
        assert_eq!(updated.label(), "updated");
    }

    #[test]
    fn test_only_write_back_failures_are_inconsistencies() {
        let err = SyncError::NotPersisted {
            namespace: "libraetd".into(),
            id: "oid:1".into(),
            field: "doi".into(),
            value: "https://doi.org/10.1/abc".into(),
            source: StoreError::StaleVersion("v1".into()),
        };
        assert!(err.is_inconsistency());
        assert_eq!(err.step(), "write-back");
        assert!(err.to_string().contains("https://doi.org/10.1/abc"));

        let err = SyncError::Load {
            namespace: "libraetd".into(),
            id: "oid:1".into(),
            source: StoreError::NotFound("oid:1".into()),
        };
        assert!(!err.is_inconsistency());
        assert_eq!(err.step(), "load");
    }

    #[test]
    fn test_external_step_names_the_service() {
        let err = SyncError::external("sis")(ExternalError::Unavailable("down".into()));
        assert_eq!(err.step(), "sis");
    }
}
