// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Audit Emitter
//!
//! Publishes one `field-update` bus event per accepted field mutation.
//! Auditing is best-effort: synchronizers call [`AuditEmitter::record`],
//! which logs failures instead of returning them.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::events::{AuditDetail, BusError, BusEvent, EventName, EventPublisher};
use crate::domain::object::VersionedObject;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("no audit bus configured")]
    NotConfigured,

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error("unable to encode audit detail: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct AuditEmitter {
    publisher: Option<Arc<dyn EventPublisher>>,
    who: String,
}

impl AuditEmitter {
    pub fn new(publisher: Arc<dyn EventPublisher>, who: impl Into<String>) -> Self {
        Self {
            publisher: Some(publisher),
            who: who.into(),
        }
    }

    /// Emitter with no bus; every publish reports `NotConfigured`
    pub fn disabled(who: impl Into<String>) -> Self {
        Self {
            publisher: None,
            who: who.into(),
        }
    }

    pub fn who(&self) -> &str {
        &self.who
    }

    pub async fn publish(
        &self,
        object: &VersionedObject,
        field_name: &str,
        before: &str,
        after: &str,
    ) -> Result<(), AuditError> {
        let publisher = self.publisher.as_ref().ok_or(AuditError::NotConfigured)?;

        let detail = AuditDetail {
            who: self.who.clone(),
            field_name: field_name.to_string(),
            before: before.to_string(),
            after: after.to_string(),
        };
        let mut event = BusEvent::new(EventName::FieldUpdate, object.namespace.clone(), object.id.as_str())
            .with_detail(serde_json::to_value(&detail)?);
        event.event_time = Some(Utc::now());

        publisher.publish(event).await?;
        debug!(object = %object.key(), field = field_name, "audit event published");
        Ok(())
    }

    /// Publishes and logs any failure
    pub async fn record(&self, object: &VersionedObject, field_name: &str, before: &str, after: &str) {
        match self.publish(object, field_name, before, after).await {
            Ok(()) => {}
            Err(AuditError::NotConfigured) => {
                debug!(object = %object.key(), field = field_name, "audit disabled, change not published");
            }
            Err(e) => {
                warn!(object = %object.key(), field = field_name, error = %e, "unable to publish audit event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::event_bus::EventBus;
    use async_trait::async_trait;

    struct BrokenPublisher;

    #[async_trait]
    impl EventPublisher for BrokenPublisher {
        async fn publish(&self, _event: BusEvent) -> Result<(), BusError> {
            Err(BusError::Publish("bus rejected event".into()))
        }
    }

    fn object() -> VersionedObject {
        VersionedObject::new("libraetd").with_id("oid:1")
    }

    #[tokio::test]
    async fn test_publishes_field_update_event() {
        let bus = Arc::new(EventBus::new("uva-events", "libra-doi", 10));
        let mut receiver = bus.subscribe();
        let emitter = AuditEmitter::new(bus.clone(), "libra-doi");

        emitter.publish(&object(), "doi", "", "https://doi.org/10.1/abc").await.unwrap();

        let event = receiver.recv().await.unwrap().detail;
        assert_eq!(event.event_name, EventName::FieldUpdate);
        assert_eq!(event.identifier, "oid:1");
        assert!(event.event_time.is_some());
        let detail: AuditDetail = serde_json::from_value(event.detail.unwrap()).unwrap();
        assert_eq!(detail.who, "libra-doi");
        assert_eq!(detail.field_name, "doi");
        assert_eq!(detail.before, "");
        assert_eq!(detail.after, "https://doi.org/10.1/abc");
    }

    #[tokio::test]
    async fn test_disabled_emitter_is_not_configured() {
        let emitter = AuditEmitter::disabled("libra-doi");
        let err = emitter.publish(&object(), "doi", "", "x").await.unwrap_err();
        assert!(matches!(err, AuditError::NotConfigured));
        // record never fails
        emitter.record(&object(), "doi", "", "x").await;
    }

    #[tokio::test]
    async fn test_bus_failure_is_reported() {
        let emitter = AuditEmitter::new(Arc::new(BrokenPublisher), "libra-doi");
        let err = emitter.publish(&object(), "doi", "", "x").await.unwrap_err();
        assert!(matches!(err, AuditError::Bus(BusError::Publish(_))));
        emitter.record(&object(), "doi", "", "x").await;
    }
}
