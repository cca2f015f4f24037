// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Bus events and audit records.
//!
//! Domain events arrive at-least-once and unordered; handlers must be
//! idempotent with respect to redelivery. Audit records are append-only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Event name tag carried on the bus
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventName {
    ObjectCreated,
    ObjectPublished,
    ObjectUnpublished,
    MetadataUpdated,
    /// Operator command: re-synchronize the DOI registration
    CommandDoiSync,
    CommandSisNotify,
    CommandOrcidSync,
    /// Audit record of an accepted field mutation
    FieldUpdate,
    Other(String),
}

impl EventName {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ObjectCreated => "object-created",
            Self::ObjectPublished => "object-published",
            Self::ObjectUnpublished => "object-unpublished",
            Self::MetadataUpdated => "metadata-updated",
            Self::CommandDoiSync => "command-doi-sync",
            Self::CommandSisNotify => "command-sis-notify",
            Self::CommandOrcidSync => "command-orcid-sync",
            Self::FieldUpdate => "field-update",
            Self::Other(name) => name,
        }
    }

    pub fn is_command(&self) -> bool {
        matches!(self, Self::CommandDoiSync | Self::CommandSisNotify | Self::CommandOrcidSync)
    }
}

impl From<String> for EventName {
    fn from(name: String) -> Self {
        match name.as_str() {
            "object-created" => Self::ObjectCreated,
            "object-published" => Self::ObjectPublished,
            "object-unpublished" => Self::ObjectUnpublished,
            "metadata-updated" => Self::MetadataUpdated,
            "command-doi-sync" => Self::CommandDoiSync,
            "command-sis-notify" => Self::CommandSisNotify,
            "command-orcid-sync" => Self::CommandOrcidSync,
            "field-update" => Self::FieldUpdate,
            _ => Self::Other(name),
        }
    }
}

impl From<&str> for EventName {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<EventName> for String {
    fn from(name: EventName) -> Self {
        match name {
            EventName::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A domain event as carried on the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusEvent {
    #[serde(alias = "eventName")]
    pub event_name: EventName,
    pub namespace: String,
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
    #[serde(default, alias = "eventTime", skip_serializing_if = "Option::is_none")]
    pub event_time: Option<DateTime<Utc>>,
}

impl BusEvent {
    pub fn new(event_name: EventName, namespace: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            event_name,
            namespace: namespace.into(),
            identifier: identifier.into(),
            detail: None,
            event_time: None,
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

impl fmt::Display for BusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {}/{}>", self.event_name, self.namespace, self.identifier)
    }
}

/// Queue/bus envelope wrapping one domain event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Message id assigned by the bus
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub source: String,
    pub detail: BusEvent,
}

impl EventEnvelope {
    pub fn new(source: impl Into<String>, detail: BusEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source: source.into(),
            detail,
        }
    }
}

/// Outbound side of the event bus
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: BusEvent) -> Result<(), BusError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),

    #[error("Publish failed: {0}")]
    Publish(String),
}

/// Detail payload of a `field-update` bus event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditDetail {
    pub who: String,
    pub field_name: String,
    pub before: String,
    pub after: String,
}

/// Durable before/after record of one accepted field mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub who: String,
    pub namespace: String,
    pub identifier: String,
    pub field_name: String,
    pub before: String,
    pub after: String,
    pub event_time: DateTime<Utc>,
}

impl AuditRecord {
    /// Rebuilds an audit record from a `field-update` bus event
    pub fn from_bus_event(event: &BusEvent, received_at: DateTime<Utc>) -> Result<Self, serde_json::Error> {
        let detail: AuditDetail = match &event.detail {
            Some(detail) => AuditDetail::deserialize(detail)?,
            None => AuditDetail::deserialize(&serde_json::Value::Null)?,
        };
        Ok(Self {
            who: detail.who,
            namespace: event.namespace.clone(),
            identifier: event.identifier.clone(),
            field_name: detail.field_name,
            before: detail.before,
            after: detail.after,
            event_time: event.event_time.unwrap_or(received_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_name_wire_forms() {
        let ev: BusEvent = serde_json::from_value(json!({
            "event_name": "object-published",
            "namespace": "libraetd",
            "identifier": "oid:1"
        }))
        .unwrap();
        assert_eq!(ev.event_name, EventName::ObjectPublished);

        let unknown: EventName = "content-view".into();
        assert_eq!(unknown, EventName::Other("content-view".to_string()));
        assert_eq!(String::from(unknown), "content-view");
        assert_eq!(String::from(EventName::CommandDoiSync), "command-doi-sync");
    }

    #[test]
    fn test_camel_case_envelope_accepted() {
        let ev: BusEvent = serde_json::from_value(json!({
            "eventName": "object-created",
            "namespace": "libraopen",
            "identifier": "oid:2",
            "eventTime": "2026-01-02T03:04:05Z"
        }))
        .unwrap();
        assert_eq!(ev.event_name, EventName::ObjectCreated);
        assert!(ev.event_time.is_some());
    }

    #[test]
    fn test_envelope_decoding() {
        let envelope: EventEnvelope = serde_json::from_value(json!({
            "id": "msg-1",
            "source": "libra-deposit",
            "detail": { "event_name": "metadata-updated", "namespace": "libraopen", "identifier": "oid:3" }
        }))
        .unwrap();
        assert_eq!(envelope.id, "msg-1");
        assert_eq!(envelope.detail.event_name, EventName::MetadataUpdated);
    }

    #[test]
    fn test_audit_record_from_bus_event() {
        let ev = BusEvent::new(EventName::FieldUpdate, "libraetd", "oid:9").with_detail(json!({
            "who": "libra-doi",
            "fieldName": "doi",
            "before": "",
            "after": "https://doi.org/10.1/abc"
        }));
        let now = Utc::now();
        let record = AuditRecord::from_bus_event(&ev, now).unwrap();
        assert_eq!(record.field_name, "doi");
        assert_eq!(record.identifier, "oid:9");
        assert_eq!(record.event_time, now);
    }

    #[test]
    fn test_audit_record_requires_detail() {
        let ev = BusEvent::new(EventName::FieldUpdate, "libraetd", "oid:9");
        assert!(AuditRecord::from_bus_event(&ev, Utc::now()).is_err());
    }
}
