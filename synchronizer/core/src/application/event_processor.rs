// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Event Processor
//!
//! Queue-facing entry point. Decodes envelopes, hands the domain event to a
//! single [`EventHandler`] and reports the result. The queue redelivers any
//! event whose processing returned an error; violations and no-ops are
//! returned as `Ok` so they are not redelivered.

use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::application::outcome::{SyncError, SyncOutcome};
use crate::domain::events::{BusEvent, EventEnvelope};

/// A synchronizer that reacts to domain events
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Short name used in logs and metric labels
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &BusEvent) -> Result<SyncOutcome, SyncError>;
}

/// Decodes queue input. Accepts a JSON array, a single JSON value or a
/// stream of values (one per line); each value may be an envelope or a bare
/// domain event.
pub fn decode_events(input: &str) -> Result<Vec<EventEnvelope>, SyncError> {
    let mut envelopes = Vec::new();
    for value in serde_json::Deserializer::from_str(input).into_iter::<serde_json::Value>() {
        let value = value.map_err(|e| SyncError::InvalidEvent(e.to_string()))?;
        match value {
            serde_json::Value::Array(items) => {
                for item in items {
                    envelopes.push(decode_value(item)?);
                }
            }
            other => envelopes.push(decode_value(other)?),
        }
    }
    Ok(envelopes)
}

fn decode_value(value: serde_json::Value) -> Result<EventEnvelope, SyncError> {
    if value.get("detail").is_some_and(|d| d.get("namespace").is_some()) {
        return serde_json::from_value(value).map_err(|e| SyncError::InvalidEvent(e.to_string()));
    }
    let event: BusEvent = serde_json::from_value(value).map_err(|e| SyncError::InvalidEvent(e.to_string()))?;
    Ok(EventEnvelope::new("", event))
}

pub struct EventProcessor {
    handler: Arc<dyn EventHandler>,
}

impl EventProcessor {
    pub fn new(handler: Arc<dyn EventHandler>) -> Self {
        Self { handler }
    }

    pub fn handler_name(&self) -> &'static str {
        self.handler.name()
    }

    pub async fn process_envelope(&self, envelope: &EventEnvelope) -> Result<SyncOutcome, SyncError> {
        let handler = self.handler.name();
        let started = Instant::now();
        info!(
            handler,
            message_id = %envelope.id,
            source = %envelope.source,
            event = %envelope.detail,
            "processing event"
        );

        let result = self.handler.handle(&envelope.detail).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(outcome) => {
                counter!("libra_sync_events_total", "handler" => handler, "outcome" => outcome.label()).increment(1);
                match outcome {
                    SyncOutcome::Ignored(reason) => {
                        info!(handler, message_id = %envelope.id, reason = %reason, "event ignored");
                    }
                    SyncOutcome::Rejected(violation) => {
                        warn!(handler, message_id = %envelope.id, violation = %violation, "event rejected");
                    }
                    other => {
                        info!(handler, message_id = %envelope.id, outcome = other.label(), elapsed_ms, "event processed");
                    }
                }
            }
            Err(e) => {
                counter!("libra_sync_events_total", "handler" => handler, "outcome" => "error").increment(1);
                error!(
                    handler,
                    message_id = %envelope.id,
                    source = %envelope.source,
                    step = e.step(),
                    inconsistency = e.is_inconsistency(),
                    elapsed_ms,
                    error = %e,
                    "event processing failed"
                );
            }
        }
        result
    }

    /// Processes every envelope; failures do not stop the batch.
    pub async fn process_batch(&self, envelopes: &[EventEnvelope]) -> BatchReport {
        let mut report = BatchReport::default();
        for envelope in envelopes {
            match self.process_envelope(envelope).await {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(e) => {
                    report.failed += 1;
                    report.last_error = Some(e);
                }
            }
        }
        report
    }
}

/// Result of one batch
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Outcomes of the events that were handled, in input order
    pub outcomes: Vec<SyncOutcome>,
    pub failed: usize,
    pub last_error: Option<SyncError>,
}

impl BatchReport {
    /// The last error if any event failed, so the queue redelivers the batch
    pub fn into_result(self) -> Result<Vec<SyncOutcome>, SyncError> {
        match self.last_error {
            Some(e) => Err(e),
            None => Ok(self.outcomes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::EventName;
    use crate::domain::repository::StoreError;
    use std::sync::Mutex;

    /// Fails for identifiers starting with "bad"
    #[derive(Default)]
    struct ScriptedHandler {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EventHandler for ScriptedHandler {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn handle(&self, event: &BusEvent) -> Result<SyncOutcome, SyncError> {
            self.seen.lock().unwrap().push(event.identifier.clone());
            if event.identifier.starts_with("bad") {
                return Err(SyncError::Load {
                    namespace: event.namespace.clone(),
                    id: event.identifier.clone(),
                    source: StoreError::Unavailable("proxy down".into()),
                });
            }
            Ok(SyncOutcome::NoAction)
        }
    }

    #[test]
    fn test_decode_envelope_and_bare_event() {
        let envelopes = decode_events(
            r#"{"id":"m1","source":"libra-deposit","detail":{"event_name":"object-published","namespace":"libraetd","identifier":"oid:1"}}
{"event_name":"metadata-updated","namespace":"libraopen","identifier":"oid:2","detail":{"why":"edit"}}"#,
        )
        .unwrap();
        assert_eq!(envelopes.len(), 2);
        assert_eq!(envelopes[0].id, "m1");
        assert_eq!(envelopes[0].detail.event_name, EventName::ObjectPublished);
        assert_eq!(envelopes[1].detail.identifier, "oid:2");
        assert!(envelopes[1].source.is_empty());
    }

    #[test]
    fn test_decode_array_input() {
        let envelopes = decode_events(
            r#"[{"event_name":"object-created","namespace":"libraetd","identifier":"a"},
                {"event_name":"object-created","namespace":"libraetd","identifier":"b"}]"#,
        )
        .unwrap();
        assert_eq!(envelopes.len(), 2);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_events("{\"namespace\":1}"), Err(SyncError::InvalidEvent(_))));
        assert!(matches!(decode_events("not json"), Err(SyncError::InvalidEvent(_))));
    }

    #[tokio::test]
    async fn test_batch_continues_past_failures() {
        let handler = Arc::new(ScriptedHandler::default());
        let processor = EventProcessor::new(handler.clone());
        let batch: Vec<EventEnvelope> = ["ok-1", "bad-1", "ok-2"]
            .iter()
            .map(|id| EventEnvelope::new("test", BusEvent::new(EventName::ObjectCreated, "libraetd", *id)))
            .collect();

        let report = processor.process_batch(&batch).await;
        assert_eq!(report.outcomes, vec![SyncOutcome::NoAction, SyncOutcome::NoAction]);
        assert_eq!(report.failed, 1);
        let err = report.into_result().unwrap_err();
        assert_eq!(err.step(), "load");
        assert_eq!(*handler.seen.lock().unwrap(), vec!["ok-1", "bad-1", "ok-2"]);
    }

    #[tokio::test]
    async fn test_batch_success_returns_outcomes() {
        let processor = EventProcessor::new(Arc::new(ScriptedHandler::default()));
        let batch = vec![EventEnvelope::new("test", BusEvent::new(EventName::ObjectCreated, "libraetd", "ok"))];
        assert_eq!(processor.process_batch(&batch).await.into_result().unwrap(), vec![SyncOutcome::NoAction]);
    }
}
