// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Pub/Sub for Domain Events
//
// In-process event streaming using tokio broadcast channels. Every published
// event is wrapped in an `EventEnvelope` stamped with the bus source, the
// same envelope shape the event processor decodes from the queue.
//
// In-memory only: events published with no subscriber are dropped.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::events::{BusError, BusEvent, EventEnvelope, EventPublisher};

/// Event bus for publishing and subscribing to domain events
#[derive(Clone)]
pub struct EventBus {
    name: String,
    source: String,
    sender: Arc<broadcast::Sender<EventEnvelope>>,
}

impl EventBus {
    /// Capacity is the number of envelopes buffered before slow receivers lag
    pub fn new(name: impl Into<String>, source: impl Into<String>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            name: name.into(),
            source: source.into(),
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(name, source, 1000)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wraps and broadcasts an event; returns the number of receivers
    pub fn send(&self, event: BusEvent) -> usize {
        let envelope = EventEnvelope::new(self.source.clone(), event);
        debug!(bus = %self.name, message_id = %envelope.id, event = %envelope.detail, "publishing event");

        let receiver_count = self.sender.send(envelope).unwrap_or(0);
        if receiver_count == 0 {
            debug!(bus = %self.name, "no subscribers listening to event");
        }
        receiver_count
    }

    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl EventPublisher for EventBus {
    async fn publish(&self, event: BusEvent) -> Result<(), BusError> {
        self.send(event);
        Ok(())
    }
}

/// Receiver for all envelopes on the bus
pub struct EventReceiver {
    receiver: broadcast::Receiver<EventEnvelope>,
}

impl EventReceiver {
    /// Receive the next envelope (waits until one is available)
    pub async fn recv(&mut self) -> Result<EventEnvelope, BusError> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => BusError::Closed,
            broadcast::error::RecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                BusError::Lagged(n)
            }
        })
    }

    pub fn try_recv(&mut self) -> Result<EventEnvelope, BusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => BusError::Empty,
            broadcast::error::TryRecvError::Closed => BusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                BusError::Lagged(n)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::EventName;

    #[tokio::test]
    async fn test_publish_subscribe_stamps_source() {
        let bus = EventBus::new("uva-events", "libra-doi", 10);
        let mut receiver = bus.subscribe();

        bus.publish(BusEvent::new(EventName::FieldUpdate, "libraetd", "oid:1"))
            .await
            .unwrap();

        let envelope = receiver.recv().await.unwrap();
        assert_eq!(envelope.source, "libra-doi");
        assert!(!envelope.id.is_empty());
        assert_eq!(envelope.detail.identifier, "oid:1");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_not_an_error() {
        let bus = EventBus::with_default_capacity("uva-events", "libra-doi");
        assert_eq!(bus.send(BusEvent::new(EventName::FieldUpdate, "libraetd", "oid:1")), 0);
        assert!(bus.publish(BusEvent::new(EventName::FieldUpdate, "libraetd", "oid:1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new("uva-events", "libra-doi", 10);
        let mut receiver1 = bus.subscribe();
        let mut receiver2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.send(BusEvent::new(EventName::ObjectCreated, "libraopen", "oid:2"));

        assert_eq!(receiver1.recv().await.unwrap().detail.namespace, "libraopen");
        assert_eq!(receiver2.recv().await.unwrap().detail.namespace, "libraopen");
        assert_eq!(receiver1.try_recv().unwrap_err(), BusError::Empty);
    }

    #[tokio::test]
    async fn test_slow_receiver_lags() {
        let bus = EventBus::new("uva-events", "libra-doi", 2);
        let mut receiver = bus.subscribe();
        for n in 0..4 {
            bus.send(BusEvent::new(EventName::FieldUpdate, "libraetd", format!("oid:{}", n)));
        }
        assert_eq!(receiver.recv().await.unwrap_err(), BusError::Lagged(2));
        assert_eq!(receiver.recv().await.unwrap().detail.identifier, "oid:2");
    }
}
