// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod http;
pub mod store;
pub mod datacite;
pub mod auth;
pub mod sis;
pub mod orcid;
pub mod event_bus;
pub mod audit_repository;

pub use audit_repository::{InMemoryAuditRepository, JsonLinesAuditRepository};
pub use event_bus::{EventBus, EventReceiver};
pub use http::{HttpTransport, OutboundRequest, TransportError};
pub use store::{HttpObjectStore, InMemoryObjectStore};
