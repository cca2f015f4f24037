// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Object Store Implementations
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Adapters for the domain `ObjectStore` contract
//!
//! - **HttpObjectStore** - REST proxy client used in production
//! - **InMemoryObjectStore** - Thread-safe reference store for tests and dry runs

pub mod http;
pub mod memory;

pub use http::HttpObjectStore;
pub use memory::InMemoryObjectStore;
