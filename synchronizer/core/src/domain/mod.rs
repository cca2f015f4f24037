// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Object model, events, contracts and the DOI lifecycle table.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure types and traits; no I/O

pub mod object;
pub mod work;
pub mod events;
pub mod repository;
pub mod doi;
pub mod lifecycle;
pub mod registrar;
pub mod external;
pub mod sync_config;
