// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Libra Sync Core
//!
//! Keeps versioned work records in the Libra object store in step with
//! external systems of record (DOI registrar, SIS, ORCID) in response to
//! domain events.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain model, synchronizers and their adapters

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
