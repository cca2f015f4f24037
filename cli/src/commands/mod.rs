// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the libra-sync CLI

pub mod audit;
pub mod config;
pub mod resync;
pub mod sync;

pub use self::audit::AuditCommand;
pub use self::config::ConfigCommand;
