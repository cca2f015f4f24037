// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Builds synchronizers from configuration.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use libra_sync_core::application::{
    AuditEmitter, DoiSynchronizer, FieldAuditRecorder, OrcidSynchronizer, SisNotifier,
};
use libra_sync_core::domain::repository::{AuditRepository, ObjectStore};
use libra_sync_core::domain::sync_config::SyncConfig;
use libra_sync_core::infrastructure::auth::MintAuthClient;
use libra_sync_core::infrastructure::datacite::DataciteRegistrar;
use libra_sync_core::infrastructure::orcid::OrcidClient;
use libra_sync_core::infrastructure::sis::SisClient;
use libra_sync_core::infrastructure::{
    EventBus, HttpObjectStore, HttpTransport, InMemoryAuditRepository, JsonLinesAuditRepository,
};

/// Shared components for one process run
pub struct Services {
    pub config: SyncConfig,
    pub transport: Arc<HttpTransport>,
    pub store: Arc<dyn ObjectStore>,
    bus: Option<Arc<EventBus>>,
    recorder: Option<JoinHandle<u64>>,
}

impl Services {
    pub fn from_env(audit_log: Option<&Path>) -> Result<Self> {
        let config = SyncConfig::from_env().context("Failed to load configuration")?;
        Self::new(config, audit_log)
    }

    /// With `audit_log` set, audit records are appended to that JSON-lines
    /// file; otherwise they only reach the log output.
    pub fn new(config: SyncConfig, audit_log: Option<&Path>) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config.transport).context("Failed to build HTTP client")?);
        let store = HttpObjectStore::new(transport.clone(), &config.store_url)
            .context("Failed to create object store client")?;

        if audit_log.is_some() && !config.bus.is_enabled() {
            warn!("MESSAGE_BUS is not set, no audit records will be written");
        }
        let audit_log: Arc<dyn AuditRepository> = match audit_log {
            Some(path) => {
                info!(path = %path.display(), "appending audit records to file");
                Arc::new(JsonLinesAuditRepository::new(path))
            }
            None => Arc::new(InMemoryAuditRepository::new()),
        };
        let (bus, recorder) = if config.bus.is_enabled() {
            let bus = Arc::new(EventBus::with_default_capacity(
                config.bus.bus_name.clone(),
                config.bus.source.clone(),
            ));
            let recorder = Arc::new(FieldAuditRecorder::new(audit_log.clone())).start(&bus);
            (Some(bus), Some(recorder))
        } else {
            (None, None)
        };

        Ok(Self {
            config,
            transport,
            store: Arc::new(store),
            bus,
            recorder,
        })
    }

    fn audit(&self, default_who: &str) -> AuditEmitter {
        let who = if self.config.bus.source.is_empty() {
            default_who.to_string()
        } else {
            self.config.bus.source.clone()
        };
        match &self.bus {
            Some(bus) => AuditEmitter::new(bus.clone(), who),
            None => AuditEmitter::disabled(who),
        }
    }

    pub fn doi_synchronizer(&self) -> Result<DoiSynchronizer> {
        let registrar = self.config.registrar().context("DOI registrar is not configured")?;
        Ok(DoiSynchronizer::new(
            self.store.clone(),
            Arc::new(DataciteRegistrar::new(self.transport.clone(), registrar.clone())),
            registrar.doi_format(),
            self.config.store_retry.clone(),
            self.audit("libra-doi"),
        ))
    }

    pub fn sis_notifier(&self) -> Result<SisNotifier> {
        let sis = self.config.sis().context("SIS notification is not configured")?;
        Ok(SisNotifier::new(
            self.store.clone(),
            Arc::new(SisClient::new(self.transport.clone(), sis.notify_url.clone())),
            Arc::new(MintAuthClient::new(self.transport.clone(), sis.auth_url.clone())),
            self.config.store_retry.clone(),
            self.audit("libra-sis-notify"),
        ))
    }

    pub fn orcid_synchronizer(&self) -> Result<OrcidSynchronizer> {
        let orcid = self.config.orcid().context("ORCID is not configured")?;
        Ok(OrcidSynchronizer::new(
            self.store.clone(),
            Arc::new(OrcidClient::new(
                self.transport.clone(),
                orcid.details_url.clone(),
                orcid.activity_url.clone(),
            )),
            Arc::new(MintAuthClient::new(self.transport.clone(), orcid.auth_url.clone())),
            self.config.store_retry.clone(),
            self.audit("libra-orcid"),
        ))
    }

    /// Stops the audit recorder once every published audit has been stored.
    /// Returns the number of audit records written.
    pub async fn shutdown(mut self) -> u64 {
        // dropping the last sender closes the bus and ends the recorder
        self.bus = None;
        match self.recorder.take() {
            Some(recorder) => recorder.await.unwrap_or_else(|e| {
                warn!(error = %e, "field audit recorder did not finish");
                0
            }),
            None => 0,
        }
    }
}
