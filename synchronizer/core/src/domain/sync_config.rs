// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Synchronizer Configuration
//
// Built once at process start from environment variables and passed by
// reference into every component constructor. Sections used by only one
// synchronizer are validated lazily so that, for example, the DOI worker
// does not require SIS settings.
//
// Variables:
// - ES_PROXY_URL (required)
// - ID_SERVICE_BASE / ID_SERVICE_SHOULDER / ID_SERVICE_USER /
//   ID_SERVICE_PASSWORD / DOI_BASE_URL / PUBLIC_WORK_URL (DOI)
// - MINT_AUTH_URL, SIS_NOTIFY_URL (SIS)
// - MINT_AUTH_URL, ORCID_GET_DETAILS_URL, ORCID_SET_ACTIVITY_URL (ORCID)
// - MESSAGE_BUS, MESSAGE_SOURCE (audit, optional)
// - HTTP_TIMEOUT_SECS, HTTP_MAX_ATTEMPTS, HTTP_RETRY_DELAY_MS,
//   STORE_MAX_RETRIES, STORE_RETRY_DELAY_MS (tuning, optional)

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::domain::doi::DoiFormat;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(String),

    #[error("invalid value for {name} ({value:?}): {reason}")]
    Invalid {
        name: String,
        value: String,
        reason: String,
    },
}

/// Transient-failure transport tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub timeout: Duration,
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            retry_delay: Duration::from_millis(100),
        }
    }
}

/// Update-with-retry tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRetryConfig {
    /// Re-fetch-and-retry rounds after the initial update
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for StoreRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusConfig {
    /// Empty disables audit publishing
    pub bus_name: String,
    pub source: String,
}

impl BusConfig {
    pub fn is_enabled(&self) -> bool {
        !self.bus_name.is_empty()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct RegistrarConfig {
    pub base_url: String,
    pub shoulder: String,
    pub user: String,
    pub password: String,
    /// Resolver prefix for stored DOI values
    pub doi_base_url: String,
    /// Landing page base, `{base}/{etd|oa}/{id}`
    pub public_work_url: String,
}

impl fmt::Debug for RegistrarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrarConfig")
            .field("base_url", &self.base_url)
            .field("shoulder", &self.shoulder)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("doi_base_url", &self.doi_base_url)
            .field("public_work_url", &self.public_work_url)
            .finish()
    }
}

impl RegistrarConfig {
    /// Shoulder and resolver as used by both the prefix guard and the registrar payload
    pub fn doi_format(&self) -> DoiFormat {
        DoiFormat::new(&self.shoulder, &self.doi_base_url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SisConfig {
    pub auth_url: String,
    /// Template with `{:id}`, `{:auth}` and `{:doi}`
    pub notify_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrcidConfig {
    pub auth_url: String,
    /// Template with `{:id}` and `{:auth}`
    pub details_url: String,
    /// Template with `{:id}` and `{:auth}`
    pub activity_url: String,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub store_url: String,
    pub transport: TransportConfig,
    pub store_retry: StoreRetryConfig,
    pub bus: BusConfig,
    registrar: Result<RegistrarConfig, ConfigError>,
    sis: Result<SisConfig, ConfigError>,
    orcid: Result<OrcidConfig, ConfigError>,
}

impl SyncConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let transport_defaults = TransportConfig::default();
        let transport = TransportConfig {
            timeout: Duration::from_secs(env.parse_or("HTTP_TIMEOUT_SECS", transport_defaults.timeout.as_secs())?),
            max_attempts: env.parse_or("HTTP_MAX_ATTEMPTS", transport_defaults.max_attempts)?,
            retry_delay: Duration::from_millis(
                env.parse_or("HTTP_RETRY_DELAY_MS", transport_defaults.retry_delay.as_millis() as u64)?,
            ),
        };
        if transport.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                name: "HTTP_MAX_ATTEMPTS".to_string(),
                value: "0".to_string(),
                reason: "at least one attempt is required".to_string(),
            });
        }

        let retry_defaults = StoreRetryConfig::default();
        let store_retry = StoreRetryConfig {
            max_retries: env.parse_or("STORE_MAX_RETRIES", retry_defaults.max_retries)?,
            delay: Duration::from_millis(
                env.parse_or("STORE_RETRY_DELAY_MS", retry_defaults.delay.as_millis() as u64)?,
            ),
        };

        let registrar = env.registrar_section();
        let sis = env.sis_section();
        let orcid = env.orcid_section();

        Ok(Self {
            store_url: env.required("ES_PROXY_URL")?,
            transport,
            store_retry,
            bus: BusConfig {
                bus_name: env.optional("MESSAGE_BUS"),
                source: env.optional("MESSAGE_SOURCE"),
            },
            registrar,
            sis,
            orcid,
        })
    }

    /// Builds a configuration directly, for embedding and tests
    pub fn new(store_url: impl Into<String>) -> Self {
        Self {
            store_url: store_url.into(),
            transport: TransportConfig::default(),
            store_retry: StoreRetryConfig::default(),
            bus: BusConfig::default(),
            registrar: Err(ConfigError::Missing("ID_SERVICE_BASE".to_string())),
            sis: Err(ConfigError::Missing("SIS_NOTIFY_URL".to_string())),
            orcid: Err(ConfigError::Missing("ORCID_GET_DETAILS_URL".to_string())),
        }
    }

    pub fn with_registrar(mut self, registrar: RegistrarConfig) -> Self {
        self.registrar = Ok(registrar);
        self
    }

    pub fn with_sis(mut self, sis: SisConfig) -> Self {
        self.sis = Ok(sis);
        self
    }

    pub fn with_orcid(mut self, orcid: OrcidConfig) -> Self {
        self.orcid = Ok(orcid);
        self
    }

    pub fn registrar(&self) -> Result<&RegistrarConfig, ConfigError> {
        self.registrar.as_ref().map_err(Clone::clone)
    }

    pub fn sis(&self) -> Result<&SisConfig, ConfigError> {
        self.sis.as_ref().map_err(Clone::clone)
    }

    pub fn orcid(&self) -> Result<&OrcidConfig, ConfigError> {
        self.orcid.as_ref().map_err(Clone::clone)
    }
}

struct Env<'a, F>(&'a F);

impl<F> Env<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &str) -> String {
        (self.0)(name).map(|v| v.trim().to_string()).unwrap_or_default()
    }

    fn required(&self, name: &str) -> Result<String, ConfigError> {
        let value = self.optional(name);
        if value.is_empty() {
            return Err(ConfigError::Missing(name.to_string()));
        }
        Ok(value)
    }

    fn parse_or<T>(&self, name: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let value = self.optional(name);
        if value.is_empty() {
            return Ok(default);
        }
        value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name: name.to_string(),
            value,
            reason: e.to_string(),
        })
    }

    fn registrar_section(&self) -> Result<RegistrarConfig, ConfigError> {
        Ok(RegistrarConfig {
            base_url: self.required("ID_SERVICE_BASE")?,
            shoulder: self.required("ID_SERVICE_SHOULDER")?,
            user: self.required("ID_SERVICE_USER")?,
            password: self.required("ID_SERVICE_PASSWORD")?,
            doi_base_url: self.required("DOI_BASE_URL")?,
            public_work_url: self.required("PUBLIC_WORK_URL")?,
        })
    }

    fn sis_section(&self) -> Result<SisConfig, ConfigError> {
        Ok(SisConfig {
            auth_url: self.required("MINT_AUTH_URL")?,
            notify_url: self.required("SIS_NOTIFY_URL")?,
        })
    }

    fn orcid_section(&self) -> Result<OrcidConfig, ConfigError> {
        Ok(OrcidConfig {
            auth_url: self.required("MINT_AUTH_URL")?,
            details_url: self.required("ORCID_GET_DETAILS_URL")?,
            activity_url: self.required("ORCID_SET_ACTIVITY_URL")?,
        })
    }
}
