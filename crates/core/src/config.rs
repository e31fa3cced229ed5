//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services, so
//! request handling never reads process-wide environment variables.
//!
//! Store credentials come from one of two sources:
//!
//! - **Hosted**: a pre-injected JSON credentials bundle plus an app id (and optionally an
//!   initial sign-in token). The app id is the store namespace.
//! - **Standalone**: individual environment variables. The project id is the store namespace.
//!
//! Missing or invalid credentials disable persistence. Scoring never depends on them.

use crate::constants::{DEFAULT_DATA_DIR, DEFAULT_PROCESSING_LATENCY_MS};
use crate::validation::validate_namespace;
use crate::{CoreResult, TriageError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Credentials bundle for the record store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreCredentials {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
}

impl StoreCredentials {
    /// Credentials are usable once the API key and project id are present.
    pub fn validate(&self) -> CoreResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(TriageError::Configuration("api key is missing".into()));
        }
        if self.project_id.trim().is_empty() {
            return Err(TriageError::Configuration("project id is missing".into()));
        }
        Ok(())
    }
}

/// Where the store configuration came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Deployment {
    Hosted,
    Standalone,
}

/// Raw configuration inputs, before validation.
#[derive(Clone, Debug, Default)]
pub struct ConfigSource {
    pub hosted_config: Option<String>,
    pub hosted_app_id: Option<String>,
    pub hosted_auth_token: Option<String>,
    pub local: StoreCredentials,
}

impl ConfigSource {
    /// Collects configuration inputs through `lookup` (normally `std::env::var`).
    pub fn collect(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).unwrap_or_default();
        Self {
            hosted_config: lookup("TRIAGE_HOSTED_CONFIG"),
            hosted_app_id: lookup("TRIAGE_APP_ID"),
            hosted_auth_token: lookup("TRIAGE_INITIAL_AUTH_TOKEN"),
            local: StoreCredentials {
                api_key: get("API_KEY"),
                auth_domain: get("AUTH_DOMAIN"),
                project_id: get("PROJECT_ID"),
                storage_bucket: get("STORAGE_BUCKET"),
                messaging_sender_id: get("MESSAGING_SENDER_ID"),
                app_id: get("APP_ID"),
            },
        }
    }

    /// Reads configuration inputs from the process environment.
    pub fn from_env() -> Self {
        Self::collect(|key| std::env::var(key).ok())
    }
}

/// Validated store configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    pub credentials: StoreCredentials,
    pub namespace: String,
    pub initial_auth_token: Option<String>,
    pub deployment: Deployment,
}

/// Resolves and validates the store configuration.
///
/// The hosted bundle wins when both its JSON and app id are present; otherwise the standalone
/// variables are used.
///
/// # Errors
///
/// Returns [`TriageError::ConfigurationJson`] if the hosted bundle is not valid JSON, and
/// [`TriageError::Configuration`] if credentials are incomplete or the namespace is unsafe.
pub fn resolve_store_config(source: ConfigSource) -> CoreResult<StoreConfig> {
    let config = match (source.hosted_config, source.hosted_app_id) {
        (Some(raw), Some(app_id)) => {
            let credentials: StoreCredentials =
                serde_json::from_str(&raw).map_err(TriageError::ConfigurationJson)?;
            StoreConfig {
                credentials,
                namespace: app_id,
                initial_auth_token: source.hosted_auth_token.filter(|t| !t.trim().is_empty()),
                deployment: Deployment::Hosted,
            }
        }
        _ => StoreConfig {
            namespace: source.local.project_id.clone(),
            credentials: source.local,
            initial_auth_token: None,
            deployment: Deployment::Standalone,
        },
    };

    config.credentials.validate()?;
    validate_namespace(&config.namespace)?;
    Ok(config)
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    store: Option<StoreConfig>,
    processing_latency: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`. `store` is `None` when persistence is disabled.
    pub fn new(
        data_dir: PathBuf,
        store: Option<StoreConfig>,
        processing_latency: Duration,
    ) -> CoreResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(TriageError::InvalidInput("data_dir cannot be empty".into()));
        }

        Ok(Self {
            data_dir,
            store,
            processing_latency,
        })
    }

    /// Resolves the full configuration from the process environment.
    ///
    /// Store configuration problems are logged and disable persistence; only an unusable data
    /// directory or latency value is an error.
    pub fn from_env() -> CoreResult<Self> {
        let data_dir = std::env::var("TRIAGE_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
        let latency =
            processing_latency_from_env_value(std::env::var("TRIAGE_PROCESSING_LATENCY_MS").ok())?;

        let store = match resolve_store_config(ConfigSource::from_env()) {
            Ok(store) => {
                tracing::info!(
                    "record store configured ({:?}, namespace {})",
                    store.deployment,
                    store.namespace
                );
                Some(store)
            }
            Err(e) => {
                tracing::error!("store configuration invalid, persistence disabled: {}", e);
                None
            }
        };

        Self::new(PathBuf::from(data_dir), store, latency)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn persistence_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.store.as_ref().map(|s| s.namespace.as_str())
    }

    /// API key callers must present, when credentials are configured.
    pub fn api_key(&self) -> Option<&str> {
        self.store.as_ref().map(|s| s.credentials.api_key.as_str())
    }

    pub fn initial_auth_token(&self) -> Option<&str> {
        self.store
            .as_ref()
            .and_then(|s| s.initial_auth_token.as_deref())
    }

    pub fn processing_latency(&self) -> Duration {
        self.processing_latency
    }
}

/// Parse the processing latency (milliseconds) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default of 1500 ms.
pub fn processing_latency_from_env_value(value: Option<String>) -> CoreResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let millis = match value {
        Some(v) => v.parse::<u64>().map_err(|e| {
            TriageError::InvalidInput(format!("invalid processing latency '{v}': {e}"))
        })?,
        None => DEFAULT_PROCESSING_LATENCY_MS,
    };

    Ok(Duration::from_millis(millis))
}
