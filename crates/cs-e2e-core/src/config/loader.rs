//! Harness configuration loading
//!
//! Loads configuration with the following precedence (low to high):
//! 1. Built-in defaults
//! 2. Optional YAML file (`--config`)
//! 3. Environment variables (`CS_E2E_*` prefix)
//! 4. CLI flags (handled by caller)

use std::env;
use std::fs;

use camino::Utf8Path;
use url::Url;

use super::types::{HarnessConfig, PollConfig};
use crate::error::{Error, Result};

/// Overrides the organization resources are created in
pub const ENV_ORGANIZATION_ID: &str = "CS_E2E_ORGANIZATION_ID";
/// Overrides the provision service base URL
pub const ENV_PROVISION_URL: &str = "CS_E2E_PROVISION_URL";
/// Overrides the Kubernetes API proxy base URL
pub const ENV_PROXY_URL: &str = "CS_E2E_PROXY_URL";

/// Loads and validates [`HarnessConfig`]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the process environment and an optional file
    pub fn load(path: Option<&Utf8Path>) -> Result<HarnessConfig> {
        Self::load_with_env(path, |key| env::var(key).ok())
    }

    /// Load configuration, resolving environment variables through `lookup`
    pub fn load_with_env<F>(path: Option<&Utf8Path>, lookup: F) -> Result<HarnessConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = match path {
            Some(path) => Self::load_yaml_file(path)?,
            None => HarnessConfig::default(),
        };
        let config = Self::apply_env_overrides(config, lookup);
        Self::validate(&config)?;

        tracing::debug!(
            organization_id = %config.organization_id,
            provision_url = %config.endpoints.provision_url,
            "loaded harness configuration"
        );
        Ok(config)
    }

    fn load_yaml_file(path: &Utf8Path) -> Result<HarnessConfig> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config_not_found(path.as_str())
            } else {
                Error::Io(e)
            }
        })?;

        // An empty file is valid and means "all defaults"
        if content.trim().is_empty() {
            return Ok(HarnessConfig::default());
        }

        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))
    }

    fn apply_env_overrides<F>(mut config: HarnessConfig, lookup: F) -> HarnessConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup(ENV_ORGANIZATION_ID) {
            config.organization_id = val;
        }

        if let Some(val) = lookup(ENV_PROVISION_URL) {
            config.endpoints.provision_url = val;
        }

        if let Some(val) = lookup(ENV_PROXY_URL) {
            config.endpoints.proxy_url = val;
        }

        config
    }

    /// Validate a configuration
    pub fn validate(config: &HarnessConfig) -> Result<()> {
        let endpoints = [
            ("endpoints.provision-url", &config.endpoints.provision_url),
            ("endpoints.proxy-url", &config.endpoints.proxy_url),
        ];
        for (key, value) in endpoints {
            Url::parse(value)
                .map_err(|e| Error::invalid_config(format!("{key} '{value}' is not a URL: {e}")))?;
        }

        uuid::Uuid::parse_str(&config.organization_id).map_err(|_| {
            Error::invalid_config(format!(
                "organization-id '{}' is not a UUID",
                config.organization_id
            ))
        })?;

        let polls = [
            ("polling.default", &config.polling.default),
            ("polling.provision", &config.polling.provision),
            ("polling.delete", &config.polling.delete),
        ];
        for (key, poll) in polls {
            Self::validate_poll(key, poll)?;
        }

        if config.http_timeout_secs == 0 {
            return Err(Error::invalid_config("http-timeout-secs must be positive"));
        }

        Ok(())
    }

    fn validate_poll(key: &str, poll: &PollConfig) -> Result<()> {
        if poll.timeout_secs == 0 {
            return Err(Error::invalid_config(format!(
                "{key}.timeout-secs must be positive"
            )));
        }
        Ok(())
    }
}
