//! Harness configuration types
//!
//! Every field carries a serde default, so a partial YAML file overlays the
//! built-in values rather than replacing them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::watch::PollSpec;

/// Root harness configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HarnessConfig {
    /// Containership service endpoints
    pub endpoints: EndpointConfig,

    /// Organization all resources are created in
    pub organization_id: String,

    /// Poll timings for the different waits
    pub polling: PollingConfig,

    /// How long authorization errors are tolerated while waiting on a new
    /// cluster's API
    pub auth_grace_secs: u64,

    /// Per-request HTTP timeout in seconds
    pub http_timeout_secs: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            endpoints: EndpointConfig::default(),
            organization_id: default_organization_id(),
            polling: PollingConfig::default(),
            auth_grace_secs: 120,
            http_timeout_secs: 30,
        }
    }
}

impl HarnessConfig {
    /// Authorization grace window as a duration
    pub fn auth_grace(&self) -> Duration {
        Duration::from_secs(self.auth_grace_secs)
    }

    /// HTTP timeout as a duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn default_organization_id() -> String {
    "62e4e86f-fe2e-4740-a814-a950bf377daf".to_string()
}

/// Base URLs of the Containership services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EndpointConfig {
    pub provision_url: String,
    /// Kubernetes API proxy, used in generated kubeconfigs
    pub proxy_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            provision_url: "https://stage-provision.containership.io".to_string(),
            proxy_url: "https://stage-proxy.containership.io".to_string(),
        }
    }
}

/// Poll timings per kind of wait
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PollingConfig {
    /// Used for node pool, node and API waits
    #[serde(default = "default_poll")]
    pub default: PollConfig,

    /// Waiting for a new cluster to reach RUNNING
    #[serde(default = "provision_poll")]
    pub provision: PollConfig,

    /// Waiting for a deleted cluster to disappear
    #[serde(default = "delete_poll")]
    pub delete: PollConfig,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            default: default_poll(),
            provision: provision_poll(),
            delete: delete_poll(),
        }
    }
}

fn default_poll() -> PollConfig {
    PollConfig::new(500, 5 * 60)
}

fn provision_poll() -> PollConfig {
    PollConfig::new(1000, 30 * 60)
}

fn delete_poll() -> PollConfig {
    PollConfig::new(1000, 8 * 60)
}

/// A single poll timing in config form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PollConfig {
    pub interval_ms: u64,
    pub timeout_secs: u64,
    #[serde(default = "default_immediate")]
    pub immediate: bool,
}

fn default_immediate() -> bool {
    true
}

impl PollConfig {
    pub fn new(interval_ms: u64, timeout_secs: u64) -> Self {
        Self {
            interval_ms,
            timeout_secs,
            immediate: true,
        }
    }

    /// Convert to the watcher's poll spec
    pub fn spec(&self) -> PollSpec {
        PollSpec::new(
            Duration::from_millis(self.interval_ms),
            Duration::from_secs(self.timeout_secs),
        )
        .with_immediate(self.immediate)
    }
}
