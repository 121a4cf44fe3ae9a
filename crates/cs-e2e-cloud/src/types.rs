//! Provision API resource types
//!
//! Field names follow the API's snake_case JSON. Unknown fields in template
//! configuration are preserved so a template file round-trips to the API
//! without losing provider-specific settings.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CloudError, Result};

/// Lifecycle state reported in a resource's `status.type`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceState {
    Provisioning,
    Running,
    Updating,
    Deleting,
    /// Any state outside the known vocabulary, kept verbatim
    Other(String),
}

impl ResourceState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Provisioning => "PROVISIONING",
            Self::Running => "RUNNING",
            Self::Updating => "UPDATING",
            Self::Deleting => "DELETING",
            Self::Other(s) => s,
        }
    }

    /// Parse a state string; unknown values become `Other`
    pub fn parse(s: &str) -> Self {
        match s {
            "PROVISIONING" => Self::Provisioning,
            "RUNNING" => Self::Running,
            "UPDATING" => Self::Updating,
            "DELETING" => Self::Deleting,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ResourceState {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<ResourceState> for String {
    fn from(state: ResourceState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource's `status` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStatus {
    #[serde(rename = "type")]
    pub state: ResourceState,
}

/// Per-pool defaults in a template variable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePoolDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A node pool variable in a template's configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePoolVariable {
    #[serde(default)]
    pub default: NodePoolDefaults,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Template configuration: node pool variables plus provider resources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateConfiguration {
    /// Node pool variables keyed by pool id
    #[serde(default)]
    pub variable: BTreeMap<String, NodePoolVariable>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub resource: Value,
}

/// Body of a template create request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTemplateRequest {
    pub provider_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub configuration: TemplateConfiguration,
}

impl CreateTemplateRequest {
    /// Parse a rendered infrastructure template
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| CloudError::InvalidTemplate(e.to_string()))
    }

    /// Operating system of the first node pool variable
    ///
    /// All pools are assumed to share an OS; "first" is by pool id order.
    pub fn operating_system(&self) -> Result<&str> {
        let (pool, variable) = self.configuration.variable.iter().next().ok_or_else(|| {
            CloudError::InvalidTemplate("template has no node pool variables".to_string())
        })?;
        variable
            .default
            .os
            .as_deref()
            .filter(|os| !os.is_empty())
            .ok_or_else(|| {
                CloudError::InvalidTemplate(format!("node pool variable {pool:?} has no os"))
            })
    }

    /// Append the operating system to the description (`<description>-<os>`)
    pub fn append_os_to_description(&mut self) -> Result<()> {
        let os = self.operating_system()?.to_string();
        self.description = format!("{}-{}", self.description, os);
        Ok(())
    }
}

/// A stored template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub provider_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub configuration: TemplateConfiguration,
}

/// A CKE (Containership Kubernetes Engine) cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CkeCluster {
    pub id: String,
    #[serde(default)]
    pub provider_name: Option<String>,
    pub status: ResourceStatus,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl CkeCluster {
    pub fn state(&self) -> &ResourceState {
        &self.status.state
    }
}

/// A plugin to install on a new cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDefinition {
    #[serde(rename = "type")]
    pub plugin_type: String,
    pub implementation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl PluginDefinition {
    pub fn new(plugin_type: &str, implementation: &str) -> Self {
        Self {
            plugin_type: plugin_type.to_string(),
            implementation: implementation.to_string(),
            version: None,
        }
    }
}

/// Body of a CKE cluster create request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCkeClusterRequest {
    pub provider_id: String,
    pub template_id: String,
    pub labels: BTreeMap<String, String>,
    pub plugins: Vec<PluginDefinition>,
}

/// A cluster node pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePool {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub count: u32,
    pub kubernetes_mode: String,
    #[serde(default)]
    pub kubernetes_version: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    pub status: ResourceStatus,
}

impl NodePool {
    pub fn state(&self) -> &ResourceState {
        &self.status.state
    }

    pub fn is_worker(&self) -> bool {
        self.kubernetes_mode == "worker"
    }
}

/// Body of a node pool scale request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePoolScaleRequest {
    pub count: u32,
}
