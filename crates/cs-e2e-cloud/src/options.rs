//! Cluster create options
//!
//! The provider named in a template decides which storage and cloud
//! controller plugins a new cluster gets by default.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::error::{CloudError, Result};
use crate::types::{CreateCkeClusterRequest, PluginDefinition};

/// Label carrying the cluster's display name
pub const CLUSTER_NAME_LABEL: &str = "containership.io/cluster-name";
/// Label carrying the cluster's environment
pub const CLUSTER_ENVIRONMENT_LABEL: &str = "containership.io/cluster-environment";

/// Environment label value for clusters created by the harness
pub const E2E_ENVIRONMENT: &str = "e2e-test";

/// Providers clusters can be provisioned on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    AmazonWebServices,
    Azure,
    DigitalOcean,
    Google,
    Packet,
}

impl ProviderKind {
    /// The provider name used in templates
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AmazonWebServices => "amazon_web_services",
            Self::Azure => "azure",
            Self::DigitalOcean => "digital_ocean",
            Self::Google => "google",
            Self::Packet => "packet",
        }
    }

    /// Container storage interface implementation, if the provider has one
    fn default_csi(&self) -> Option<&'static str> {
        match self {
            Self::AmazonWebServices => Some("aws-ebs"),
            Self::Azure => Some("azure-disk"),
            Self::DigitalOcean => Some("digitalocean"),
            Self::Google => Some("gce-pd"),
            Self::Packet => None,
        }
    }

    /// Cloud controller manager implementation, if the provider has one
    fn default_ccm(&self) -> Option<&'static str> {
        match self {
            Self::DigitalOcean => Some("digitalocean"),
            Self::Packet => Some("packet"),
            _ => None,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "amazon_web_services" => Ok(Self::AmazonWebServices),
            "azure" => Ok(Self::Azure),
            "digital_ocean" => Ok(Self::DigitalOcean),
            "google" => Ok(Self::Google),
            "packet" => Ok(Self::Packet),
            other => Err(CloudError::UnknownProvider(other.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plugin implementations; `None` takes the provider default
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginSelection {
    pub cni: Option<String>,
    pub csi: Option<String>,
    pub ccm: Option<String>,
    pub metrics: Option<String>,
    pub logs: Option<String>,
    pub cluster_management: Option<String>,
    pub autoscaler: Option<String>,
}

/// Options for creating a CKE cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterCreateOptions {
    pub provider_id: String,
    pub template_id: String,
    pub name: String,
    pub environment: String,
    pub plugins: PluginSelection,
}

impl ClusterCreateOptions {
    pub fn new(
        provider_id: impl Into<String>,
        template_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            template_id: template_id.into(),
            name: name.into(),
            environment: E2E_ENVIRONMENT.to_string(),
            plugins: PluginSelection::default(),
        }
    }

    /// Fill unset plugins with `kind`'s defaults and validate the options
    pub fn default_and_validate(&mut self, kind: ProviderKind) -> Result<()> {
        Uuid::parse_str(&self.provider_id).map_err(|_| {
            CloudError::InvalidOptions(format!("provider id {:?} is not a UUID", self.provider_id))
        })?;
        Uuid::parse_str(&self.template_id).map_err(|_| {
            CloudError::InvalidOptions(format!("template id {:?} is not a UUID", self.template_id))
        })?;
        if self.name.trim().is_empty() {
            return Err(CloudError::InvalidOptions(
                "cluster name must not be empty".to_string(),
            ));
        }
        if self.environment.trim().is_empty() {
            return Err(CloudError::InvalidOptions(
                "environment must not be empty".to_string(),
            ));
        }

        let plugins = &mut self.plugins;
        fill(&mut plugins.cni, Some("calico"));
        fill(&mut plugins.csi, kind.default_csi());
        fill(&mut plugins.ccm, kind.default_ccm());
        fill(&mut plugins.metrics, Some("prometheus"));
        fill(&mut plugins.logs, Some("fluentd"));
        fill(&mut plugins.cluster_management, Some("containership"));
        fill(&mut plugins.autoscaler, Some("cerebral"));

        Ok(())
    }

    /// Build the create request
    pub fn into_request(self) -> CreateCkeClusterRequest {
        let labels = BTreeMap::from([
            (CLUSTER_NAME_LABEL.to_string(), self.name),
            (CLUSTER_ENVIRONMENT_LABEL.to_string(), self.environment),
        ]);

        let selection = [
            ("cni", self.plugins.cni),
            ("csi", self.plugins.csi),
            ("cloud_controller_manager", self.plugins.ccm),
            ("metrics", self.plugins.metrics),
            ("logs", self.plugins.logs),
            ("cluster_management", self.plugins.cluster_management),
            ("autoscaler", self.plugins.autoscaler),
        ];
        let plugins = selection
            .into_iter()
            .filter_map(|(plugin_type, implementation)| {
                implementation.map(|imp| PluginDefinition::new(plugin_type, &imp))
            })
            .collect();

        CreateCkeClusterRequest {
            provider_id: self.provider_id,
            template_id: self.template_id,
            labels,
            plugins,
        }
    }
}

fn fill(slot: &mut Option<String>, default: Option<&str>) {
    if slot.is_none() {
        *slot = default.map(str::to_string);
    }
}
