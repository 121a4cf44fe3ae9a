//! Template rendering for infrastructure templates and kubeconfigs
//!
//! Infrastructure templates are user-supplied Tera files that become the
//! body of a template create request. The kubeconfig template is embedded
//! and points `kubectl`-compatible clients at the Containership API proxy.

use std::fs;

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tera::{Context, Tera};
use tracing::debug;

use crate::error::{Error, Result};

const KUBECONFIG_TEMPLATE: &str = include_str!("kubeconfig.yaml.tera");

/// Values available to an infrastructure template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfraTemplateValues {
    pub master_kubernetes_version: String,
    pub worker_kubernetes_version: String,
    pub description: String,
    pub timestamp: String,
    pub ssh_public_key: String,
}

impl InfraTemplateValues {
    /// Values for a cluster where every pool runs `kubernetes_version`
    pub fn for_version(
        kubernetes_version: &str,
        ssh_public_key: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            master_kubernetes_version: kubernetes_version.to_string(),
            worker_kubernetes_version: kubernetes_version.to_string(),
            description: format!("e2e-{kubernetes_version}"),
            timestamp: timestamp(now),
            ssh_public_key: ssh_public_key.into(),
        }
    }
}

/// Format a time as `YYYYMMDDhhmmss`
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

/// Render an infrastructure template file
pub fn render_infra_template(path: &Utf8Path, values: &InfraTemplateValues) -> Result<String> {
    debug!(template = %path, "rendering infrastructure template");
    let content = fs::read_to_string(path)?;
    let context = Context::from_serialize(values).map_err(|e| Error::template(&e))?;
    Tera::one_off(&content, &context, false).map_err(|e| Error::template(&e))
}

/// Values for the generated kubeconfig
#[derive(Debug, Clone, Serialize)]
pub struct KubeconfigValues {
    pub proxy_url: String,
    pub organization_id: String,
    pub cluster_id: String,
    pub token: String,
}

impl KubeconfigValues {
    pub fn new(
        proxy_url: &str,
        organization_id: impl Into<String>,
        cluster_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            proxy_url: proxy_url.trim_end_matches('/').to_string(),
            organization_id: organization_id.into(),
            cluster_id: cluster_id.into(),
            token: token.into(),
        }
    }
}

/// Render the kubeconfig for a cluster
pub fn render_kubeconfig(values: &KubeconfigValues) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template("kubeconfig", KUBECONFIG_TEMPLATE)
        .map_err(|e| Error::template(&e))?;
    let context = Context::from_serialize(values).map_err(|e| Error::template(&e))?;
    tera.render("kubeconfig", &context)
        .map_err(|e| Error::template(&e))
}

/// Render the kubeconfig and write it to `path`, replacing any existing file
pub fn write_kubeconfig(path: &Utf8Path, values: &KubeconfigValues) -> Result<()> {
    let rendered = render_kubeconfig(values)?;
    if let Some(parent) = path.parent() {
        if !parent.as_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, rendered)?;
    debug!(path = %path, cluster_id = %values.cluster_id, "wrote kubeconfig");
    Ok(())
}
