//! The provision, scale and cleanup suites
//!
//! Each suite builds its own run state on top of the shared
//! `HarnessContext` and runs its steps through a `SuiteRunner`.

pub mod cleanup;
pub mod provision;
pub mod scale;

#[cfg(test)]
pub(crate) mod test_support;

use anyhow::{Context, Result};
use cs_e2e_kube::{cluster_id_from_nodes, KubeApi};
use tracing::info;

use crate::output;

/// Read the cluster id from the labels on the cluster's nodes
pub(crate) async fn discover_cluster_id(api: &dyn KubeApi) -> Result<String> {
    let cluster_id = cluster_id_from_nodes(api)
        .await
        .context("Failed to discover cluster id from Kubernetes nodes")?;
    info!(cluster_id = %cluster_id, "discovered cluster");
    output::kv("cluster", &cluster_id);
    Ok(cluster_id)
}
