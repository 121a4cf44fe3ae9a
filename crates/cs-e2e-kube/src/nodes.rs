//! Node helpers

use k8s_openapi::api::core::v1::Node;

use crate::api::KubeApi;
use crate::error::{KubeError, Result};

/// Label carrying the Containership cluster id on every node
pub const CLUSTER_ID_LABEL: &str = "containership.io/cluster-id";
/// Label carrying the id of the node pool a node belongs to
pub const NODE_POOL_ID_LABEL: &str = "containership.io/node-pool-id";

/// Whether the node's `Ready` condition is `True`
pub fn is_node_ready(node: &Node) -> bool {
    node.status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
}

fn node_name(node: &Node) -> &str {
    node.metadata.name.as_deref().unwrap_or("<unnamed>")
}

/// Discover the cluster id from the labels of any node
pub async fn cluster_id_from_nodes(api: &dyn KubeApi) -> Result<String> {
    let nodes = api.list_nodes(None).await?;
    let node = nodes.first().ok_or(KubeError::NoNodes)?;

    node.metadata
        .labels
        .as_ref()
        .and_then(|labels| labels.get(CLUSTER_ID_LABEL))
        .cloned()
        .ok_or_else(|| KubeError::MissingLabel {
            node: node_name(node).to_string(),
            label: CLUSTER_ID_LABEL,
        })
}

/// Label selector matching the nodes of one pool
pub fn pool_selector(pool_id: &str) -> String {
    format!("{NODE_POOL_ID_LABEL}={pool_id}")
}

/// Count the nodes belonging to a node pool
pub async fn count_pool_nodes(api: &dyn KubeApi, pool_id: &str) -> Result<usize> {
    let selector = pool_selector(pool_id);
    Ok(api.list_nodes(Some(&selector)).await?.len())
}
