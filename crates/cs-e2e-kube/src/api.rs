//! The Kubernetes operations the suites depend on

use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Pod};

use crate::error::Result;

/// Read-only access to nodes and pods
///
/// Kept narrow so suites and watchers can run against an in-memory fake.
#[async_trait]
pub trait KubeApi: Send + Sync {
    /// List nodes, optionally filtered by a label selector (`key=value`)
    async fn list_nodes(&self, label_selector: Option<&str>) -> Result<Vec<Node>>;

    /// List pods in a namespace
    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>>;
}

#[async_trait]
impl<T: KubeApi + ?Sized> KubeApi for Arc<T> {
    async fn list_nodes(&self, label_selector: Option<&str>) -> Result<Vec<Node>> {
        (**self).list_nodes(label_selector).await
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>> {
        (**self).list_pods(namespace).await
    }
}
