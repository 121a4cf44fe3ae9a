//! `KubeApi` over a real cluster

use std::time::Duration;

use async_trait::async_trait;
use camino::Utf8Path;
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

use crate::api::KubeApi;
use crate::error::{KubeError, Result};

/// Kubernetes client built from a kubeconfig file
#[derive(Clone)]
pub struct KubeClient {
    client: Client,
}

impl KubeClient {
    /// Build a client from the kubeconfig at `path`, using its current context
    pub async fn from_kubeconfig(path: &Utf8Path, timeout: Duration) -> Result<Self> {
        let kubeconfig_error = |message: String| KubeError::Kubeconfig {
            path: path.to_string(),
            message,
        };

        let kubeconfig =
            Kubeconfig::read_from(path.as_std_path()).map_err(|e| kubeconfig_error(e.to_string()))?;
        let mut config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|e| kubeconfig_error(e.to_string()))?;
        config.connect_timeout = Some(timeout);
        config.read_timeout = Some(timeout);

        debug!(kubeconfig = %path, server = %config.cluster_url, "creating Kubernetes client");
        let client = Client::try_from(config).map_err(KubeError::from)?;

        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl KubeApi for KubeClient {
    async fn list_nodes(&self, label_selector: Option<&str>) -> Result<Vec<Node>> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let params = match label_selector {
            Some(selector) => ListParams::default().labels(selector),
            None => ListParams::default(),
        };
        Ok(nodes.list(&params).await?.items)
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        Ok(pods.list(&ListParams::default()).await?.items)
    }
}
