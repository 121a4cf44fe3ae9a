//! Run context shared by the suites
//!
//! `HarnessContext` holds the collaborators every suite needs and is never
//! mutated after construction. Values a suite discovers while running live
//! in its own `WriteOnce` cells.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cs_e2e_cloud::{CloudClient, CloudConfig, CloudWaiter};
use cs_e2e_core::HarnessConfig;
use cs_e2e_kube::{KubeApi, KubeClient, KubeWaiter};
use tokio_util::sync::CancellationToken;

use crate::cli::EnvArgs;

/// Opens a Kubernetes API connection from a kubeconfig file
#[async_trait]
pub trait KubeConnector: Send + Sync {
    async fn connect(&self, kubeconfig: &Utf8Path) -> Result<Arc<dyn KubeApi>>;
}

/// Connects with the `kube` client
pub struct KubeconfigConnector {
    timeout: Duration,
}

impl KubeconfigConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl KubeConnector for KubeconfigConnector {
    async fn connect(&self, kubeconfig: &Utf8Path) -> Result<Arc<dyn KubeApi>> {
        let client = KubeClient::from_kubeconfig(kubeconfig, self.timeout)
            .await
            .with_context(|| format!("Failed to build Kubernetes client from {kubeconfig}"))?;
        Ok(Arc::new(client))
    }
}

/// Immutable collaborators for one suite run
pub struct HarnessContext {
    pub config: HarnessConfig,
    pub cloud: CloudClient,
    pub token: String,
    pub kubeconfig: Utf8PathBuf,
    pub cancel: CancellationToken,
    connector: Box<dyn KubeConnector>,
}

impl HarnessContext {
    pub fn new(
        config: HarnessConfig,
        env: &EnvArgs,
        debug: bool,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let endpoints = &config.endpoints;
        let cloud = CloudClient::new(CloudConfig {
            token: env.token.clone(),
            provision_base_url: endpoints.provision_url.clone(),
            debug,
            timeout: config.http_timeout(),
        })
        .context("Failed to create Containership Cloud client")?;
        let connector = Box::new(KubeconfigConnector::new(config.http_timeout()));

        Ok(Self {
            config,
            cloud,
            token: env.token.clone(),
            kubeconfig: env.kubeconfig.clone(),
            cancel,
            connector,
        })
    }

    /// Replace how Kubernetes connections are opened
    pub fn with_connector(mut self, connector: impl KubeConnector + 'static) -> Self {
        self.connector = Box::new(connector);
        self
    }

    pub fn organization_id(&self) -> &str {
        &self.config.organization_id
    }

    /// Connect to the cluster the kubeconfig points at
    pub async fn connect_kube(&self) -> Result<Arc<dyn KubeApi>> {
        self.connector.connect(&self.kubeconfig).await
    }

    pub fn cloud_waiter(&self) -> CloudWaiter<'_> {
        CloudWaiter::new(&self.cloud, self.organization_id()).with_cancellation(self.cancel.clone())
    }

    pub fn kube_waiter<'a>(&'a self, api: &'a dyn KubeApi) -> KubeWaiter<'a> {
        KubeWaiter::new(api)
            .with_auth_grace(self.config.auth_grace())
            .with_cancellation(self.cancel.clone())
    }
}
