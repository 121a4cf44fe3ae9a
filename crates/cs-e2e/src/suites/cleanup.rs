//! Cleanup suite: delete the cluster and wait for it to disappear

use anyhow::{Context, Result};
use cs_e2e_core::WriteOnce;
use tracing::info;

use crate::context::HarnessContext;
use crate::runner::{SuiteRunner, SuiteSummary};
use crate::suites::discover_cluster_id;

struct CleanupRun<'a> {
    ctx: &'a HarnessContext,
    cluster_id: WriteOnce<String>,
}

impl CleanupRun<'_> {
    async fn discover(&self) -> Result<()> {
        let api = self.ctx.connect_kube().await?;
        self.cluster_id
            .set(discover_cluster_id(api.as_ref()).await?)?;
        Ok(())
    }

    async fn request_delete(&self) -> Result<()> {
        let cluster_id = self.cluster_id.get()?;
        self.ctx
            .cloud
            .provision()
            .cke_clusters(self.ctx.organization_id())
            .delete(cluster_id)
            .await
            .with_context(|| format!("Failed to delete cluster {cluster_id}"))?;
        info!(cluster_id = %cluster_id, "requested cluster deletion");
        Ok(())
    }

    async fn deleted(&self) -> Result<()> {
        let spec = self.ctx.config.polling.delete.spec();
        self.ctx
            .cloud_waiter()
            .cluster_deleted(self.cluster_id.get()?, spec)
            .await?;
        Ok(())
    }
}

/// Delete the cluster the kubeconfig points at
pub async fn run(ctx: &HarnessContext) -> Result<SuiteSummary> {
    let run = CleanupRun {
        ctx,
        cluster_id: WriteOnce::new("cluster_id"),
    };
    let mut runner = SuiteRunner::new("cleanup", "Cleaning up a cluster");

    runner
        .step("discover the cluster from Kubernetes", run.discover())
        .await?;
    runner
        .step("request DELETE", run.request_delete())
        .await?;
    runner
        .step("cluster is deleted in cloud", run.deleted())
        .await?;

    Ok(runner.finish())
}
