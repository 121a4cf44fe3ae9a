//! Scale suite: grow a worker node pool by one node, then shrink it back

use std::sync::Arc;

use anyhow::{anyhow, ensure, Context, Result};
use cs_e2e_cloud::{NodePool, NodePoolScaleRequest};
use cs_e2e_core::WriteOnce;
use cs_e2e_kube::{count_pool_nodes, KubeApi};
use tracing::info;

use crate::context::HarnessContext;
use crate::output;
use crate::runner::{SuiteRunner, SuiteSummary};
use crate::suites::discover_cluster_id;

struct ScaleRun<'a> {
    ctx: &'a HarnessContext,
    kube: WriteOnce<Arc<dyn KubeApi>>,
    cluster_id: WriteOnce<String>,
    /// Pool scaled up and back down across steps
    node_pool_id: WriteOnce<String>,
}

impl<'a> ScaleRun<'a> {
    fn new(ctx: &'a HarnessContext) -> Self {
        Self {
            ctx,
            kube: WriteOnce::new("kubernetes_client"),
            cluster_id: WriteOnce::new("cluster_id"),
            node_pool_id: WriteOnce::new("node_pool_id"),
        }
    }

    async fn connect(&self) -> Result<()> {
        let api = self.ctx.connect_kube().await?;
        let cluster_id = discover_cluster_id(api.as_ref()).await?;
        self.kube.set(api)?;
        self.cluster_id.set(cluster_id)?;
        Ok(())
    }

    async fn current_pool(&self) -> Result<NodePool> {
        let pool_id = self.node_pool_id.get()?;
        self.ctx
            .cloud
            .provision()
            .node_pools(self.ctx.organization_id(), self.cluster_id.get()?)
            .get(pool_id)
            .await
            .with_context(|| format!("Failed to get node pool {pool_id}"))
    }

    async fn scale_to(&self, pool_id: &str, target: u32) -> Result<()> {
        let scaled = self
            .ctx
            .cloud
            .provision()
            .node_pools(self.ctx.organization_id(), self.cluster_id.get()?)
            .scale(pool_id, &NodePoolScaleRequest { count: target })
            .await
            .with_context(|| format!("Failed to scale node pool {pool_id} to {target}"))?;

        ensure!(
            scaled.count == target,
            "node pool {pool_id} reports count {} after requesting {target}",
            scaled.count
        );
        info!(node_pool_id = %pool_id, count = target, "requested scale");
        Ok(())
    }

    async fn scale_up(&self) -> Result<()> {
        let cluster_id = self.cluster_id.get()?;
        let pools = self
            .ctx
            .cloud
            .provision()
            .node_pools(self.ctx.organization_id(), cluster_id)
            .list()
            .await
            .context("Failed to list node pools")?;

        // Any worker pool will do
        let pool = pools
            .into_iter()
            .find(NodePool::is_worker)
            .ok_or_else(|| anyhow!("cluster {cluster_id} has no worker node pool"))?;
        output::kv("node pool", &pool.id);

        let target = pool
            .count
            .checked_add(1)
            .ok_or_else(|| anyhow!("node pool {} cannot grow past {}", pool.id, pool.count))?;
        self.node_pool_id.set(pool.id.clone())?;
        self.scale_to(&pool.id, target).await
    }

    async fn scale_down(&self) -> Result<()> {
        let pool = self.current_pool().await?;
        let target = pool
            .count
            .checked_sub(1)
            .ok_or_else(|| anyhow!("node pool {} has no nodes to remove", pool.id))?;
        self.scale_to(&pool.id, target).await
    }

    async fn pool_updating(&self) -> Result<()> {
        let spec = self.ctx.config.polling.default.spec();
        self.ctx
            .cloud_waiter()
            .node_pool_updating(self.cluster_id.get()?, self.node_pool_id.get()?, spec)
            .await?;
        Ok(())
    }

    async fn pool_running(&self) -> Result<()> {
        let spec = self.ctx.config.polling.default.spec();
        self.ctx
            .cloud_waiter()
            .node_pool_running(self.cluster_id.get()?, self.node_pool_id.get()?, spec)
            .await?;
        Ok(())
    }

    async fn nodes_match_pool(&self) -> Result<()> {
        let api = self.kube.get()?.as_ref();
        let pool = self.current_pool().await?;

        let nodes = count_pool_nodes(api, &pool.id)
            .await
            .context("Failed to list node pool nodes")?;
        ensure!(
            nodes == pool.count as usize,
            "node pool {} has {nodes} Kubernetes nodes, expected {}",
            pool.id,
            pool.count
        );

        let spec = self.ctx.config.polling.default.spec();
        self.ctx.kube_waiter(api).nodes_ready(spec).await?;
        Ok(())
    }
}

/// Scale a worker pool up by one and back down, checking nodes each time
pub async fn run(ctx: &HarnessContext) -> Result<SuiteSummary> {
    let run = ScaleRun::new(ctx);
    let mut runner = SuiteRunner::new("scale", "Scaling a worker node pool");

    runner
        .step("discover the cluster from Kubernetes", run.connect())
        .await?;
    runner
        .step("request to scale up by one", run.scale_up())
        .await?;
    runner
        .step("node pool goes into UPDATING", run.pool_updating())
        .await?;
    runner
        .step("node pool returns to RUNNING", run.pool_running())
        .await?;
    runner
        .step("all Kubernetes nodes are ready", run.nodes_match_pool())
        .await?;
    runner
        .step("request to scale down by one", run.scale_down())
        .await?;
    // A scale down can finish before UPDATING is ever observed
    runner
        .step("node pool returns to RUNNING", run.pool_running())
        .await?;
    runner
        .step("all Kubernetes nodes are ready", run.nodes_match_pool())
        .await?;

    Ok(runner.finish())
}
