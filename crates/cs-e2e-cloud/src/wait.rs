//! Waiting on cluster and node pool state transitions
//!
//! Each wait pairs a pure classifier, which maps one API response to a
//! [`StatusOutcome`], with a `ConvergenceWatcher` that polls it. Transient
//! API errors keep the wait alive; any other error aborts it.

use cs_e2e_core::watch::{ConvergenceWatcherBuilder, TracingObserver, TransientOnly};
use cs_e2e_core::{is_not_found, ConvergenceError, PollSpec, StatusOutcome};
use tokio_util::sync::CancellationToken;

use crate::client::CloudClient;
use crate::error::{CloudError, Result};
use crate::types::{CkeCluster, NodePool, ResourceState};

/// Classify a cluster that should end up RUNNING
pub fn cluster_running_outcome(cluster: &CkeCluster) -> StatusOutcome {
    match cluster.state() {
        ResourceState::Running => StatusOutcome::Converged,
        ResourceState::Provisioning => StatusOutcome::Pending,
        other => StatusOutcome::failed(format!(
            "cluster entered unexpected state {:?}",
            other.as_str()
        )),
    }
}

/// Classify a cluster lookup while waiting for deletion to finish
///
/// A 404 means the cluster is gone.
pub fn cluster_deleted_outcome(lookup: Result<CkeCluster>) -> Result<StatusOutcome> {
    match lookup {
        Ok(cluster) => Ok(match cluster.state() {
            ResourceState::Running | ResourceState::Deleting => StatusOutcome::Pending,
            other => StatusOutcome::failed(format!(
                "cluster {:?} entered unexpected state {:?}",
                cluster.id,
                other.as_str()
            )),
        }),
        Err(err) if is_not_found(&err) => Ok(StatusOutcome::Converged),
        Err(err) => Err(err),
    }
}

/// Classify a node pool moving towards `target`, tolerating `pending`
pub fn node_pool_outcome(
    pool: &NodePool,
    target: &ResourceState,
    pending: &ResourceState,
) -> StatusOutcome {
    let state = pool.state();
    if state == target {
        StatusOutcome::Converged
    } else if state == pending {
        StatusOutcome::Pending
    } else {
        StatusOutcome::failed(format!(
            "node pool {:?} entered unexpected state {:?}",
            pool.id,
            state.as_str()
        ))
    }
}

/// Classify the full pool list of a cluster that should be RUNNING
pub fn all_pools_running_outcome(pools: &[NodePool]) -> StatusOutcome {
    let mut outcome = StatusOutcome::Converged;
    for pool in pools {
        match pool.state() {
            ResourceState::Running => {}
            ResourceState::Updating => outcome = StatusOutcome::Pending,
            other => {
                return StatusOutcome::failed(format!(
                    "node pool {:?} entered unexpected state {:?}",
                    pool.id,
                    other.as_str()
                ))
            }
        }
    }
    outcome
}

/// Waits on provision API resources of one organization
pub struct CloudWaiter<'a> {
    client: &'a CloudClient,
    organization_id: &'a str,
    cancel: Option<CancellationToken>,
}

impl<'a> CloudWaiter<'a> {
    pub fn new(client: &'a CloudClient, organization_id: &'a str) -> Self {
        Self {
            client,
            organization_id,
            cancel: None,
        }
    }

    /// Abort waits when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn builder(
        &self,
        spec: PollSpec,
        operation: &str,
    ) -> ConvergenceWatcherBuilder<TransientOnly, TracingObserver> {
        let builder = ConvergenceWatcherBuilder::new(spec)
            .with_predicate(TransientOnly)
            .with_observer(TracingObserver::new(operation));
        match &self.cancel {
            Some(token) => builder.with_cancellation(token.clone()),
            None => builder,
        }
    }

    /// Wait for a new cluster to report RUNNING
    pub async fn cluster_running(
        &self,
        cluster_id: &str,
        spec: PollSpec,
    ) -> std::result::Result<(), ConvergenceError> {
        let clusters = &self.client.provision().cke_clusters(self.organization_id);
        self.builder(spec, "cluster running")
            .build()
            .watch_fallible(move || async move {
                let cluster = clusters.get(cluster_id).await?;
                Ok::<_, CloudError>(cluster_running_outcome(&cluster))
            })
            .await
    }

    /// Wait for a deleted cluster to disappear
    pub async fn cluster_deleted(
        &self,
        cluster_id: &str,
        spec: PollSpec,
    ) -> std::result::Result<(), ConvergenceError> {
        let clusters = &self.client.provision().cke_clusters(self.organization_id);
        self.builder(spec, "cluster deleted")
            .build()
            .watch_fallible(move || async move {
                cluster_deleted_outcome(clusters.get(cluster_id).await)
            })
            .await
    }

    /// Wait for a node pool to reach `target`, tolerating `pending` meanwhile
    pub async fn node_pool_state(
        &self,
        cluster_id: &str,
        pool_id: &str,
        target: ResourceState,
        pending: ResourceState,
        spec: PollSpec,
    ) -> std::result::Result<(), ConvergenceError> {
        let pools = &self
            .client
            .provision()
            .node_pools(self.organization_id, cluster_id);
        let operation = format!("node pool {}", target.as_str().to_lowercase());
        let (target, pending) = (&target, &pending);
        self.builder(spec, &operation)
            .build()
            .watch_fallible(move || async move {
                let pool = pools.get(pool_id).await?;
                Ok::<_, CloudError>(node_pool_outcome(&pool, target, pending))
            })
            .await
    }

    /// Wait for a scaled node pool to start UPDATING
    pub async fn node_pool_updating(
        &self,
        cluster_id: &str,
        pool_id: &str,
        spec: PollSpec,
    ) -> std::result::Result<(), ConvergenceError> {
        self.node_pool_state(
            cluster_id,
            pool_id,
            ResourceState::Updating,
            ResourceState::Running,
            spec,
        )
        .await
    }

    /// Wait for an updating node pool to settle back to RUNNING
    pub async fn node_pool_running(
        &self,
        cluster_id: &str,
        pool_id: &str,
        spec: PollSpec,
    ) -> std::result::Result<(), ConvergenceError> {
        self.node_pool_state(
            cluster_id,
            pool_id,
            ResourceState::Running,
            ResourceState::Updating,
            spec,
        )
        .await
    }

    /// Wait for every node pool of a cluster to report RUNNING
    pub async fn all_node_pools_running(
        &self,
        cluster_id: &str,
        spec: PollSpec,
    ) -> std::result::Result<(), ConvergenceError> {
        let pools = &self
            .client
            .provision()
            .node_pools(self.organization_id, cluster_id);
        self.builder(spec, "all node pools running")
            .build()
            .watch_fallible(move || async move {
                let list = pools.list().await?;
                Ok::<_, CloudError>(all_pools_running_outcome(&list))
            })
            .await
    }
}
