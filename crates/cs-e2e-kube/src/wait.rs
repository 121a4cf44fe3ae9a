//! Waiting on Kubernetes readiness

use std::time::Duration;

use cs_e2e_core::watch::{
    ConvergenceWatcherBuilder, RetryPredicate, TracingObserver, TransientOnly,
    TransientOrAuthWithin,
};
use cs_e2e_core::{ConvergenceError, PollSpec, StatusOutcome};
use k8s_openapi::api::core::v1::Node;
use tokio_util::sync::CancellationToken;

use crate::api::KubeApi;
use crate::error::KubeError;
use crate::nodes::is_node_ready;

/// Namespace listed to probe API server health
pub const API_PROBE_NAMESPACE: &str = "default";

/// Default window during which authorization errors are tolerated
pub const DEFAULT_AUTH_GRACE: Duration = Duration::from_secs(120);

/// Classify a node list that should be entirely Ready
///
/// An empty list is pending: a cluster whose nodes have not registered yet
/// is not ready.
pub fn nodes_ready_outcome(nodes: &[Node]) -> StatusOutcome {
    if !nodes.is_empty() && nodes.iter().all(is_node_ready) {
        StatusOutcome::Converged
    } else {
        StatusOutcome::Pending
    }
}

/// Waits on the Kubernetes API of one cluster
pub struct KubeWaiter<'a> {
    api: &'a dyn KubeApi,
    auth_grace: Duration,
    cancel: Option<CancellationToken>,
}

impl<'a> KubeWaiter<'a> {
    pub fn new(api: &'a dyn KubeApi) -> Self {
        Self {
            api,
            auth_grace: DEFAULT_AUTH_GRACE,
            cancel: None,
        }
    }

    /// Tolerate authorization errors for `grace` while probing the API
    pub fn with_auth_grace(mut self, grace: Duration) -> Self {
        self.auth_grace = grace;
        self
    }

    /// Abort waits when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn builder<P>(
        &self,
        spec: PollSpec,
        predicate: P,
        operation: &str,
    ) -> ConvergenceWatcherBuilder<P, TracingObserver>
    where
        P: RetryPredicate<KubeError>,
    {
        let builder = ConvergenceWatcherBuilder::new(spec)
            .with_predicate(predicate)
            .with_observer(TracingObserver::new(operation));
        match &self.cancel {
            Some(token) => builder.with_cancellation(token.clone()),
            None => builder,
        }
    }

    /// Wait until every node reports Ready
    pub async fn nodes_ready(&self, spec: PollSpec) -> Result<(), ConvergenceError> {
        let api = self.api;
        self.builder(spec, TransientOnly, "nodes ready")
            .build()
            .watch_fallible(move || async move {
                let nodes = api.list_nodes(None).await?;
                Ok::<_, KubeError>(nodes_ready_outcome(&nodes))
            })
            .await
    }

    /// Wait until the API server answers a pod list in `default`
    ///
    /// Right after provisioning the API proxy may reject the token until
    /// role bindings sync, so authorization errors are retried within the
    /// grace window.
    pub async fn api_ready(&self, spec: PollSpec) -> Result<(), ConvergenceError> {
        let api = self.api;
        self.builder(
            spec,
            TransientOrAuthWithin::new(self.auth_grace),
            "kubernetes api ready",
        )
        .build()
        .watch_fallible(move || async move {
            api.list_pods(API_PROBE_NAMESPACE).await?;
            Ok::<_, KubeError>(StatusOutcome::Converged)
        })
        .await
    }
}
