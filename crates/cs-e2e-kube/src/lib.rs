//! # cs-e2e-kube
//!
//! Kubernetes side of the Containership e2e harness:
//! - `KubeApi`, the narrow slice of the Kubernetes API the suites use
//! - `KubeClient`, its implementation over `kube::Client`
//! - Node helpers (readiness, cluster id discovery, pool membership)
//! - Watchers for node readiness and API reachability

pub mod api;
pub mod client;
pub mod error;
pub mod nodes;
pub mod wait;

pub use api::KubeApi;
pub use client::KubeClient;
pub use error::{KubeError, Result};
pub use nodes::{
    cluster_id_from_nodes, count_pool_nodes, is_node_ready, CLUSTER_ID_LABEL, NODE_POOL_ID_LABEL,
};
pub use wait::KubeWaiter;
