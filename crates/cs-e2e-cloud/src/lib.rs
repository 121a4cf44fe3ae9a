//! # cs-e2e-cloud
//!
//! Containership Cloud provision API client for the e2e harness:
//! - Templates, CKE clusters and node pools (`CloudClient`)
//! - Cluster create options with per-provider plugin defaults
//! - Watchers for cluster and node pool lifecycle states

pub mod client;
pub mod error;
pub mod options;
pub mod types;
pub mod wait;

pub use client::{CloudClient, CloudConfig};
pub use error::{CloudError, Result};
pub use options::{ClusterCreateOptions, PluginSelection, ProviderKind};
pub use types::{
    CkeCluster, CreateCkeClusterRequest, CreateTemplateRequest, NodePool, NodePoolScaleRequest,
    ResourceState, Template,
};
pub use wait::CloudWaiter;
