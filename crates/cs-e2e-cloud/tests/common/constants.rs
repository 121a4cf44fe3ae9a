//! Shared identifiers for provision API tests

pub const ORG_ID: &str = "62e4e86f-fe2e-4740-a814-a950bf377daf";
pub const CLUSTER_ID: &str = "5d3c1b8e-0e47-4a5a-9d4b-3f0c2b1e7a90";
pub const TEMPLATE_ID: &str = "a8b7a1d2-64de-4f0e-8a45-0f3f2b8c9e10";
pub const PROVIDER_ID: &str = "3b9e4f3c-7c59-4c50-9d5f-6f2fbc1a6d11";
pub const MASTER_POOL_ID: &str = "np-master";
pub const WORKER_POOL_ID: &str = "np-worker";

pub const TOKEN: &str = "test-token";
