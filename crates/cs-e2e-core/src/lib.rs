//! # cs-e2e-core
//!
//! Core library for the Containership e2e harness providing:
//! - The convergence watcher used to wait on cluster, node pool and
//!   Kubernetes state transitions
//! - Error classification (transient vs. authorization vs. fatal)
//! - Harness configuration (endpoints, organization, poll timings)
//! - Write-once cells for values discovered during a suite run
//! - Template rendering for infrastructure templates and kubeconfigs

pub mod classify;
pub mod config;
pub mod context;
pub mod error;
pub mod templates;
pub mod watch;

pub use classify::{is_auth_error, is_not_found, is_retryable, Classify, ErrorClass};
pub use config::{ConfigLoader, HarnessConfig};
pub use context::WriteOnce;
pub use error::{Error, Result};
pub use watch::{await_convergence, ConvergenceError, PollSpec, StatusOutcome};
