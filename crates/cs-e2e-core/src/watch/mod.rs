//! Asynchronous resource convergence watcher
//!
//! Every suite needs the same "poll until X, bail on Y, give up after Z"
//! shape: wait for a cluster to report `RUNNING`, for a node pool to leave
//! `UPDATING`, for every Kubernetes node to be `Ready`, for the API server to
//! answer. This module implements that shape once, over a caller supplied
//! status check returning a [`StatusOutcome`].
//!
//! # Features
//!
//! - Fixed-interval polling with an optional immediate first check
//! - Distinct terminal errors: `Failed` (unexpected state), `Timeout`
//!   (still pending at the deadline) and `Cancelled` (external abort)
//! - Fallible checks whose errors are classified by a `RetryPredicate`
//!   (transient errors keep polling, permanent errors abort)
//! - Observable checks via the `WatchObserver` trait, with a built-in
//!   `TracingObserver` for logging
//! - Optional `CancellationToken` so long-running waits can be aborted
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use cs_e2e_core::watch::{await_convergence, ConvergenceError, PollSpec, StatusOutcome};
//!
//! async fn example() -> Result<(), ConvergenceError> {
//!     let spec = PollSpec::new(Duration::from_millis(500), Duration::from_secs(300));
//!
//!     await_convergence(&spec, || async {
//!         // Query the resource and classify its status here
//!         StatusOutcome::Converged
//!     })
//!     .await
//! }
//! ```

mod error;
mod observer;
mod predicates;
mod watcher;

pub use error::ConvergenceError;
pub use observer::{NoOpObserver, StatsObserver, TracingObserver, WatchObserver};
pub use predicates::{
    AlwaysRetry, ClosurePredicate, NeverRetry, RetryPredicate, TransientOnly,
    TransientOrAuthWithin,
};
pub use watcher::{await_convergence, ConvergenceWatcher, ConvergenceWatcherBuilder};

use std::time::Duration;

/// Configuration for one convergence wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSpec {
    /// Minimum spacing between two checks
    pub interval: Duration,
    /// Maximum wall-clock time before giving up
    pub timeout: Duration,
    /// Perform the first check without waiting one interval first
    pub immediate: bool,
}

impl PollSpec {
    /// Create a spec that checks immediately, then every `interval`
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout,
            immediate: true,
        }
    }

    /// Set whether the first check happens immediately
    pub const fn with_immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }
}

/// The tri-state result of one status check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutcome {
    /// The resource reached the desired terminal state
    Converged,
    /// The resource is in an allowed intermediate state
    Pending,
    /// The resource is in a state outside the expected transitions, or the
    /// check failed unrecoverably
    Failed(String),
}

impl StatusOutcome {
    /// Create a failed outcome
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }

    /// Whether this outcome ends the wait
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}
