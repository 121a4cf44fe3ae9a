//! Convergence observation and logging
//!
//! This module provides the `WatchObserver` trait for monitoring the checks a
//! watcher performs and a `TracingObserver` that logs them with `tracing`.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Observer trait for convergence wait events
///
/// All methods except `on_check` have no-op defaults.
pub trait WatchObserver: Send + Sync {
    /// Called right before a check runs
    ///
    /// # Arguments
    ///
    /// * `attempt` - The check number (1-indexed)
    /// * `elapsed` - Time since the wait started
    fn on_check(&self, attempt: u32, elapsed: Duration);

    /// Called when a check reports an allowed intermediate state
    fn on_pending(&self, attempt: u32, elapsed: Duration) {
        let _ = (attempt, elapsed);
    }

    /// Called when a check fails with an error classified as transient
    fn on_transient_error(&self, attempt: u32, error: &str) {
        let _ = (attempt, error);
    }

    /// Called when the resource converged
    fn on_converged(&self, attempts: u32, elapsed: Duration) {
        let _ = (attempts, elapsed);
    }

    /// Called when the wait ends with a failure
    fn on_failed(&self, attempts: u32, reason: &str) {
        let _ = (attempts, reason);
    }

    /// Called when the deadline passed while still pending
    fn on_timeout(&self, attempts: u32, elapsed: Duration) {
        let _ = (attempts, elapsed);
    }

    /// Called when the wait is cancelled externally
    fn on_cancelled(&self, attempts: u32) {
        let _ = attempts;
    }
}

/// A no-op observer that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl WatchObserver for NoOpObserver {
    fn on_check(&self, _attempt: u32, _elapsed: Duration) {}
}

/// An observer that logs wait events using the `tracing` crate
///
/// # Log Levels
///
/// - `on_check` / `on_pending`: TRACE / DEBUG
/// - `on_transient_error`: WARN
/// - `on_converged`: INFO
/// - `on_failed` / `on_timeout`: ERROR
/// - `on_cancelled`: WARN
#[derive(Debug, Clone)]
pub struct TracingObserver {
    operation: String,
}

impl TracingObserver {
    /// Create a new tracing observer
    ///
    /// # Arguments
    ///
    /// * `operation` - What is being waited on, e.g. "cluster running"
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    /// Get the operation name
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("convergence")
    }
}

impl WatchObserver for TracingObserver {
    fn on_check(&self, attempt: u32, elapsed: Duration) {
        tracing::trace!(
            operation = %self.operation,
            attempt = attempt,
            elapsed_ms = elapsed.as_millis() as u64,
            "checking status"
        );
    }

    fn on_pending(&self, attempt: u32, elapsed: Duration) {
        tracing::debug!(
            operation = %self.operation,
            attempt = attempt,
            elapsed_ms = elapsed.as_millis() as u64,
            "still pending"
        );
    }

    fn on_transient_error(&self, attempt: u32, error: &str) {
        tracing::warn!(
            operation = %self.operation,
            attempt = attempt,
            error = %error,
            "status check failed with transient error, will retry"
        );
    }

    fn on_converged(&self, attempts: u32, elapsed: Duration) {
        tracing::info!(
            operation = %self.operation,
            attempts = attempts,
            elapsed_ms = elapsed.as_millis() as u64,
            "converged"
        );
    }

    fn on_failed(&self, attempts: u32, reason: &str) {
        tracing::error!(
            operation = %self.operation,
            attempts = attempts,
            reason = %reason,
            "wait failed"
        );
    }

    fn on_timeout(&self, attempts: u32, elapsed: Duration) {
        tracing::error!(
            operation = %self.operation,
            attempts = attempts,
            elapsed_ms = elapsed.as_millis() as u64,
            "timed out waiting for convergence"
        );
    }

    fn on_cancelled(&self, attempts: u32) {
        tracing::warn!(
            operation = %self.operation,
            attempts = attempts,
            "wait cancelled"
        );
    }
}

/// An observer that counts wait events
///
/// Useful for testing.
#[derive(Debug, Default)]
pub struct StatsObserver {
    checks: AtomicU32,
    pendings: AtomicU32,
    transient_errors: AtomicU32,
    convergences: AtomicU32,
    failures: AtomicU32,
    timeouts: AtomicU32,
    cancellations: AtomicU32,
}

impl StatsObserver {
    /// Create a new stats observer
    pub fn new() -> Self {
        Self::default()
    }

    pub fn checks(&self) -> u32 {
        self.checks.load(Ordering::SeqCst)
    }

    pub fn pendings(&self) -> u32 {
        self.pendings.load(Ordering::SeqCst)
    }

    pub fn transient_errors(&self) -> u32 {
        self.transient_errors.load(Ordering::SeqCst)
    }

    pub fn convergences(&self) -> u32 {
        self.convergences.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn timeouts(&self) -> u32 {
        self.timeouts.load(Ordering::SeqCst)
    }

    pub fn cancellations(&self) -> u32 {
        self.cancellations.load(Ordering::SeqCst)
    }
}

impl WatchObserver for StatsObserver {
    fn on_check(&self, _attempt: u32, _elapsed: Duration) {
        self.checks.fetch_add(1, Ordering::SeqCst);
    }

    fn on_pending(&self, _attempt: u32, _elapsed: Duration) {
        self.pendings.fetch_add(1, Ordering::SeqCst);
    }

    fn on_transient_error(&self, _attempt: u32, _error: &str) {
        self.transient_errors.fetch_add(1, Ordering::SeqCst);
    }

    fn on_converged(&self, _attempts: u32, _elapsed: Duration) {
        self.convergences.fetch_add(1, Ordering::SeqCst);
    }

    fn on_failed(&self, _attempts: u32, _reason: &str) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    fn on_timeout(&self, _attempts: u32, _elapsed: Duration) {
        self.timeouts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_cancelled(&self, _attempts: u32) {
        self.cancellations.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T: WatchObserver + ?Sized> WatchObserver for std::sync::Arc<T> {
    fn on_check(&self, attempt: u32, elapsed: Duration) {
        (**self).on_check(attempt, elapsed)
    }

    fn on_pending(&self, attempt: u32, elapsed: Duration) {
        (**self).on_pending(attempt, elapsed)
    }

    fn on_transient_error(&self, attempt: u32, error: &str) {
        (**self).on_transient_error(attempt, error)
    }

    fn on_converged(&self, attempts: u32, elapsed: Duration) {
        (**self).on_converged(attempts, elapsed)
    }

    fn on_failed(&self, attempts: u32, reason: &str) {
        (**self).on_failed(attempts, reason)
    }

    fn on_timeout(&self, attempts: u32, elapsed: Duration) {
        (**self).on_timeout(attempts, elapsed)
    }

    fn on_cancelled(&self, attempts: u32) {
        (**self).on_cancelled(attempts)
    }
}
