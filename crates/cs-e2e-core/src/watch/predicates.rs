//! Predicates deciding whether a failed status check keeps the wait alive
//!
//! A check that returns `Err` is either transient (treated as `Pending`, the
//! watcher polls again) or permanent (treated as `Failed`, the wait aborts).
//! The watcher stays domain-agnostic by delegating that decision here.

use std::time::Duration;

use crate::classify::{is_auth_error, is_retryable, Classify};

/// A predicate that determines whether a check error should be retried
///
/// `elapsed` is the time since the wait started, which lets a predicate
/// bound how long a class of errors is tolerated.
///
/// # Example
///
/// ```rust
/// use std::io::{Error, ErrorKind};
/// use std::time::Duration;
/// use cs_e2e_core::watch::RetryPredicate;
///
/// struct IoRetryPredicate;
///
/// impl RetryPredicate<Error> for IoRetryPredicate {
///     fn should_retry(&self, error: &Error, _elapsed: Duration) -> bool {
///         matches!(error.kind(), ErrorKind::TimedOut | ErrorKind::ConnectionReset)
///     }
/// }
/// ```
pub trait RetryPredicate<E: ?Sized>: Send + Sync {
    /// Determine whether the given error should be retried
    fn should_retry(&self, error: &E, elapsed: Duration) -> bool;
}

/// Every error is transient
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl<E: ?Sized> RetryPredicate<E> for AlwaysRetry {
    fn should_retry(&self, _error: &E, _elapsed: Duration) -> bool {
        true
    }
}

/// Every error is permanent
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRetry;

impl<E: ?Sized> RetryPredicate<E> for NeverRetry {
    fn should_retry(&self, _error: &E, _elapsed: Duration) -> bool {
        false
    }
}

/// A predicate that uses a closure to determine retryability
pub struct ClosurePredicate<F> {
    predicate: F,
}

impl<F> ClosurePredicate<F> {
    /// Create a new closure-based predicate
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<E, F> RetryPredicate<E> for ClosurePredicate<F>
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn should_retry(&self, error: &E, _elapsed: Duration) -> bool {
        (self.predicate)(error)
    }
}

/// Retry errors classified as transient, abort on everything else
#[derive(Debug, Clone, Copy, Default)]
pub struct TransientOnly;

impl<E: Classify + ?Sized> RetryPredicate<E> for TransientOnly {
    fn should_retry(&self, error: &E, _elapsed: Duration) -> bool {
        is_retryable(error)
    }
}

/// Retry transient errors, and authorization errors during a grace window
///
/// Right after a cluster comes up its role bindings may not have propagated,
/// so authorization failures are expected for a while. Past `grace` they are
/// treated as a real permissions problem and abort the wait.
#[derive(Debug, Clone, Copy)]
pub struct TransientOrAuthWithin {
    grace: Duration,
}

impl TransientOrAuthWithin {
    /// Create a predicate tolerating authorization errors for `grace`
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }

    /// The authorization grace window
    pub fn grace(&self) -> Duration {
        self.grace
    }
}

impl<E: Classify + ?Sized> RetryPredicate<E> for TransientOrAuthWithin {
    fn should_retry(&self, error: &E, elapsed: Duration) -> bool {
        is_retryable(error) || (is_auth_error(error) && elapsed <= self.grace)
    }
}
