//! Convergence watcher
//!
//! This module provides the polling loop with configurable spec, predicate,
//! observer and cancellation.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::ConvergenceError;
use super::observer::{NoOpObserver, WatchObserver};
use super::predicates::{NeverRetry, RetryPredicate};
use super::{PollSpec, StatusOutcome};

/// Wait until `check` reports `Converged`
///
/// This is a convenience function for checks that classify their own
/// errors. For fallible checks, observers or cancellation use
/// `ConvergenceWatcherBuilder`.
///
/// # Arguments
///
/// * `spec` - Interval, timeout and immediate-start settings
/// * `check` - A closure returning a future that samples the resource once
///
/// # Returns
///
/// `Ok(())` once converged, or the `ConvergenceError` that ended the wait.
pub async fn await_convergence<F, Fut>(spec: &PollSpec, check: F) -> Result<(), ConvergenceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StatusOutcome>,
{
    ConvergenceWatcher::new(*spec).watch(check).await
}

/// Builder for configuring a `ConvergenceWatcher`
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use cs_e2e_core::watch::{ConvergenceWatcherBuilder, PollSpec, TracingObserver, TransientOnly};
///
/// let watcher = ConvergenceWatcherBuilder::new(PollSpec::new(
///     Duration::from_secs(1),
///     Duration::from_secs(1800),
/// ))
/// .with_predicate(TransientOnly)
/// .with_observer(TracingObserver::new("cluster running"))
/// .build();
/// ```
pub struct ConvergenceWatcherBuilder<P = NeverRetry, O = NoOpObserver> {
    spec: PollSpec,
    predicate: P,
    observer: O,
    cancel: Option<CancellationToken>,
}

impl ConvergenceWatcherBuilder<NeverRetry, NoOpObserver> {
    /// Create a new builder; check errors abort the wait by default
    pub fn new(spec: PollSpec) -> Self {
        Self {
            spec,
            predicate: NeverRetry,
            observer: NoOpObserver,
            cancel: None,
        }
    }
}

impl<P, O> ConvergenceWatcherBuilder<P, O> {
    /// Replace the poll spec
    pub fn with_spec(mut self, spec: PollSpec) -> Self {
        self.spec = spec;
        self
    }

    /// Set the predicate classifying check errors
    pub fn with_predicate<P2>(self, predicate: P2) -> ConvergenceWatcherBuilder<P2, O> {
        ConvergenceWatcherBuilder {
            spec: self.spec,
            predicate,
            observer: self.observer,
            cancel: self.cancel,
        }
    }

    /// Set the observer
    pub fn with_observer<O2>(self, observer: O2) -> ConvergenceWatcherBuilder<P, O2> {
        ConvergenceWatcherBuilder {
            spec: self.spec,
            predicate: self.predicate,
            observer,
            cancel: self.cancel,
        }
    }

    /// Abort the wait when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Build the watcher
    pub fn build(self) -> ConvergenceWatcher<P, O> {
        ConvergenceWatcher {
            spec: self.spec,
            predicate: self.predicate,
            observer: self.observer,
            cancel: self.cancel,
        }
    }
}

/// Polls a status check until it converges, fails, times out or is cancelled
///
/// Use `ConvergenceWatcherBuilder` for anything beyond the defaults.
pub struct ConvergenceWatcher<P = NeverRetry, O = NoOpObserver> {
    spec: PollSpec,
    predicate: P,
    observer: O,
    cancel: Option<CancellationToken>,
}

impl ConvergenceWatcher<NeverRetry, NoOpObserver> {
    /// Create a watcher with no observer, no cancellation and fatal errors
    pub fn new(spec: PollSpec) -> Self {
        ConvergenceWatcherBuilder::new(spec).build()
    }
}

/// One sample of the watched resource
enum Sample {
    Outcome(StatusOutcome),
    Transient(String),
}

impl<P, O> ConvergenceWatcher<P, O>
where
    O: WatchObserver,
{
    /// The poll spec this watcher uses
    pub fn spec(&self) -> &PollSpec {
        &self.spec
    }

    /// Wait on a check that classifies its own errors
    pub async fn watch<F, Fut>(&self, mut check: F) -> Result<(), ConvergenceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StatusOutcome>,
    {
        self.run(|_elapsed| {
            let fut = check();
            async move { Sample::Outcome(fut.await) }
        })
        .await
    }

    /// Wait on a check that may fail
    ///
    /// Errors the predicate accepts are treated as `Pending`; all others end
    /// the wait as `Failed` with the error's message as the reason.
    pub async fn watch_fallible<F, Fut, E>(&self, mut check: F) -> Result<(), ConvergenceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<StatusOutcome, E>>,
        E: fmt::Display,
        P: RetryPredicate<E>,
    {
        let predicate = &self.predicate;
        self.run(|elapsed| {
            let fut = check();
            async move {
                match fut.await {
                    Ok(outcome) => Sample::Outcome(outcome),
                    Err(err) if predicate.should_retry(&err, elapsed) => {
                        Sample::Transient(err.to_string())
                    }
                    Err(err) => Sample::Outcome(StatusOutcome::Failed(err.to_string())),
                }
            }
        })
        .await
    }

    async fn run<S, SFut>(&self, mut sample: S) -> Result<(), ConvergenceError>
    where
        S: FnMut(Duration) -> SFut,
        SFut: Future<Output = Sample>,
    {
        let start = Instant::now();
        let mut attempts: u32 = 0;
        let mut last_error: Option<String> = None;
        // Offset of the next check from `start`, never past the timeout
        let mut offset = if self.spec.immediate {
            Duration::ZERO
        } else {
            self.spec.interval.min(self.spec.timeout)
        };

        loop {
            let Some(scheduled) = start.checked_add(offset) else {
                return Err(self.timed_out(attempts, start, last_error));
            };
            if !self.pause_until(scheduled).await {
                self.observer.on_cancelled(attempts);
                return Err(ConvergenceError::Cancelled { attempts });
            }

            attempts += 1;
            let elapsed = start.elapsed();
            self.observer.on_check(attempts, elapsed);

            let Some(sampled) = self.cancellable(sample(elapsed)).await else {
                self.observer.on_cancelled(attempts);
                return Err(ConvergenceError::Cancelled { attempts });
            };

            match sampled {
                Sample::Outcome(StatusOutcome::Converged) => {
                    self.observer.on_converged(attempts, start.elapsed());
                    return Ok(());
                }
                Sample::Outcome(StatusOutcome::Failed(reason)) => {
                    self.observer.on_failed(attempts, &reason);
                    return Err(ConvergenceError::Failed { reason, attempts });
                }
                Sample::Outcome(StatusOutcome::Pending) => {
                    self.observer.on_pending(attempts, elapsed);
                }
                Sample::Transient(error) => {
                    self.observer.on_transient_error(attempts, &error);
                    last_error = Some(error);
                }
            }

            // A check landing exactly on the deadline is still allowed
            offset = match offset.checked_add(self.spec.interval) {
                Some(next) => next.max(start.elapsed()),
                None => return Err(self.timed_out(attempts, start, last_error)),
            };
            if offset > self.spec.timeout {
                return Err(self.timed_out(attempts, start, last_error));
            }
        }
    }

    fn timed_out(
        &self,
        attempts: u32,
        start: Instant,
        last_error: Option<String>,
    ) -> ConvergenceError {
        let elapsed = start.elapsed();
        self.observer.on_timeout(attempts, elapsed);
        ConvergenceError::Timeout {
            attempts,
            elapsed,
            timeout: self.spec.timeout,
            last_error,
        }
    }

    /// Sleep until `deadline`; false if cancelled first
    async fn pause_until(&self, deadline: Instant) -> bool {
        if let Some(token) = &self.cancel {
            if token.is_cancelled() {
                return false;
            }
        }
        if deadline <= Instant::now() {
            // Zero intervals still give other tasks a turn
            tokio::task::yield_now().await;
            return true;
        }

        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => false,
                    _ = tokio::time::sleep_until(deadline) => true,
                }
            }
            None => {
                tokio::time::sleep_until(deadline).await;
                true
            }
        }
    }

    async fn cancellable<T>(&self, fut: impl Future<Output = T>) -> Option<T> {
        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => None,
                    value = fut => Some(value),
                }
            }
            None => Some(fut.await),
        }
    }
}
