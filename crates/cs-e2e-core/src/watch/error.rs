//! Error types for the convergence watcher
//!
//! A wait ends in exactly one of three ways besides success. Keeping them
//! apart lets callers tell "still converging, ran out of patience" from
//! "broke in a way we don't understand".

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Errors that end a convergence wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvergenceError {
    /// The resource entered a disallowed state, or the check failed with a
    /// permanent error
    Failed {
        /// The reason reported by the check, verbatim
        reason: String,
        /// Number of checks performed, including the failing one
        attempts: u32,
    },

    /// The deadline passed while the resource was still pending
    Timeout {
        /// Number of checks performed
        attempts: u32,
        /// Time spent waiting
        elapsed: Duration,
        /// The configured deadline
        timeout: Duration,
        /// The last transient error observed, if any
        last_error: Option<String>,
    },

    /// The wait was cancelled externally
    Cancelled {
        /// Number of checks performed before cancellation
        attempts: u32,
    },
}

impl fmt::Display for ConvergenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvergenceError::Failed { reason, .. } => write!(f, "{}", reason),
            ConvergenceError::Timeout {
                attempts,
                elapsed,
                timeout,
                last_error,
            } => {
                write!(
                    f,
                    "timed out after {:.1}s (limit {:.1}s, {} checks) waiting for convergence",
                    elapsed.as_secs_f64(),
                    timeout.as_secs_f64(),
                    attempts
                )?;
                if let Some(err) = last_error {
                    write!(f, "; last error: {}", err)?;
                }
                Ok(())
            }
            ConvergenceError::Cancelled { attempts } => {
                write!(f, "wait cancelled after {} checks", attempts)
            }
        }
    }
}

impl Error for ConvergenceError {}

impl ConvergenceError {
    /// Create a failed error
    pub fn failed(reason: impl Into<String>, attempts: u32) -> Self {
        ConvergenceError::Failed {
            reason: reason.into(),
            attempts,
        }
    }

    /// Number of checks performed before the wait ended
    pub fn attempts(&self) -> u32 {
        match self {
            ConvergenceError::Failed { attempts, .. }
            | ConvergenceError::Timeout { attempts, .. }
            | ConvergenceError::Cancelled { attempts } => *attempts,
        }
    }

    /// Check if the resource entered an unexpected state
    pub fn is_failed(&self) -> bool {
        matches!(self, ConvergenceError::Failed { .. })
    }

    /// Check if the deadline passed
    pub fn is_timeout(&self) -> bool {
        matches!(self, ConvergenceError::Timeout { .. })
    }

    /// Check if the wait was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ConvergenceError::Cancelled { .. })
    }

    /// The failure reason, if this is a `Failed` error
    pub fn reason(&self) -> Option<&str> {
        match self {
            ConvergenceError::Failed { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
