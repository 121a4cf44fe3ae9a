//! Fail-fast suite step runner
//!
//! A suite is an ordered list of named steps. Each step runs to completion
//! before the next one starts and the first failure aborts the suite. Nothing
//! is cleaned up automatically: a failed provision leaves the cluster behind
//! for the cleanup suite.

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{error, info};

use crate::output;

/// Result of a suite that ran every step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteSummary {
    pub suite: &'static str,
    pub steps: Vec<String>,
    pub elapsed: Duration,
}

impl SuiteSummary {
    pub fn print(&self) {
        output::suite_passed(self.suite, self.steps.len(), self.elapsed);
    }
}

/// Runs the steps of one suite in order
pub struct SuiteRunner {
    suite: &'static str,
    started: Instant,
    completed: Vec<String>,
}

impl SuiteRunner {
    pub fn new(suite: &'static str, title: &str) -> Self {
        output::header(title);
        info!(suite, "starting suite");
        Self {
            suite,
            started: Instant::now(),
            completed: Vec::new(),
        }
    }

    /// Run one step, attaching its description to any error
    pub async fn step<T, F>(&mut self, description: &str, step: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        info!(suite = self.suite, step = description, "running step");

        match step.await {
            Ok(value) => {
                let elapsed = started.elapsed();
                info!(
                    suite = self.suite,
                    step = description,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "step passed"
                );
                output::step_passed(description, elapsed);
                self.completed.push(description.to_string());
                Ok(value)
            }
            Err(err) => {
                let message = format!("{err:#}");
                error!(
                    suite = self.suite,
                    step = description,
                    passed = self.completed.len() as u64,
                    error = %message,
                    "step failed"
                );
                output::step_failed(description, &message);
                Err(err.context(format!("{} suite step '{description}' failed", self.suite)))
            }
        }
    }

    pub fn finish(self) -> SuiteSummary {
        let summary = SuiteSummary {
            suite: self.suite,
            steps: self.completed,
            elapsed: self.started.elapsed(),
        };
        info!(
            suite = summary.suite,
            steps = summary.steps.len() as u64,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "suite passed"
        );
        summary
    }
}
