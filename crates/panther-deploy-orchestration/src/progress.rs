//! Progress counter and result aggregation
//!
//! One reporter spans the whole deployment so the `(i/N)` counter keeps
//! climbing across phase boundaries.

use std::fmt::Display;

use tracing::{error, info};

use crate::error::{DeployError, Result};

#[derive(Debug)]
pub struct ProgressReporter {
    label: String,
    total: usize,
    completed: usize,
    succeeded: Vec<String>,
    failures: Vec<(String, String)>,
}

impl ProgressReporter {
    /// `total` is the number of results expected across every phase
    pub fn new(label: impl Into<String>, total: usize) -> Self {
        Self {
            label: label.into(),
            total,
            completed: 0,
            succeeded: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn record<T, E: Display>(&mut self, name: &str, result: &std::result::Result<T, E>) {
        match result {
            Ok(_) => self.record_success(name),
            Err(e) => self.record_failure(name, e),
        }
    }

    pub fn record_success(&mut self, name: &str) {
        self.completed += 1;
        info!("    √ {} finished ({}/{})", name, self.completed, self.total);
        self.succeeded.push(name.to_string());
    }

    pub fn record_failure(&mut self, name: &str, err: impl Display) {
        self.completed += 1;
        error!(
            "    X {} failed: {} ({}/{})",
            name, err, self.completed, self.total
        );
        self.failures.push((name.to_string(), err.to_string()));
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn succeeded(&self) -> &[String] {
        &self.succeeded
    }

    /// Failed names with their error messages, in completion order
    pub fn failures(&self) -> &[(String, String)] {
        &self.failures
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// Ok when nothing failed, otherwise one error naming every failure
    pub fn into_result(self) -> Result<()> {
        if self.failures.is_empty() {
            return Ok(());
        }
        Err(DeployError::StacksFailed {
            label: self.label,
            count: self.failures.len(),
            failed: self.failures.into_iter().map(|(name, _)| name).collect(),
        })
    }
}
