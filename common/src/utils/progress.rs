use std::fmt;

use tracing::{info, warn};

use crate::error::AppError;

/// Snapshot handed to a [`ProgressSink`] after every attempted item.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate<'a> {
    pub label: &'a str,
    pub attempted: usize,
    pub total: usize,
    pub success: usize,
    pub fail: usize,
    pub fraction: f64,
}

pub trait ProgressSink: Send + Sync {
    fn update(&self, update: &ProgressUpdate<'_>);
}

/// Emits progress as structured tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn update(&self, update: &ProgressUpdate<'_>) {
        info!(
            label = update.label,
            attempted = update.attempted,
            total = update.total,
            success = update.success,
            fail = update.fail,
            "progress: {:.2}%",
            update.fraction * 100.0
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSummary {
    pub label: String,
    pub total: usize,
    pub success: usize,
    pub fail: usize,
}

impl ProgressSummary {
    pub fn attempted(&self) -> usize {
        self.success.saturating_add(self.fail)
    }
}

impl fmt::Display for ProgressSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: total {} | success {} | fail {}",
            self.label, self.total, self.success, self.fail
        )
    }
}

/// Success/failure accounting for one bulk operation.
///
/// Every attempted item must be classified exactly once through [`Self::record_success`] or
/// [`Self::record_failure`], so `success + fail` always equals the number of attempts.
pub struct ProgressReporter<'a> {
    label: String,
    total: usize,
    success_count: usize,
    fail_count: usize,
    sink: &'a dyn ProgressSink,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(label: impl Into<String>, total: usize, sink: &'a dyn ProgressSink) -> Self {
        Self {
            label: label.into(),
            total,
            success_count: 0,
            fail_count: 0,
            sink,
        }
    }

    pub fn record_success(&mut self) {
        self.success_count = self.success_count.saturating_add(1);
        self.publish();
    }

    /// Counts a failed item and reports it against its zero-based `index`.
    pub fn record_failure(&mut self, index: usize, err: &AppError) {
        self.fail_count = self.fail_count.saturating_add(1);
        warn!(
            label = %self.label,
            item = index.saturating_add(1),
            error = %err,
            "item {} failed",
            index.saturating_add(1)
        );
        self.publish();
    }

    pub fn success_count(&self) -> usize {
        self.success_count
    }

    pub fn fail_count(&self) -> usize {
        self.fail_count
    }

    pub fn attempted(&self) -> usize {
        self.success_count.saturating_add(self.fail_count)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.attempted() as f64 / self.total as f64).clamp(0.0, 1.0)
    }

    pub fn finish(self) -> ProgressSummary {
        let summary = ProgressSummary {
            label: self.label,
            total: self.total,
            success: self.success_count,
            fail: self.fail_count,
        };
        info!(
            label = %summary.label,
            total = summary.total,
            success = summary.success,
            fail = summary.fail,
            "operation finished"
        );
        summary
    }

    fn publish(&self) {
        self.sink.update(&ProgressUpdate {
            label: &self.label,
            attempted: self.attempted(),
            total: self.total,
            success: self.success_count,
            fail: self.fail_count,
            fraction: self.fraction(),
        });
    }
}
