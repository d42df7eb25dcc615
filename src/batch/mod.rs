//! # Batch Processing
//!
//! Turns a list of discovered media files into subtitle files.
//!
//! ## Key Components:
//! - **ExecutionMode**: the parallelism policy (how many workers, if any)
//! - **job**: the per-file pipeline (model → transcript → `.srt`) and its outcome
//! - **BatchOrchestrator**: runs jobs on a worker pool or sequentially, with a
//!   sequential fallback when the pool breaks
//! - **BatchReport**: one outcome per input file, in input order

pub mod job;            // Per-file job and its outcome
pub mod orchestrator;   // Worker pool, sequential runner and fallback

pub use job::{process_file, JobOutcome};
pub use orchestrator::BatchOrchestrator;

use crate::config::Configuration;
use crate::device::Device;
use chrono::{DateTime, Utc};
use std::fmt;

/// How a batch is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Jobs run one after another in input order on a single worker
    Sequential,
    /// Jobs are spread across `workers` isolated worker threads
    Parallel { workers: usize },
}

impl ExecutionMode {
    /// Choose the mode for `file_count` files under `config`.
    ///
    /// Only GPU batches run in parallel: CPU inference already saturates the
    /// cores, and a model per worker would multiply memory for no gain.
    pub fn plan(config: &Configuration, file_count: usize) -> Self {
        let workers = effective_workers(config.parallel_workers.get(), file_count);
        if workers > 1 && config.device == Device::Gpu {
            ExecutionMode::Parallel { workers }
        } else {
            ExecutionMode::Sequential
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Sequential => write!(f, "sequential"),
            ExecutionMode::Parallel { workers } => write!(f, "parallel, {} workers", workers),
        }
    }
}

/// Configured worker count clamped to `[1, file_count]`.
pub fn effective_workers(configured: usize, file_count: usize) -> usize {
    configured.min(file_count).max(1)
}

/// Aggregated result of one batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Exactly one outcome per input file, in input order
    pub outcomes: Vec<JobOutcome>,
    /// Mode that was planned for the batch
    pub mode: ExecutionMode,
    /// Whether the worker pool failed and the batch was re-run sequentially
    pub fell_back: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// One-line summary for the end of the run.
    pub fn summary(&self) -> String {
        let mode = if self.fell_back {
            format!("{}, fell back to sequential", self.mode)
        } else {
            self.mode.to_string()
        };
        format!(
            "Batch processing complete: {} succeeded, {} failed ({}, {:.1}s)",
            self.succeeded(),
            self.failed(),
            mode,
            self.elapsed().num_milliseconds() as f64 / 1000.0
        )
    }
}
