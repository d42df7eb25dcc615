//! # Batch Orchestrator
//!
//! Drives a batch of jobs to completion.
//!
//! ## Execution:
//! - **Parallel**: N named worker threads, each with its own [`ModelCache`],
//!   claim jobs from a shared atomic cursor and stream outcomes back over a
//!   channel. Completion order is arbitrary; outcomes are stored by input index.
//! - **Sequential**: one blocking task with one cache processes files in input order.
//!
//! A panic inside a job is caught at the job boundary (see [`process_file`])
//! and reported as that file's failure; the worker moves on to the next file.
//!
//! ## Pool failure:
//! If a worker cannot be spawned, or a worker thread dies outside a job, the
//! pool is fatal. Surviving workers stop claiming, in-flight
//! jobs finish, and the whole batch is re-run sequentially. Subtitle writes
//! replace their target, so re-running already finished files is harmless.

use super::job::panic_message;
use super::{process_file, BatchReport, ExecutionMode, JobOutcome};
use crate::config::Configuration;
use crate::discovery::MediaFile;
use crate::error::{BatchError, BatchResult};
use crate::transcription::{ModelCache, TranscriptionBackend};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

type OutcomeSender = mpsc::UnboundedSender<(usize, JobOutcome)>;

/// Runs batches against a shared transcription backend.
pub struct BatchOrchestrator<B: TranscriptionBackend> {
    backend: Arc<B>,
    config: Arc<Configuration>,
}

impl<B: TranscriptionBackend> BatchOrchestrator<B> {
    pub fn new(backend: B, config: Configuration) -> Self {
        Self {
            backend: Arc::new(backend),
            config: Arc::new(config),
        }
    }

    /// Process every file and return one outcome per file, in input order.
    ///
    /// Individual job failures are recorded in the report, never returned.
    pub async fn run(&self, files: Vec<MediaFile>) -> BatchReport {
        let started_at = Utc::now();
        let files: Arc<[MediaFile]> = files.into();
        let mode = ExecutionMode::plan(&self.config, files.len());
        info!("Processing {} file(s) ({})", files.len(), mode);

        let mut fell_back = false;
        let outcomes = match mode {
            ExecutionMode::Parallel { workers } => {
                match self.run_parallel(Arc::clone(&files), workers).await {
                    Ok(outcomes) => outcomes,
                    Err(e) => {
                        error!("{}. Falling back to sequential processing.", e);
                        fell_back = true;
                        self.run_sequential(files).await
                    }
                }
            }
            ExecutionMode::Sequential => self.run_sequential(files).await,
        };

        BatchReport {
            outcomes,
            mode,
            fell_back,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Run all files on `workers` isolated worker threads.
    async fn run_parallel(&self, files: Arc<[MediaFile]>, workers: usize) -> BatchResult<Vec<JobOutcome>> {
        let cursor = Arc::new(AtomicUsize::new(0));
        let stop = Arc::new(AtomicBool::new(false));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut handles = Vec::with_capacity(workers);

        for worker_id in 0..workers {
            let worker = Worker {
                backend: Arc::clone(&self.backend),
                config: Arc::clone(&self.config),
                files: Arc::clone(&files),
                cursor: Arc::clone(&cursor),
                stop: Arc::clone(&stop),
                tx: tx.clone(),
            };
            let spawned = thread::Builder::new()
                .name(format!("transcribe-worker-{}", worker_id))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    stop.store(true, Ordering::SeqCst);
                    drop(tx);
                    // Let already running workers finish their current job
                    while rx.recv().await.is_some() {}
                    join_workers(handles).await;
                    return Err(BatchError::PoolFatal(format!(
                        "could not start worker {}: {}",
                        worker_id, e
                    )));
                }
            }
        }
        drop(tx);
        info!("Started {} worker(s)", handles.len());

        let mut slots: Vec<Option<JobOutcome>> = (0..files.len()).map(|_| None).collect();
        while let Some((index, outcome)) = rx.recv().await {
            slots[index] = Some(outcome);
        }

        let crashed = join_workers(handles).await;
        let missing = slots.iter().filter(|slot| slot.is_none()).count();
        if crashed > 0 || missing > 0 {
            return Err(BatchError::PoolFatal(format!(
                "{} worker(s) terminated abnormally, {} job(s) unreported",
                crashed, missing
            )));
        }

        Ok(slots.into_iter().flatten().collect())
    }

    /// Run all files in input order on a single blocking worker.
    async fn run_sequential(&self, files: Arc<[MediaFile]>) -> Vec<JobOutcome> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let worker = Worker {
            backend: Arc::clone(&self.backend),
            config: Arc::clone(&self.config),
            files: Arc::clone(&files),
            cursor: Arc::new(AtomicUsize::new(0)),
            stop: Arc::new(AtomicBool::new(false)),
            tx,
        };
        let task = tokio::task::spawn_blocking(move || worker.run());

        let mut slots: Vec<Option<JobOutcome>> = (0..files.len()).map(|_| None).collect();
        while let Some((index, outcome)) = rx.recv().await {
            slots[index] = Some(outcome);
        }
        if let Err(e) = task.await {
            error!("Sequential worker terminated abnormally: {}", e);
        }

        // Nothing left to fall back to: files the worker never reported are failures
        slots
            .into_iter()
            .zip(files.iter())
            .map(|(slot, file)| {
                slot.unwrap_or_else(|| {
                    JobOutcome::failed(file.clone(), "worker terminated before reporting this file")
                })
            })
            .collect()
    }
}

/// One isolated execution context. Owns its model cache for its whole life.
struct Worker<B: TranscriptionBackend> {
    backend: Arc<B>,
    config: Arc<Configuration>,
    files: Arc<[MediaFile]>,
    cursor: Arc<AtomicUsize>,
    stop: Arc<AtomicBool>,
    tx: OutcomeSender,
}

impl<B: TranscriptionBackend> Worker<B> {
    fn run(self) {
        let _guard = StopOnPanic(Arc::clone(&self.stop));
        let mut cache = ModelCache::new();
        let total = self.files.len();

        while !self.stop.load(Ordering::SeqCst) {
            let index = self.cursor.fetch_add(1, Ordering::SeqCst);
            let Some(file) = self.files.get(index) else {
                break;
            };
            let outcome = process_file(&*self.backend, &mut cache, &self.config, file, index + 1, total);
            if self.tx.send((index, outcome)).is_err() {
                break;
            }
        }

        if !cache.is_empty() {
            debug!(
                "{} finished with {} cached model(s)",
                thread::current().name().unwrap_or("worker"),
                cache.len()
            );
        }
    }
}

/// Tells sibling workers to stop claiming jobs when this worker unwinds.
struct StopOnPanic(Arc<AtomicBool>);

impl Drop for StopOnPanic {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.store(true, Ordering::SeqCst);
        }
    }
}

/// Join worker threads off the async runtime; returns how many panicked.
async fn join_workers(handles: Vec<JoinHandle<()>>) -> usize {
    let joined = tokio::task::spawn_blocking(move || {
        handles
            .into_iter()
            .filter_map(|handle| {
                let name = handle.thread().name().unwrap_or("worker").to_string();
                handle.join().err().map(|payload| {
                    error!("{} panicked: {}", name, panic_message(payload.as_ref()));
                })
            })
            .count()
    })
    .await;

    joined.unwrap_or_else(|e| {
        warn!("Could not join worker threads: {}", e);
        1
    })
}
