//! Fileproof - Background validation jobs
//!
//! A validation run is submitted as an explicit job to a small rayon pool.
//! The caller keeps a [`JobHandle`]: a cancellation token checked between
//! rows, and a channel that yields progress events and exactly one
//! `Finished` event carrying the owned result.

use anyhow::{Context, Result};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::ValidatorConfig;
use crate::inspect::{inspect_path, Inspection};
use crate::result::ValidateError;

/// Progress is reported every this many lines.
pub const PROGRESS_INTERVAL: usize = 1000;

/// Cooperative cancellation flag shared between a job and its caller
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Events emitted by a running job
pub enum JobEvent {
    /// Lines consumed so far
    Progress { rows: usize },
    /// Terminal event; nothing follows it
    Finished(Result<Inspection, ValidateError>),
}

/// Type alias for the event sender (used by the job)
pub type JobEventSender = mpsc::UnboundedSender<JobEvent>;

/// Type alias for the event receiver (used by the caller)
pub type JobEventReceiver = mpsc::UnboundedReceiver<JobEvent>;

/// What to validate and how
#[derive(Debug, Clone)]
pub struct ValidationJob {
    /// File path, or `-` for stdin
    pub path: String,
    pub config: ValidatorConfig,
}

impl ValidationJob {
    pub fn new(path: impl Into<String>, config: ValidatorConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    /// Run synchronously on the current thread, reporting through `events`.
    pub fn run(&self, cancel: &CancelToken, events: &JobEventSender) -> Result<Inspection, ValidateError> {
        inspect_path(&self.path, &self.config, |consumed| {
            if cancel.is_cancelled() {
                return ControlFlow::Break(());
            }
            if consumed > 0 && consumed % PROGRESS_INTERVAL == 0 {
                // A dropped receiver only means nobody is watching
                let _ = events.send(JobEvent::Progress { rows: consumed });
            }
            ControlFlow::Continue(())
        })
    }
}

/// Handle to a submitted job
pub struct JobHandle {
    cancel: CancelToken,
    events: JobEventReceiver,
}

impl JobHandle {
    /// Token that stops the job at the next row boundary
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Next event, or None once the job is gone.
    pub async fn next_event(&mut self) -> Option<JobEvent> {
        self.events.recv().await
    }

    /// Block the current (non-async) thread until the job finishes.
    pub fn wait(mut self) -> Result<Inspection, ValidateError> {
        while let Some(event) = self.events.blocking_recv() {
            if let JobEvent::Finished(outcome) = event {
                return outcome;
            }
        }
        // The worker went away without a Finished event
        Err(ValidateError::Cancelled { rows: 0 })
    }
}

/// Thread pool that runs validation jobs off the caller's thread
pub struct ValidationPool {
    pool: rayon::ThreadPool,
}

impl ValidationPool {
    pub fn new(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("fileproof-worker-{}", i))
            .build()
            .context("Failed to start validation worker pool")?;
        Ok(Self { pool })
    }

    /// Submit a job; it starts as soon as a worker is free.
    pub fn submit(&self, job: ValidationJob) -> JobHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancelToken::new();
        let job_cancel = cancel.clone();

        self.pool.spawn(move || {
            debug!(path = %job.path, "validation job started");
            let outcome = job.run(&job_cancel, &tx);
            debug!(path = %job.path, ok = outcome.is_ok(), "validation job finished");
            let _ = tx.send(JobEvent::Finished(outcome));
        });

        JobHandle { cancel, events: rx }
    }
}
