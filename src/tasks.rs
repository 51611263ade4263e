//! Background task queue for deferred processing.
//!
//! Work is submitted as a boxed future and runs on a single worker task in
//! the same process. Submission never blocks and gives no completion
//! channel: callers that need to know when work finished poll whatever
//! state the work produces (for uploads, the result store).
//!
//! ```text
//! submit() ──▶ unbounded mpsc ──▶ worker ──▶ tokio::spawn(job) ──▶ await
//! ```
//!
//! Jobs run one at a time, in submission order. Each job is spawned onto
//! its own task so a panic is contained to that job. There is no
//! cancellation: a submitted job runs to completion or the process exits.

use anyhow::{anyhow, Result};
use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// A unit of deferred work.
type Job = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

struct QueuedJob {
    label: String,
    work: Job,
}

/// Outcome counts reported when the worker exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub completed: usize,
    pub failed: usize,
}

/// Cloneable handle for submitting deferred work.
#[derive(Clone)]
pub struct TaskQueue {
    tx: mpsc::UnboundedSender<QueuedJob>,
}

/// Handle to the worker draining a [`TaskQueue`].
pub struct TaskWorker {
    handle: JoinHandle<TaskStats>,
}

impl TaskQueue {
    /// Create a queue and spawn its worker on the current tokio runtime.
    pub fn spawn() -> (Self, TaskWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(rx));
        (Self { tx }, TaskWorker { handle })
    }

    /// Queue `work` to run in the background.
    ///
    /// Fails only if the worker has already exited.
    pub fn submit<F>(&self, label: impl Into<String>, work: F) -> Result<()>
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let job = QueuedJob {
            label: label.into(),
            work: Box::pin(work),
        };
        self.tx
            .send(job)
            .map_err(|e| anyhow!("background worker is not running; dropped task '{}'", e.0.label))
    }
}

impl TaskWorker {
    /// Wait for the worker to drain every queued job and exit.
    ///
    /// The worker only exits once every [`TaskQueue`] handle is dropped.
    pub async fn finish(self) -> Result<TaskStats> {
        self.handle
            .await
            .map_err(|e| anyhow!("background worker panicked: {}", e))
    }
}

async fn run_worker(mut rx: mpsc::UnboundedReceiver<QueuedJob>) -> TaskStats {
    let mut stats = TaskStats::default();

    while let Some(job) = rx.recv().await {
        debug!(task = %job.label, "starting background task");
        match tokio::spawn(job.work).await {
            Ok(Ok(())) => {
                stats.completed += 1;
                debug!(task = %job.label, "background task finished");
            }
            Ok(Err(e)) => {
                stats.failed += 1;
                error!(task = %job.label, error = %format!("{:#}", e), "background task failed");
            }
            Err(e) => {
                stats.failed += 1;
                error!(task = %job.label, error = %e, "background task panicked");
            }
        }
    }

    debug!(?stats, "background worker exiting");
    stats
}
