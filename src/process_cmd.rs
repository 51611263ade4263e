//! Offline processing of a local sales CSV.
//!
//! Runs a file through the same pipeline as `POST /upload`, against the
//! configured result store, and prints the response as JSON.
//!
//! ```bash
//! sales-summary process ./sales.csv
//! sales-summary process ./sales.csv --background
//! ```
//!
//! With `--background` the upload goes through the task queue, and the
//! command waits for the queue to drain before exiting so the summary is
//! on disk when it returns.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::file_store::LocalFileStore;
use crate::processor::UploadProcessor;
use crate::tasks::TaskQueue;

/// CLI entry point for `sales-summary process <file>`.
pub async fn run_process(config: &Config, path: &Path, background: bool) -> Result<()> {
    let is_csv = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".csv"));
    if !is_csv {
        bail!("Only .csv files are supported: {}", path.display());
    }

    let upload = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let store = LocalFileStore::from_config(config)?;
    let (tasks, worker) = TaskQueue::spawn();
    let processor = UploadProcessor::new(Arc::new(store), tasks);

    let response = processor.process(upload, background).await?;
    drop(processor);

    let stats = worker.finish().await?;
    if stats.failed > 0 {
        bail!("background processing failed for {}", response.file_id);
    }

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
