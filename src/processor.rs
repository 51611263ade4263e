//! Upload processing pipeline.
//!
//! Turns the bytes of one uploaded sales CSV into a stored summary:
//!
//! ```text
//! upload bytes ──▶ aggregate_sales ──▶ encode_summary ──▶ ResultStore::save
//! ```
//!
//! The result ID is generated before any work starts, so a caller learns
//! where the summary will live even when processing is deferred to the
//! [`TaskQueue`]. Deferred callers poll [`ResultStore::exists`] (or the
//! download endpoint) to find out when it is ready.
//!
//! Aggregation is CPU-bound and runs on tokio's blocking pool.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use sales_summary_core::aggregate::aggregate_sales;
use sales_summary_core::models::ProcessingMetrics;
use sales_summary_core::store::ResultStore;
use sales_summary_core::summary::encode_summary;

use crate::tasks::TaskQueue;

pub const MESSAGE_COMPLETED: &str = "File processed successfully";
pub const MESSAGE_DEFERRED: &str = "Processing started in the background";

/// Response body for an accepted upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessFileResponse {
    pub message: String,
    pub file_id: String,
    pub download_link: String,
    /// `None` when processing was deferred and has not run yet.
    pub metrics: Option<ProcessingMetrics>,
}

/// Generate a fresh, time-ordered result ID.
pub fn new_result_id() -> String {
    format!("summary_{}.csv", Uuid::now_v7())
}

/// Runs uploads through the aggregation pipeline against an injected store.
#[derive(Clone)]
pub struct UploadProcessor {
    store: Arc<dyn ResultStore>,
    tasks: TaskQueue,
}

impl UploadProcessor {
    pub fn new(store: Arc<dyn ResultStore>, tasks: TaskQueue) -> Self {
        Self { store, tasks }
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// Process one upload, inline or deferred.
    ///
    /// Inline processing returns once the summary is stored and includes
    /// its metrics. Deferred processing returns immediately with
    /// `metrics: None`.
    pub async fn process(&self, upload: Vec<u8>, deferred: bool) -> Result<ProcessFileResponse> {
        let file_id = new_result_id();
        let download_link = self.store.download_link(&file_id);

        if deferred {
            info!(file_id = %file_id, bytes = upload.len(), "queueing upload for background processing");
            self.tasks.submit(
                format!("summarize {}", file_id),
                run_deferred(self.store.clone(), upload, file_id.clone()),
            )?;
            return Ok(ProcessFileResponse {
                message: MESSAGE_DEFERRED.to_string(),
                file_id,
                download_link,
                metrics: None,
            });
        }

        let metrics = summarize_and_store(self.store.as_ref(), upload, &file_id).await?;
        Ok(ProcessFileResponse {
            message: MESSAGE_COMPLETED.to_string(),
            file_id,
            download_link,
            metrics: Some(metrics),
        })
    }
}

async fn run_deferred(store: Arc<dyn ResultStore>, upload: Vec<u8>, file_id: String) -> Result<()> {
    summarize_and_store(store.as_ref(), upload, &file_id).await?;
    Ok(())
}

/// Aggregate `upload`, encode the summary, and save it under `file_id`.
pub async fn summarize_and_store(
    store: &dyn ResultStore,
    upload: Vec<u8>,
    file_id: &str,
) -> Result<ProcessingMetrics> {
    let (summary, metrics) = tokio::task::spawn_blocking(move || -> Result<_> {
        let aggregation = aggregate_sales(upload.as_slice())?;
        let summary = encode_summary(&aggregation.totals)?;
        Ok((summary, aggregation.metrics))
    })
    .await
    .context("Aggregation task panicked")??;

    let location = store
        .save(file_id, &summary)
        .await
        .with_context(|| format!("Failed to store summary {}", file_id))?;

    info!(
        file_id,
        location = %location,
        rows = metrics.total_rows_processed,
        departments = metrics.total_departments,
        "summary stored"
    );
    Ok(metrics)
}
