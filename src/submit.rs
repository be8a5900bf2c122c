//! Task submission: one POST per batch with a pacing delay in between.
//!
//! A batch that the service refuses outright is logged and skipped; the
//! remaining batches still go out. A task id that cannot be persisted is
//! fatal for the run, since nothing else remembers it.
use crate::api::SearchApi;
use crate::audit::AuditLog;
use crate::model::{Batch, CreationStatus};
use crate::store::TaskStore;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitSummary {
    /// Ids accepted by the service and appended to the store.
    pub created: usize,
    /// Tasks the service rejected individually.
    pub rejected: usize,
    /// Whole batches that failed (transport or batch-level error status).
    pub failed_batches: usize,
}

#[instrument(skip_all, fields(batches = batches.len()))]
pub async fn submit_batches(
    api: &dyn SearchApi,
    store: &dyn TaskStore,
    audit: &AuditLog,
    batches: &[Batch],
    pace: Duration,
) -> Result<SubmitSummary> {
    let mut summary = SubmitSummary::default();

    for (batch_no, batch) in batches.iter().enumerate() {
        if batch_no > 0 && !pace.is_zero() {
            // The call quota is global per minute; space the calls out.
            tokio::time::sleep(pace).await;
        }

        let response = match api.submit(batch).await {
            Ok(response) => response,
            Err(err) => {
                warn!(batch_no, %err, "batch submission failed; continuing with next batch");
                summary.failed_batches += 1;
                continue;
            }
        };

        audit
            .append_stamped(&response.raw)
            .await
            .context("failed to append submission response to audit file")?;

        if !response.is_ok() {
            warn!(
                batch_no,
                code = response.status_code,
                message = %response.status_message,
                "service rejected batch"
            );
            summary.failed_batches += 1;
            continue;
        }

        for task in &response.tasks {
            match task.creation_status {
                CreationStatus::Created => {
                    store
                        .append(&task.id)
                        .await
                        .with_context(|| format!("failed to persist created task id {}", task.id))?;
                    summary.created += 1;
                }
                CreationStatus::Rejected => summary.rejected += 1,
            }
        }
        info!(batch_no, size = batch.len(), "batch submitted");
    }

    info!(
        created = summary.created,
        rejected = summary.rejected,
        failed_batches = summary.failed_batches,
        "submission finished"
    );
    Ok(summary)
}
