//! Result retrieval: one fixed wait for queued tasks to finish, then one
//! GET per stored id.
//!
//! The wait is a heuristic, not a completion signal; tasks still in the
//! queue afterwards come back as error-status results. No re-poll or
//! backoff is attempted.
use crate::api::{ApiError, SearchApi, TaskFetch};
use crate::audit::AuditLog;
use crate::model::{ResultStatus, TaskResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Injectable wait, so tests can skip the real 6-minute pause.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

/// Production delay backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately; for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Delay for NoDelay {
    async fn wait(&self, _duration: Duration) {}
}

#[instrument(skip_all, fields(tasks = task_ids.len()))]
pub async fn poll_tasks(
    api: &dyn SearchApi,
    audit: &AuditLog,
    delay: &dyn Delay,
    task_ids: &[String],
    wait: Duration,
    concurrency: usize,
) -> Result<Vec<TaskResult>> {
    if !wait.is_zero() {
        info!(wait_secs = wait.as_secs(), "waiting for queued tasks to complete");
        delay.wait(wait).await;
    }

    let concurrency = concurrency.max(1);
    let fetches: Vec<(String, Result<TaskFetch, ApiError>)> =
        stream::iter(task_ids.iter().cloned())
            .map(|id| async move {
                let fetch = api.fetch(&id).await;
                (id, fetch)
            })
            .buffered(concurrency)
            .collect()
            .await;

    let mut results = Vec::with_capacity(fetches.len());
    let mut errors = 0usize;
    for (task_id, fetch) in fetches {
        match fetch {
            Ok(fetch) => {
                audit
                    .append(&fetch.raw)
                    .await
                    .context("failed to append result to audit file")?;
                if fetch.is_ok() {
                    results.push(TaskResult {
                        task_id,
                        status: ResultStatus::Success,
                        keyword: fetch.keyword,
                        offers: fetch.offers,
                    });
                } else {
                    warn!(
                        task_id,
                        code = fetch.status_code,
                        message = %fetch.status_message,
                        "task fetch reported error status"
                    );
                    errors += 1;
                    results.push(TaskResult {
                        task_id,
                        status: ResultStatus::Error,
                        keyword: fetch.keyword,
                        offers: Vec::new(),
                    });
                }
            }
            Err(err) => {
                warn!(task_id, %err, "task fetch failed");
                errors += 1;
                results.push(TaskResult {
                    task_id,
                    status: ResultStatus::Error,
                    keyword: String::new(),
                    offers: Vec::new(),
                });
            }
        }
    }

    info!(fetched = results.len(), errors, "polling finished");
    Ok(results)
}
