//! End-to-end orchestration of one run: batch → submit → wait → poll →
//! correlate → report, or the resume path that skips straight to polling
//! with previously persisted ids.
use crate::api::SearchApi;
use crate::audit::AuditLog;
use crate::batch;
use crate::catalog;
use crate::config::Config;
use crate::correlate;
use crate::poll::{self, Delay};
use crate::report;
use crate::store::TaskStore;
use crate::submit::{self, SubmitSummary};
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Clear prior state, submit the catalog, then poll.
    Fresh,
    /// Skip submission; poll the ids already in the store.
    Resume,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub records: usize,
    pub skipped_records: usize,
    pub batches: usize,
    pub submitted: Option<SubmitSummary>,
    pub polled: usize,
    pub report_rows: usize,
}

pub async fn run(
    cfg: &Config,
    api: &dyn SearchApi,
    store: &dyn TaskStore,
    delay: &dyn Delay,
    catalog_path: &Path,
    mode: RunMode,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    // Both modes need the keyword index, so the catalog is always read.
    let scan = catalog::read_catalog(catalog_path)?;
    summary.records = scan.records.len();
    let plan = batch::plan_batches(&scan.records, &cfg.campaign);
    summary.skipped_records = scan.skipped + plan.skipped;
    summary.batches = plan.batches.len();

    let post_audit = AuditLog::new(&cfg.run.post_audit_file);
    let results_audit = AuditLog::new(&cfg.run.results_audit_file);

    let wait = match mode {
        RunMode::Fresh => {
            // Leftovers from a previous run would otherwise be re-polled.
            store.clear().await.context("failed to clear task store")?;
            results_audit
                .remove()
                .await
                .context("failed to remove stale results audit file")?;

            let submitted = submit::submit_batches(
                api,
                store,
                &post_audit,
                &plan.batches,
                Duration::from_millis(cfg.run.submit_pace_ms),
            )
            .await?;
            summary.submitted = Some(submitted);
            Duration::from_secs(cfg.run.poll_wait_secs)
        }
        RunMode::Resume => {
            info!("resume mode: skipping submission");
            // The stored tasks were queued long ago; no extra wait.
            Duration::ZERO
        }
    };

    let task_ids = store.read_all().await.context("failed to read task store")?;
    if task_ids.is_empty() {
        warn!("task store is empty; nothing to poll");
    }

    let results = poll::poll_tasks(
        api,
        &results_audit,
        delay,
        &task_ids,
        wait,
        cfg.run.fetch_concurrency,
    )
    .await?;
    summary.polled = results.len();

    let book = correlate::build_price_book(&results);
    let rows = correlate::correlate(&book, &plan.index);
    summary.report_rows = rows.len();
    report::write_report(Path::new(&cfg.run.report_file), &rows)?;

    info!(
        records = summary.records,
        skipped = summary.skipped_records,
        polled = summary.polled,
        rows = summary.report_rows,
        "run complete"
    );
    Ok(summary)
}
