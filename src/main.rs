use anyhow::Result;
use clap::Parser;
use pricescout::api::MerchantClient;
use pricescout::config;
use pricescout::pipeline::{self, RunMode};
use pricescout::poll::TokioDelay;
use pricescout::store::{FileStore, SqliteStore, TaskStore};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Path to the product catalog CSV
    #[arg(long)]
    catalog: PathBuf,

    /// Skip submission and poll the task ids persisted by a previous run
    #[arg(long)]
    resume: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;

    let api = MerchantClient::with_base_url(
        cfg.api.login.clone(),
        cfg.api.password.clone(),
        cfg.api.base_url.parse()?,
    );

    let store: Box<dyn TaskStore> = if cfg.run.uses_sqlite_store() {
        Box::new(SqliteStore::connect(&cfg.run.task_store).await?)
    } else {
        Box::new(FileStore::new(&cfg.run.task_store))
    };

    let mode = if args.resume {
        RunMode::Resume
    } else {
        RunMode::Fresh
    };

    let summary =
        pipeline::run(&cfg, &api, store.as_ref(), &TokioDelay, &args.catalog, mode).await?;

    info!(
        report = %cfg.run.report_file,
        rows = summary.report_rows,
        "done"
    );
    Ok(())
}
