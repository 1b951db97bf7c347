use anyhow::Context;
use clap::Parser;
use stat_ingest::{
    IngestConfig, IngestError, IngestPipeline, IngestSummary, InMemoryStatStore, PgStatStore,
    SourceOutput, StatStore,
};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "run-ingest")]
#[command(about = "Fetch NFL weekly player stats and upsert them into the database")]
struct Args {
    /// Apply database migrations before ingesting
    #[arg(long)]
    migrate: bool,

    /// Reconcile and log counts without writing
    #[arg(long)]
    dry_run: bool,

    /// Replay captured source output instead of running the source
    #[arg(long, value_name = "PATH")]
    from_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let mut config = IngestConfig::from_env().context("Failed to load ingest configuration")?;
    config.dry_run |= args.dry_run;

    info!("Starting NFL stat ingestion");

    let result = if config.dry_run {
        execute(IngestPipeline::new(&config, InMemoryStatStore::new()), &args).await
    } else {
        let store = PgStatStore::connect(&config.database)
            .await
            .context("Failed to connect to database")?;
        if args.migrate {
            store.migrate().await.context("Failed to apply migrations")?;
        }
        execute(IngestPipeline::new(&config, store), &args).await
    };

    match result {
        Ok(summary) => {
            info!(
                "Ingestion finished: {} entries, {} players, {} game stats upserted in {} ms",
                summary.input_records,
                summary.players_upserted,
                summary.game_stats_upserted,
                summary.elapsed_ms
            );
            Ok(())
        }
        Err(e) => {
            error!("Error processing or uploading data: {:#}", e);
            if e.downcast_ref::<IngestError>().is_some_and(IngestError::aborted_before_write) {
                info!("Run aborted before any rows were written");
            }
            Err(e)
        }
    }
}

async fn execute<S: StatStore>(
    pipeline: IngestPipeline<S>,
    args: &Args,
) -> anyhow::Result<IngestSummary> {
    let summary = match &args.from_file {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            pipeline.run_with_output(&SourceOutput::Stdout(text)).await?
        }
        None => pipeline.run().await?,
    };
    Ok(summary)
}
