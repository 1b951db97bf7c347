use crate::config::IngestConfig;
use crate::error::Result;
use crate::feed;
use crate::reconcile::{self, UpsertKind};
use crate::source::{SourceOutput, SourceProcess};
use crate::store::StatStore;
use crate::writer::{BulkUpsertWriter, WriteReport};
use serde::Serialize;
use std::time::Instant;
use tracing::info;

/// Outcome of a successful batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub input_records: usize,
    pub players_upserted: usize,
    pub game_stats_upserted: usize,
    pub players_skipped: usize,
    pub game_stats_skipped: usize,
    pub dry_run: bool,
    pub elapsed_ms: u64,
}

/// One batch: source → extract → reconcile → upsert
pub struct IngestPipeline<S> {
    source: SourceProcess,
    store: S,
    sport_id: i32,
    dry_run: bool,
}

impl<S: StatStore> IngestPipeline<S> {
    pub fn new(config: &IngestConfig, store: S) -> Self {
        Self {
            source: SourceProcess::new(config.source.clone()),
            store,
            sport_id: config.sport_id,
            dry_run: config.dry_run,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run the source process and ingest what it produced
    pub async fn run(&self) -> Result<IngestSummary> {
        let output = self.source.run().await?;
        self.run_with_output(&output).await
    }

    /// Ingest output that has already been captured
    pub async fn run_with_output(&self, output: &SourceOutput) -> Result<IngestSummary> {
        let started = Instant::now();

        let records = feed::extract(output)?;
        if records.is_empty() {
            info!("No stats returned from source. Nothing to upload.");
        } else {
            info!("Processing {} stat entries...", records.len());
        }

        let batch = reconcile::reconcile(&records, self.sport_id);

        let written = if self.dry_run {
            info!(
                "Dry run: would upsert {} players and {} game stats",
                batch.players.len(),
                batch.game_stats.len()
            );
            WriteReport::default()
        } else {
            BulkUpsertWriter::new(&self.store).write(&batch).await?
        };

        Ok(IngestSummary {
            input_records: batch.input_records,
            players_upserted: written.players,
            game_stats_upserted: written.game_stats,
            players_skipped: batch.skipped(UpsertKind::Player),
            game_stats_skipped: batch.skipped(UpsertKind::GameStat),
            dry_run: self.dry_run,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}
