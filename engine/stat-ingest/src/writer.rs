use crate::error::Result;
use crate::reconcile::Reconciled;
use crate::store::StatStore;
use serde::Serialize;
use tracing::info;

/// Rows handed to the store by one [`BulkUpsertWriter::write`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub players: usize,
    pub game_stats: usize,
}

/// Writes reconciled rows: players first, then game stats
///
/// Stops at the first rejected write. Nothing is retried and nothing already
/// committed is rolled back.
pub struct BulkUpsertWriter<'a, S: StatStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: StatStore + ?Sized> BulkUpsertWriter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn write(&self, batch: &Reconciled) -> Result<WriteReport> {
        info!(
            "Upserting {} unique players and {} game stats...",
            batch.players.len(),
            batch.game_stats.len()
        );

        let mut report = WriteReport::default();

        if !batch.players.is_empty() {
            report.players = self.store.upsert_players(&batch.players).await?;
            info!("Upserted {} players", report.players);
        }

        if !batch.game_stats.is_empty() {
            report.game_stats = self.store.upsert_game_stats(&batch.game_stats).await?;
            info!("Upserted {} game stats", report.game_stats);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IngestError;
    use crate::models::{GameStatUpsert, PlayerUpsert, StatLine, NFL_SPORT_ID};
    use crate::store::{InMemoryStatStore, GAME_STATS_TABLE, PLAYERS_TABLE};

    fn batch() -> Reconciled {
        Reconciled {
            input_records: 1,
            players: vec![PlayerUpsert {
                player_id: "P1".to_string(),
                full_name: Some("A".to_string()),
                position: Some("QB".to_string()),
                team: Some("NYJ".to_string()),
                sport_id: NFL_SPORT_ID,
            }],
            game_stats: vec![GameStatUpsert {
                player_id: "P1".to_string(),
                season: 2024,
                week: 1,
                game_date: None,
                stats: StatLine { passing_yards: Some(300.0), ..Default::default() },
            }],
            skips: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_writes_players_then_stats() {
        let store = InMemoryStatStore::new();
        let report = BulkUpsertWriter::new(&store).write(&batch()).await.unwrap();

        assert_eq!(report, WriteReport { players: 1, game_stats: 1 });
        assert_eq!(store.write_calls().await, vec![PLAYERS_TABLE, GAME_STATS_TABLE]);
    }

    #[tokio::test]
    async fn test_player_failure_skips_stats() {
        let store = InMemoryStatStore::failing_on(PLAYERS_TABLE);
        let err = BulkUpsertWriter::new(&store).write(&batch()).await.unwrap_err();

        assert!(matches!(err, IngestError::StorageWriteFailure { table: "players", .. }));
        assert_eq!(store.write_calls().await, vec![PLAYERS_TABLE]);
        assert_eq!(store.game_stat_count().await, 0);
    }

    #[tokio::test]
    async fn test_stat_failure_keeps_players() {
        let store = InMemoryStatStore::failing_on(GAME_STATS_TABLE);
        let err = BulkUpsertWriter::new(&store).write(&batch()).await.unwrap_err();

        assert!(!err.aborted_before_write());
        assert_eq!(store.player_count().await, 1);
        assert_eq!(store.game_stat_count().await, 0);
    }

    #[tokio::test]
    async fn test_empty_batch_does_not_touch_store() {
        let store = InMemoryStatStore::new();
        let report = BulkUpsertWriter::new(&store).write(&Reconciled::default()).await.unwrap();

        assert_eq!(report, WriteReport::default());
        assert!(store.write_calls().await.is_empty());
    }
}
