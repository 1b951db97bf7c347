//! Storage seam for players and game stats

use crate::error::{IngestError, Result};
use crate::models::{GameStatRow, GameStatUpsert, PlayerProfile, PlayerSummary, PlayerUpsert};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

pub const PLAYERS_TABLE: &str = "players";
pub const GAME_STATS_TABLE: &str = "game_stats";

/// Persistent store for ingested stats
///
/// Both upserts are insert-or-update on the natural key: `player_id` for
/// players, `(player_id, season, week)` for game stats. Each call is atomic
/// and applies rows in order, so a key repeated within one call ends up with
/// the last row's values.
#[async_trait::async_trait]
pub trait StatStore: Send + Sync {
    /// Upsert players; returns the number of rows submitted
    async fn upsert_players(&self, rows: &[PlayerUpsert]) -> Result<usize>;

    /// Upsert game stats; returns the number of rows submitted
    async fn upsert_game_stats(&self, rows: &[GameStatUpsert]) -> Result<usize>;

    /// All players as id and name, ordered by name
    async fn list_players(&self) -> Result<Vec<PlayerSummary>>;

    /// Identity columns of one player
    async fn get_player(&self, player_id: &str) -> Result<Option<PlayerProfile>>;

    /// Stored game lines of one player, ordered by season and week
    async fn game_stats_for(&self, player_id: &str) -> Result<Vec<GameStatRow>>;
}

#[derive(Debug, Default)]
struct MemoryState {
    players: BTreeMap<String, PlayerUpsert>,
    game_stats: BTreeMap<(String, i32, i32), GameStatUpsert>,
    write_calls: Vec<&'static str>,
}

/// In-memory stat store (dry runs and tests)
#[derive(Debug, Default)]
pub struct InMemoryStatStore {
    state: Mutex<MemoryState>,
    failing_table: Option<&'static str>,
}

impl InMemoryStatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes to `table` are always rejected
    pub fn failing_on(table: &'static str) -> Self {
        Self { failing_table: Some(table), ..Self::default() }
    }

    pub async fn player_count(&self) -> usize {
        self.state.lock().await.players.len()
    }

    pub async fn game_stat_count(&self) -> usize {
        self.state.lock().await.game_stats.len()
    }

    pub async fn player(&self, player_id: &str) -> Option<PlayerUpsert> {
        self.state.lock().await.players.get(player_id).cloned()
    }

    pub async fn game_stat(&self, player_id: &str, season: i32, week: i32) -> Option<GameStatUpsert> {
        self.state.lock().await.game_stats.get(&(player_id.to_string(), season, week)).cloned()
    }

    /// Tables written to so far, in call order
    pub async fn write_calls(&self) -> Vec<&'static str> {
        self.state.lock().await.write_calls.clone()
    }

    fn check_writable(&self, table: &'static str) -> Result<()> {
        if self.failing_table == Some(table) {
            return Err(IngestError::storage_write(table, "write rejected by store"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl StatStore for InMemoryStatStore {
    async fn upsert_players(&self, rows: &[PlayerUpsert]) -> Result<usize> {
        let mut state = self.state.lock().await;
        state.write_calls.push(PLAYERS_TABLE);
        self.check_writable(PLAYERS_TABLE)?;

        for row in rows {
            state.players.insert(row.player_id.clone(), row.clone());
        }
        Ok(rows.len())
    }

    async fn upsert_game_stats(&self, rows: &[GameStatUpsert]) -> Result<usize> {
        let mut state = self.state.lock().await;
        state.write_calls.push(GAME_STATS_TABLE);
        self.check_writable(GAME_STATS_TABLE)?;

        for row in rows {
            let key = (row.player_id.clone(), row.season, row.week);
            state.game_stats.insert(key, row.clone());
        }
        Ok(rows.len())
    }

    async fn list_players(&self) -> Result<Vec<PlayerSummary>> {
        let state = self.state.lock().await;
        let mut players: Vec<PlayerSummary> = state
            .players
            .values()
            .map(|p| PlayerSummary { player_id: p.player_id.clone(), full_name: p.full_name.clone() })
            .collect();

        // Same order as `ORDER BY full_name ASC, player_id ASC` (nulls last)
        players.sort_by(|a, b| {
            (a.full_name.is_none(), &a.full_name, &a.player_id).cmp(&(
                b.full_name.is_none(),
                &b.full_name,
                &b.player_id,
            ))
        });
        Ok(players)
    }

    async fn get_player(&self, player_id: &str) -> Result<Option<PlayerProfile>> {
        let state = self.state.lock().await;
        Ok(state.players.get(player_id).map(|p| PlayerProfile {
            full_name: p.full_name.clone(),
            position: p.position.clone(),
            team: p.team.clone(),
        }))
    }

    async fn game_stats_for(&self, player_id: &str) -> Result<Vec<GameStatRow>> {
        let state = self.state.lock().await;
        Ok(state
            .game_stats
            .values()
            .filter(|row| row.player_id == player_id)
            .map(|row| GameStatRow {
                season: row.season,
                week: row.week,
                game_date: row.game_date,
                stats: row.stats.clone(),
            })
            .collect())
    }
}
