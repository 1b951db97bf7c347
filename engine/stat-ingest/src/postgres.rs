//! PostgreSQL implementation of [`StatStore`]

use crate::config::DatabaseConfig;
use crate::error::{IngestError, Result};
use crate::models::{
    GameStatRow, GameStatUpsert, PlayerProfile, PlayerSummary, PlayerUpsert, StatLine,
};
use crate::store::{StatStore, GAME_STATS_TABLE, PLAYERS_TABLE};
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use tracing::{debug, info};

/// Rows per INSERT statement; five binds per row stays far below the
/// Postgres limit of 65535 parameters.
const CHUNK_SIZE: usize = 1000;

/// Stat store backed by the `players` and `game_stats` tables
#[derive(Debug, Clone)]
pub struct PgStatStore {
    pool: PgPool,
}

impl PgStatStore {
    /// Connect a new pool
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;

        info!("Connected to database");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the bundled schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }
}

#[async_trait::async_trait]
impl StatStore for PgStatStore {
    async fn upsert_players(&self, rows: &[PlayerUpsert]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let fail = |e: sqlx::Error| IngestError::storage_write(PLAYERS_TABLE, e);
        let rows = last_wins(rows, |row| row.player_id.clone());

        let mut tx = self.pool.begin().await.map_err(fail)?;
        for chunk in rows.chunks(CHUNK_SIZE) {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO players (player_id, full_name, position, team, sport_id) ",
            );
            qb.push_values(chunk, |mut b, row| {
                b.push_bind(&row.player_id)
                    .push_bind(&row.full_name)
                    .push_bind(&row.position)
                    .push_bind(&row.team)
                    .push_bind(row.sport_id);
            });
            qb.push(
                r#"
                ON CONFLICT (player_id)
                DO UPDATE SET
                    full_name = EXCLUDED.full_name,
                    position = EXCLUDED.position,
                    team = EXCLUDED.team,
                    sport_id = EXCLUDED.sport_id
                "#,
            );

            qb.build().execute(&mut *tx).await.map_err(fail)?;
            debug!("Upserted chunk of {} players", chunk.len());
        }
        tx.commit().await.map_err(fail)?;

        Ok(rows.len())
    }

    async fn upsert_game_stats(&self, rows: &[GameStatUpsert]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let fail = |e: sqlx::Error| IngestError::storage_write(GAME_STATS_TABLE, e);
        let rows = last_wins(rows, |row| (row.player_id.clone(), row.season, row.week));

        let mut tx = self.pool.begin().await.map_err(fail)?;
        for chunk in rows.chunks(CHUNK_SIZE) {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO game_stats (player_id, season, week, game_date, stats) ",
            );
            qb.push_values(chunk, |mut b, row| {
                b.push_bind(&row.player_id)
                    .push_bind(row.season)
                    .push_bind(row.week)
                    .push_bind(row.game_date)
                    .push_bind(Json(&row.stats));
            });
            qb.push(
                r#"
                ON CONFLICT (player_id, season, week)
                DO UPDATE SET
                    game_date = EXCLUDED.game_date,
                    stats = EXCLUDED.stats
                "#,
            );

            qb.build().execute(&mut *tx).await.map_err(fail)?;
            debug!("Upserted chunk of {} game stats", chunk.len());
        }
        tx.commit().await.map_err(fail)?;

        Ok(rows.len())
    }

    async fn list_players(&self) -> Result<Vec<PlayerSummary>> {
        let rows: Vec<(String, Option<String>)> = sqlx::query_as(
            "SELECT player_id, full_name FROM players ORDER BY full_name ASC, player_id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(player_id, full_name)| PlayerSummary { player_id, full_name })
            .collect())
    }

    async fn get_player(&self, player_id: &str) -> Result<Option<PlayerProfile>> {
        let row: Option<(Option<String>, Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT full_name, position, team FROM players WHERE player_id = $1",
        )
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(full_name, position, team)| PlayerProfile { full_name, position, team }))
    }

    async fn game_stats_for(&self, player_id: &str) -> Result<Vec<GameStatRow>> {
        let rows: Vec<(i32, i32, Option<NaiveDate>, Json<StatLine>)> = sqlx::query_as(
            r#"
            SELECT season, week, game_date, stats
            FROM game_stats
            WHERE player_id = $1
            ORDER BY season ASC, week ASC
            "#,
        )
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(season, week, game_date, Json(stats))| GameStatRow {
                season,
                week,
                game_date,
                stats,
            })
            .collect())
    }
}

/// Collapse rows sharing a key down to the last one
///
/// A single `INSERT ... ON CONFLICT DO UPDATE` may not touch the same row
/// twice, so repeats are resolved here. The surviving row keeps the position
/// of the key's first appearance and the values of its last.
fn last_wins<T, K, F>(rows: &[T], key: F) -> Vec<&T>
where
    K: std::hash::Hash + Eq,
    F: Fn(&T) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::with_capacity(rows.len());
    let mut out: Vec<&T> = Vec::with_capacity(rows.len());

    for row in rows {
        match slots.get(&key(row)) {
            Some(&slot) => out[slot] = row,
            None => {
                slots.insert(key(row), out.len());
                out.push(row);
            }
        }
    }

    if out.len() < rows.len() {
        debug!("Collapsed {} repeated keys before upsert", rows.len() - out.len());
    }
    out
}
