//! Splitting raw feed rows into player and game-stat upserts

use crate::models::{GameStatUpsert, PlayerUpsert, RawStatRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// Why a raw record was left out of an upsert sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    MissingPlayerId,
    MissingSeason,
    MissingWeek,
}

/// Which upsert sequence a skip applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpsertKind {
    Player,
    GameStat,
}

/// A record dropped from one of the output sequences
///
/// Skips never abort a run; they are only counted and logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationSkip {
    /// Position of the record in the feed
    pub index: usize,
    pub kind: UpsertKind,
    pub reason: SkipReason,
}

/// Output of [`reconcile`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciled {
    pub input_records: usize,

    /// Unique players, in order of first appearance
    pub players: Vec<PlayerUpsert>,

    /// Valid game lines, in feed order
    pub game_stats: Vec<GameStatUpsert>,

    pub skips: Vec<ValidationSkip>,
}

impl Reconciled {
    pub fn skipped(&self, kind: UpsertKind) -> usize {
        self.skips.iter().filter(|skip| skip.kind == kind).count()
    }
}

/// Project raw records into player and game-stat upserts
///
/// Players are deduplicated by id keeping the first occurrence. Game lines are
/// not deduplicated; repeated `(player, season, week)` keys are left for the
/// store, where the last applied row wins.
pub fn reconcile(records: &[RawStatRecord], sport_id: i32) -> Reconciled {
    let mut out = Reconciled { input_records: records.len(), ..Default::default() };
    let mut seen_players: HashSet<&str> = HashSet::new();

    for (index, record) in records.iter().enumerate() {
        let player_id = record.player_id.as_deref().filter(|id| !id.trim().is_empty());

        match player_id {
            Some(id) => {
                if seen_players.insert(id) {
                    out.players.push(PlayerUpsert {
                        player_id: id.to_string(),
                        full_name: record.player_display_name.clone(),
                        position: record.position.clone(),
                        team: record.recent_team.clone(),
                        sport_id,
                    });
                }
            }
            None => out.skip(index, UpsertKind::Player, SkipReason::MissingPlayerId),
        }

        // Zero counts as missing, like an absent value
        let season = record.season.filter(|s| *s != 0);
        let week = record.week.filter(|w| *w != 0);

        match (player_id, season, week) {
            (Some(id), Some(season), Some(week)) => out.game_stats.push(GameStatUpsert {
                player_id: id.to_string(),
                season,
                week,
                game_date: parse_game_date(record.gameday.as_deref()),
                stats: record.stat_line(),
            }),
            (None, _, _) => out.skip(index, UpsertKind::GameStat, SkipReason::MissingPlayerId),
            (_, None, _) => out.skip(index, UpsertKind::GameStat, SkipReason::MissingSeason),
            (_, _, None) => out.skip(index, UpsertKind::GameStat, SkipReason::MissingWeek),
        }
    }

    info!(
        "Reconciled {} stat entries into {} unique players and {} game stats ({} skipped)",
        out.input_records,
        out.players.len(),
        out.game_stats.len(),
        out.skips.len()
    );

    out
}

impl Reconciled {
    fn skip(&mut self, index: usize, kind: UpsertKind, reason: SkipReason) {
        debug!("Skipping record {} for {:?} upsert: {:?}", index, kind, reason);
        self.skips.push(ValidationSkip { index, kind, reason });
    }
}

fn parse_game_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    // Accept full timestamps too; only the date part matters
    let date = raw.get(..10).unwrap_or(raw);
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            debug!("Unparseable gameday {:?}: {}", raw, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NFL_SPORT_ID;

    fn record(id: Option<&str>, name: &str, season: Option<i32>, week: Option<i32>) -> RawStatRecord {
        RawStatRecord {
            player_id: id.map(str::to_string),
            player_display_name: Some(name.to_string()),
            position: Some("WR".to_string()),
            recent_team: Some("DET".to_string()),
            season,
            week,
            gameday: Some("2024-09-08".to_string()),
            receiving_yards: Some(80.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_distinct_players_map_one_to_one() {
        let records = vec![
            record(Some("P1"), "Amon-Ra St. Brown", Some(2024), Some(1)),
            record(Some("P2"), "Jameson Williams", Some(2024), Some(1)),
            record(Some("P3"), "Sam LaPorta", Some(2024), Some(1)),
        ];

        let out = reconcile(&records, NFL_SPORT_ID);
        assert_eq!(out.input_records, 3);
        assert_eq!(out.players.len(), 3);
        assert_eq!(out.game_stats.len(), 3);
        assert!(out.skips.is_empty());
        assert_eq!(out.players[1].player_id, "P2");
        assert_eq!(out.players[1].team.as_deref(), Some("DET"));
        assert_eq!(out.players[1].sport_id, NFL_SPORT_ID);
    }

    #[test]
    fn test_player_dedup_keeps_first_occurrence() {
        let records = vec![
            record(Some("P1"), "First Name", Some(2024), Some(1)),
            record(Some("P2"), "Other", Some(2024), Some(1)),
            record(Some("P1"), "Second Name", Some(2024), Some(2)),
        ];

        let out = reconcile(&records, NFL_SPORT_ID);
        assert_eq!(out.players.len(), 2);
        assert_eq!(out.players[0].full_name.as_deref(), Some("First Name"));
        assert_eq!(out.players[1].player_id, "P2");
        assert_eq!(out.game_stats.len(), 3);
    }

    #[test]
    fn test_missing_player_id_excluded_from_both() {
        let records = vec![
            record(None, "Ghost", Some(2024), Some(1)),
            record(Some(""), "Blank", Some(2024), Some(1)),
        ];

        let out = reconcile(&records, NFL_SPORT_ID);
        assert!(out.players.is_empty());
        assert!(out.game_stats.is_empty());
        assert_eq!(out.skipped(UpsertKind::Player), 2);
        assert_eq!(out.skipped(UpsertKind::GameStat), 2);
    }

    #[test]
    fn test_missing_season_or_week_keeps_player() {
        let records = vec![
            record(Some("P1"), "No Season", None, Some(1)),
            record(Some("P2"), "No Week", Some(2024), None),
            record(Some("P3"), "Week Zero", Some(2024), Some(0)),
        ];

        let out = reconcile(&records, NFL_SPORT_ID);
        assert_eq!(out.players.len(), 3);
        assert!(out.game_stats.is_empty());
        assert_eq!(
            out.skips.iter().map(|s| s.reason).collect::<Vec<_>>(),
            vec![SkipReason::MissingSeason, SkipReason::MissingWeek, SkipReason::MissingWeek]
        );
    }

    #[test]
    fn test_duplicate_game_keys_are_kept_in_order() {
        let mut first = record(Some("P1"), "A", Some(2024), Some(1));
        first.passing_yards = Some(300.0);
        let mut second = first.clone();
        second.passing_yards = Some(310.0);

        let out = reconcile(&[first, second], NFL_SPORT_ID);
        assert_eq!(out.game_stats.len(), 2);
        assert_eq!(out.game_stats[1].stats.passing_yards, Some(310.0));
    }

    #[test]
    fn test_game_date_parsing() {
        assert_eq!(parse_game_date(Some("2024-09-08")), NaiveDate::from_ymd_opt(2024, 9, 8));
        assert_eq!(
            parse_game_date(Some("2024-09-08T00:00:00.000")),
            NaiveDate::from_ymd_opt(2024, 9, 8)
        );
        assert_eq!(parse_game_date(Some("Sunday")), None);
        assert_eq!(parse_game_date(None), None);
    }

    #[test]
    fn test_empty_input() {
        let out = reconcile(&[], NFL_SPORT_ID);
        assert_eq!(out, Reconciled::default());
    }
}
