use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Sport identifier written to every player row
pub const NFL_SPORT_ID: i32 = 1;

/// One row of the raw weekly stat feed, as emitted by the source script
///
/// Every field is optional because the feed writes `null` for missing values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawStatRecord {
    #[serde(default)]
    pub player_id: Option<String>,

    #[serde(default)]
    pub player_display_name: Option<String>,

    #[serde(default)]
    pub position: Option<String>,

    /// Team abbreviation (e.g., "NYJ")
    #[serde(default)]
    pub recent_team: Option<String>,

    #[serde(default, deserialize_with = "lenient_int")]
    pub season: Option<i32>,

    #[serde(default, deserialize_with = "lenient_int")]
    pub week: Option<i32>,

    /// Game date in `YYYY-MM-DD` form
    #[serde(default)]
    pub gameday: Option<String>,

    #[serde(default)]
    pub passing_yards: Option<f64>,

    #[serde(default)]
    pub passing_tds: Option<f64>,

    #[serde(default)]
    pub rushing_yards: Option<f64>,

    #[serde(default)]
    pub receptions: Option<f64>,

    #[serde(default)]
    pub receiving_yards: Option<f64>,

    #[serde(default)]
    pub fantasy_points_ppr: Option<f64>,
}

/// Per-game metrics stored in the `game_stats.stats` blob
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StatLine {
    pub passing_yards: Option<f64>,
    pub passing_tds: Option<f64>,
    pub rushing_yards: Option<f64>,
    pub receptions: Option<f64>,
    pub receiving_yards: Option<f64>,
    pub fantasy_points_ppr: Option<f64>,
}

/// Row written to `players`, keyed by `player_id`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerUpsert {
    pub player_id: String,
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub team: Option<String>,
    pub sport_id: i32,
}

/// Row written to `game_stats`, keyed by `(player_id, season, week)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameStatUpsert {
    pub player_id: String,
    pub season: i32,
    pub week: i32,
    pub game_date: Option<NaiveDate>,
    pub stats: StatLine,
}

impl GameStatUpsert {
    /// Natural key of the row
    pub fn key(&self) -> (&str, i32, i32) {
        (&self.player_id, self.season, self.week)
    }
}

/// Entry of the player list endpoint
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlayerSummary {
    pub player_id: String,
    pub full_name: Option<String>,
}

/// Identity columns of a stored player
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlayerProfile {
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub team: Option<String>,
}

/// One stored game line as returned by the detail endpoint
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GameStatRow {
    pub season: i32,
    pub week: i32,
    pub game_date: Option<NaiveDate>,
    pub stats: StatLine,
}

impl RawStatRecord {
    /// Metrics bag of this record
    pub fn stat_line(&self) -> StatLine {
        StatLine {
            passing_yards: self.passing_yards,
            passing_tds: self.passing_tds,
            rushing_yards: self.rushing_yards,
            receptions: self.receptions,
            receiving_yards: self.receiving_yards,
            fantasy_points_ppr: self.fantasy_points_ppr,
        }
    }
}

/// Accepts `2024`, `2024.0` or `null`.
///
/// Dataframe exports widen integer columns holding nulls to floats.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Option::<serde_json::Number>::deserialize(deserializer)?;
    let Some(number) = value else {
        return Ok(None);
    };

    if let Some(n) = number.as_i64() {
        return i32::try_from(n).map(Some).map_err(D::Error::custom);
    }

    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 => {
            Ok(Some(f as i32))
        }
        _ => Err(D::Error::custom(format!("expected an integer, found {number}"))),
    }
}
