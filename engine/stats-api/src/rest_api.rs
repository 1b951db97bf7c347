//! REST API endpoints for the stats dashboard
//!
//! Player list, player detail with game stats, and a pass-through of current
//! betting odds. All endpoints are read-only.

use crate::error::{ApiError, ErrorResponse};
use crate::odds::OddsProvider;
use serde::{Deserialize, Serialize};
use stat_ingest::{GameStatRow, StatStore};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, error};
use warp::http::StatusCode;
use warp::{Filter, Reply};

/// Player detail response
#[derive(Debug, Serialize, Deserialize)]
pub struct PlayerDetailResponse {
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub team: Option<String>,
    pub game_stats: Vec<GameStatRow>,
}

/// Body returned when no games currently have odds
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

pub const NO_ODDS_MESSAGE: &str = "No upcoming games with odds found.";

/// List all players as id and name, ordered by name
pub async fn list_players(
    store: Arc<dyn StatStore>,
) -> Result<warp::reply::Response, warp::Rejection> {
    match store.list_players().await {
        Ok(players) => Ok(warp::reply::json(&players).into_response()),
        Err(e) => {
            error!("Failed to fetch players: {}", e);
            Err(warp::reject::custom(ApiError::PlayersUnavailable(e.to_string())))
        }
    }
}

/// Get one player's identity and all of their stored game stats
pub async fn get_player_detail(
    player_id: String,
    store: Arc<dyn StatStore>,
) -> Result<warp::reply::Response, warp::Rejection> {
    let profile = match store.get_player(&player_id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => return Err(warp::reject::custom(ApiError::PlayerNotFound(player_id))),
        Err(e) => {
            // A failed lookup is reported the same way as a missing player
            debug!("Player lookup for {} failed: {}", player_id, e);
            return Err(warp::reject::custom(ApiError::PlayerNotFound(player_id)));
        }
    };

    let game_stats = store
        .game_stats_for(&player_id)
        .await
        .map_err(|e| warp::reject::custom(ApiError::GameStats(e.to_string())))?;

    let response = PlayerDetailResponse {
        full_name: profile.full_name,
        position: profile.position,
        team: profile.team,
        game_stats,
    };
    Ok(warp::reply::json(&response).into_response())
}

/// Current odds for upcoming games
pub async fn get_current_odds(
    odds: Arc<dyn OddsProvider>,
) -> Result<warp::reply::Response, warp::Rejection> {
    let games = odds.current_odds().await.map_err(warp::reject::custom)?;

    if games.is_empty() {
        let body = MessageResponse { message: NO_ODDS_MESSAGE.to_string() };
        return Ok(warp::reply::json(&body).into_response());
    }

    Ok(warp::reply::json(&games).into_response())
}

/// Turn rejections into JSON error bodies
pub async fn handle_rejection(err: warp::Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if let Some(api_error) = err.find::<ApiError>() {
        (api_error.status(), api_error.to_response().error)
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        error!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
    };

    Ok(warp::reply::with_status(warp::reply::json(&ErrorResponse { error: message }), status))
}

/// Create all REST API routes
pub fn create_routes(
    store: Arc<dyn StatStore>,
    odds: Arc<dyn OddsProvider>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let store_filter = warp::any().map(move || store.clone());
    let odds_filter = warp::any().map(move || odds.clone());

    let players = warp::path("api")
        .and(warp::path("nfl"))
        .and(warp::path("players"))
        .and(warp::path::end())
        .and(warp::get())
        .and(store_filter.clone())
        .and_then(list_players);

    let player_detail = warp::path("api")
        .and(warp::path("nfl"))
        .and(warp::path("stats"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(store_filter)
        .and_then(get_player_detail);

    let current_odds = warp::path("api")
        .and(warp::path("nfl"))
        .and(warp::path("odds"))
        .and(warp::path::end())
        .and(warp::get())
        .and(odds_filter)
        .and_then(get_current_odds);

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({ "status": "ok" })));

    players
        .or(player_detail)
        .or(current_odds)
        .or(health)
        .recover(handle_rejection)
        .with(
            warp::cors()
                .allow_any_origin()
                .allow_headers(vec!["content-type"])
                .allow_methods(vec!["GET", "OPTIONS"]),
        )
}
