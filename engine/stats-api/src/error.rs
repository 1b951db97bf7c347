//! Error types for the stats API

use serde::Serialize;
use thiserror::Error;
use warp::http::StatusCode;

/// Errors surfaced by the read endpoints
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Player not found")]
    PlayerNotFound(String),

    #[error("Failed to fetch players")]
    PlayersUnavailable(String),

    #[error("Error fetching game stats: {0}")]
    GameStats(String),

    #[error("Odds API key is not configured")]
    OddsNotConfigured,

    #[error("Failed to fetch odds data.")]
    OddsUpstream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl warp::reject::Reject for ApiError {}

/// JSON body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::PlayerNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse { error: self.to_string() }
    }
}

/// Result type for stats API operations
pub type ApiResult<T> = Result<T, ApiError>;
