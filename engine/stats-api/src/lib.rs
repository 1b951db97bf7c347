//! Stats API - read endpoints for the NFL stats dashboard
//!
//! Serves players and game stats written by `stat-ingest`, and proxies
//! current betting odds from The Odds API.

pub mod config;
pub mod error;
pub mod odds;
pub mod rest_api;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use odds::{OddsProvider, TheOddsApiClient};
