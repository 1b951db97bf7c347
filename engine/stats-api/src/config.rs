//! Configuration for the stats API server

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use stat_ingest::config::DatabaseConfig;
use std::net::SocketAddr;

/// Main configuration for the stats API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Odds upstream configuration
    pub odds: OddsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,
}

/// The Odds API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsConfig {
    pub base_url: String,

    /// Sport key (e.g., "americanfootball_nfl")
    pub sport: String,

    /// Bookmaker regions: us, uk, eu, au
    pub regions: String,

    /// Markets: h2h (moneyline), spreads, totals
    pub markets: String,

    /// API key; the odds endpoint answers 500 while unset
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: stat_ingest::IngestConfig::default().database,
            odds: OddsConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8081 }
    }
}

impl Default for OddsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.the-odds-api.com/v4".to_string(),
            sport: "americanfootball_nfl".to_string(),
            regions: "us".to_string(),
            markets: "h2h,spreads".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Load configuration from `stats-api.toml`, `STATS_API_*` variables,
    /// `DATABASE_URL` and `ODDS_API_KEY`
    pub fn from_env() -> Result<Self, ApiError> {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default()).map_err(config_error)?)
            .add_source(config::File::with_name("stats-api").required(false))
            .add_source(
                config::Environment::with_prefix("STATS_API")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_error)?;

        let mut config: Self = settings.try_deserialize().map_err(config_error)?;

        if let Ok(db_url) = std::env::var("DATABASE_URL") {
            config.database.url = db_url;
        }

        if let Ok(key) = std::env::var("ODDS_API_KEY") {
            if !key.trim().is_empty() {
                config.odds.api_key = Some(key);
            }
        }

        Ok(config)
    }

    /// Get the server address
    pub fn server_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}

fn config_error(err: config::ConfigError) -> ApiError {
    ApiError::Config(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_addr() {
        let config = ApiConfig::default();
        assert_eq!(config.server_addr().unwrap().port(), 8081);
    }

    #[test]
    fn test_default_odds_query() {
        let odds = OddsConfig::default();
        assert_eq!(odds.sport, "americanfootball_nfl");
        assert_eq!(odds.markets, "h2h,spreads");
        assert!(odds.api_key.is_none());
    }
}
