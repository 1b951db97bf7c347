//! Client for The Odds API

use crate::config::OddsConfig;
use crate::error::{ApiError, ApiResult};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

/// Source of current betting odds
///
/// Upcoming games are returned as the upstream JSON objects, untouched.
#[async_trait::async_trait]
pub trait OddsProvider: Send + Sync {
    async fn current_odds(&self) -> ApiResult<Vec<Value>>;
}

/// Fetches odds from `https://api.the-odds-api.com`
pub struct TheOddsApiClient {
    config: OddsConfig,
    client: Client,
}

impl TheOddsApiClient {
    pub fn new(config: OddsConfig) -> ApiResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self { config, client })
    }

    fn odds_url(&self) -> String {
        format!("{}/sports/{}/odds/", self.config.base_url.trim_end_matches('/'), self.config.sport)
    }
}

#[async_trait::async_trait]
impl OddsProvider for TheOddsApiClient {
    async fn current_odds(&self) -> ApiResult<Vec<Value>> {
        let api_key = self.config.api_key.as_deref().ok_or(ApiError::OddsNotConfigured)?;

        info!("Fetching data from The Odds API...");

        let response = self
            .client
            .get(self.odds_url())
            .query(&[
                ("regions", self.config.regions.as_str()),
                ("markets", self.config.markets.as_str()),
                ("apiKey", api_key),
            ])
            .send()
            .await
            .map_err(|e| upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream(format!("status {status}: {body}")));
        }

        response.json::<Vec<Value>>().await.map_err(|e| upstream(e.to_string()))
    }
}

fn upstream(reason: String) -> ApiError {
    error!("Error fetching odds: {}", reason);
    ApiError::OddsUpstream(reason)
}
