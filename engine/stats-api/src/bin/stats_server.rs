//! REST API server for the stats dashboard

use anyhow::Context;
use stat_ingest::{PgStatStore, StatStore};
use stats_api::odds::OddsProvider;
use stats_api::{rest_api, ApiConfig, TheOddsApiClient};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting stats API server...");

    let config = ApiConfig::from_env().context("Failed to load API configuration")?;
    if config.odds.api_key.is_none() {
        warn!("ODDS_API_KEY is not set; /api/nfl/odds will answer with an error");
    }

    let store = PgStatStore::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    let store: Arc<dyn StatStore> = Arc::new(store);

    let odds = TheOddsApiClient::new(config.odds.clone()).context("Failed to create HTTP client")?;
    let odds: Arc<dyn OddsProvider> = Arc::new(odds);

    let routes = rest_api::create_routes(store, odds);

    let addr = config.server_addr().context("Invalid server address")?;
    info!("Starting REST API server on {}", addr);

    warp::serve(routes).run(addr).await;

    Ok(())
}
