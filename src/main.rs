//! Pricing engine, best-response vendor pricing service.
//!
//! Entry point. Loads configuration, initialises structured logging, loads
//! the market dataset, starts the price-board refresh loop and serves the
//! JSON API until Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use pricing_engine::config;
use pricing_engine::dashboard::{self, routes::ServiceState};
use pricing_engine::data::demand::HistoricalMeanDemand;
use pricing_engine::data::{MarketDataSource, MarketDataset};
use pricing_engine::engine::board::SharedPriceBoard;
use pricing_engine::engine::refresh::RefreshLoop;
use pricing_engine::pricing::PriceOptimizer;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::var("PRICING_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let cfg = config::AppConfig::load(&config_path)?;

    init_logging();

    info!(
        service = %cfg.service.name,
        dataset = %cfg.service.dataset_path.display(),
        lower_bound = cfg.optimizer.lower_bound,
        upper_bound = cfg.optimizer.upper_bound,
        "Pricing engine starting up"
    );

    // -- Initialise components -------------------------------------------

    let data: Arc<dyn MarketDataSource> = Arc::new(MarketDataset::load(&cfg.service.dataset_path)?);
    let demand = Arc::new(HistoricalMeanDemand::new(Arc::clone(&data), cfg.demand.clone()));
    let optimizer = Arc::new(PriceOptimizer::new(
        cfg.optimizer.clone(),
        Arc::clone(&data),
        demand,
    )?);
    let board = SharedPriceBoard::new();

    let refresh = if cfg.refresh.enabled {
        let refresh_loop = RefreshLoop::new(
            Arc::clone(&optimizer),
            Arc::clone(&data),
            board.clone(),
            cfg.refresh.clone(),
        )?;
        Some(refresh_loop.spawn())
    } else {
        info!("Refresh loop disabled");
        None
    };

    // -- Serve until Ctrl+C ------------------------------------------------

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
        }
        info!("Shutdown signal received.");
    };

    if cfg.dashboard.enabled {
        let state = Arc::new(ServiceState::new(Arc::clone(&optimizer), board.clone()));
        dashboard::serve(state, cfg.dashboard.port, shutdown).await?;
    } else {
        info!("API disabled. Press Ctrl+C to stop.");
        shutdown.await;
    }

    if let Some(handle) = refresh {
        if let Err(e) = handle.stop().await {
            warn!(error = %e, "Refresh loop did not stop cleanly");
        }
    }

    let latest = board.latest();
    info!(
        generation = latest.generation,
        products = latest.len(),
        "Pricing engine shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pricing_engine=info"));

    let json_logging = std::env::var("PRICING_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
