//! Continuous refresh loop.
//!
//! On a fixed interval, draws synthetic competitor prices and inventory
//! levels for the top-N products, runs the optimizer and publishes the
//! result to the [`SharedPriceBoard`]. A failed iteration is logged and the
//! previous board stays visible.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::board::SharedPriceBoard;
use crate::data::{MarketDataSource, SEASON, WEATHER};
use crate::pricing::PriceOptimizer;
use crate::types::{BoardEntry, PriceBoard, PricingError, ProductQuery};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Refresh loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    /// Number of products on the board, taken in dataset order.
    pub top_n: usize,
    pub competitor_price_min: f64,
    pub competitor_price_max: f64,
    pub inventory_min: f64,
    pub inventory_max: f64,
    /// Fixed RNG seed for reproducible boards. Random when unset.
    pub seed: Option<u64>,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 10,
            top_n: 10,
            competitor_price_min: 50.0,
            competitor_price_max: 200.0,
            inventory_min: 10.0,
            inventory_max: 500.0,
            seed: None,
        }
    }
}

impl RefreshConfig {
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.interval_secs == 0 {
            return Err(PricingError::Config("refresh.interval_secs must be positive".into()));
        }
        if self.top_n == 0 {
            return Err(PricingError::Config("refresh.top_n must be positive".into()));
        }
        check_range(
            "competitor_price",
            self.competitor_price_min,
            self.competitor_price_max,
        )?;
        check_range("inventory", self.inventory_min, self.inventory_max)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn check_range(name: &str, min: f64, max: f64) -> Result<(), PricingError> {
    if !min.is_finite() || !max.is_finite() || min < 0.0 || min > max {
        return Err(PricingError::Config(format!(
            "refresh.{name} range must satisfy 0 <= min <= max, got [{min}, {max}]"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Refresh loop
// ---------------------------------------------------------------------------

/// Background task that keeps the price board current.
pub struct RefreshLoop {
    optimizer: Arc<PriceOptimizer>,
    data: Arc<dyn MarketDataSource>,
    board: SharedPriceBoard,
    config: RefreshConfig,
    products: Vec<String>,
    rng: StdRng,
}

impl RefreshLoop {
    /// Fix the product subset from the first `top_n` distinct products.
    pub fn new(
        optimizer: Arc<PriceOptimizer>,
        data: Arc<dyn MarketDataSource>,
        board: SharedPriceBoard,
        config: RefreshConfig,
    ) -> Result<Self, PricingError> {
        config.validate()?;

        let products: Vec<String> = data.product_names().into_iter().take(config.top_n).collect();
        if products.is_empty() {
            return Err(PricingError::Validation(
                "market data has no products to put on the board".into(),
            ));
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            optimizer,
            data,
            board,
            config,
            products,
            rng,
        })
    }

    /// Products covered by every board this loop publishes.
    pub fn products(&self) -> &[String] {
        &self.products
    }

    /// Run one iteration: sample conditions, optimize, publish.
    ///
    /// Returns the generation of the published board. Nothing is published
    /// unless every product on the board was priced.
    pub fn refresh_once(&mut self) -> Result<u64, PricingError> {
        let queries: Vec<ProductQuery> = self
            .products
            .clone()
            .into_iter()
            .map(|product| {
                let competitor = self
                    .rng
                    .gen_range(self.config.competitor_price_min..=self.config.competitor_price_max);
                let inventory = self
                    .rng
                    .gen_range(self.config.inventory_min..=self.config.inventory_max);
                ProductQuery::new(product, Some(competitor), inventory)
            })
            .collect();

        let batch = self.optimizer.optimize(&queries)?;
        if batch.prices.len() != queries.len() {
            return Err(PricingError::IncompleteBoard {
                expected: queries.len(),
                produced: batch.prices.len(),
            });
        }

        let entries = batch
            .prices
            .iter()
            .zip(&queries)
            .map(|(result, query)| {
                let history = self.data.product_rows(&result.name);
                let attribute = |column: &str| {
                    history
                        .iter()
                        .find_map(|row| row.text(column))
                        .map(String::from)
                };
                BoardEntry {
                    name: result.name.clone(),
                    price: result.price,
                    competitor_price: query.competitor_price.unwrap_or_default(),
                    inventory: result.inventory,
                    profit: result.profit,
                    season: attribute(SEASON),
                    weather: attribute(WEATHER),
                }
            })
            .collect();

        let generation = self.board.publish(PriceBoard {
            generation: 0,
            published_at: Utc::now(),
            entries,
            expected_profit: batch.profit,
        });

        debug!(
            generation,
            products = queries.len(),
            profit = format!("{:.2}", batch.profit),
            "Price board published"
        );

        Ok(generation)
    }

    /// Refresh every interval until `shutdown` flips to `true` or its sender
    /// is dropped. The first refresh happens immediately.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.config.interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(
            interval_secs = self.config.interval_secs,
            products = self.products.len(),
            "Refresh loop started"
        );

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Refresh loop stopping");
                        break;
                    }
                }
                _ = interval.tick() => {
                    match self.refresh_once() {
                        Ok(generation) => info!(generation, "Price board refreshed"),
                        Err(e) => error!(
                            error = %e,
                            "Refresh failed, keeping previous board"
                        ),
                    }
                }
            }
        }
    }

    /// Start the loop on the runtime and return a handle that stops it.
    pub fn spawn(self) -> RefreshHandle {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(self.run(rx));
        RefreshHandle { shutdown, task }
    }
}

/// Stop signal and join handle for a spawned [`RefreshLoop`].
pub struct RefreshHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Signal the loop and wait for it to exit.
    pub async fn stop(self) -> Result<(), tokio::task::JoinError> {
        let _ = self.shutdown.send(true);
        self.task.await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
