//! Shared types for the pricing engine.
//!
//! These types form the data model passed between the data layer, the
//! optimizer, the refresh loop and the HTTP boundary. None of them carry
//! identity beyond a single call: a batch is a value, recomputed from inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Optimizer input
// ---------------------------------------------------------------------------

/// One product's optimization input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductQuery {
    pub product: String,
    /// Competitor price. `None` or a non-positive value means "unknown".
    pub competitor_price: Option<f64>,
    /// Units available to sell.
    pub inventory: f64,
}

impl ProductQuery {
    pub fn new(product: impl Into<String>, competitor_price: Option<f64>, inventory: f64) -> Self {
        Self {
            product: product.into(),
            competitor_price,
            inventory,
        }
    }

    /// Competitor price if it is known and strictly positive.
    pub fn known_competitor_price(&self) -> Option<f64> {
        self.competitor_price.filter(|p| *p > 0.0)
    }
}

/// Raw batch request as submitted by a caller: three parallel arrays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub product_names: Vec<String>,
    pub quantities: Vec<f64>,
    /// May be omitted entirely, meaning every competitor price is unknown.
    #[serde(default)]
    pub competitor_prices: Option<Vec<Option<f64>>>,
}

impl OptimizeRequest {
    /// Zip the parallel arrays into product queries.
    ///
    /// Fails with [`PricingError::Validation`] when the arrays disagree in
    /// length or a quantity is negative or not finite.
    pub fn into_queries(self) -> Result<Vec<ProductQuery>, PricingError> {
        let names = self.product_names.len();
        if self.quantities.len() != names {
            return Err(PricingError::Validation(format!(
                "product_names has {names} entries but quantities has {}",
                self.quantities.len()
            )));
        }

        let competitor_prices = match self.competitor_prices {
            Some(prices) if prices.len() != names => {
                return Err(PricingError::Validation(format!(
                    "product_names has {names} entries but competitor_prices has {}",
                    prices.len()
                )));
            }
            Some(prices) => prices,
            None => vec![None; names],
        };

        self.product_names
            .into_iter()
            .zip(self.quantities)
            .zip(competitor_prices)
            .map(|((product, inventory), competitor_price)| {
                if !inventory.is_finite() || inventory < 0.0 {
                    return Err(PricingError::Validation(format!(
                        "quantity for '{product}' must be a non-negative number, got {inventory}"
                    )));
                }
                if let Some(price) = competitor_price {
                    if !price.is_finite() || price < 0.0 {
                        return Err(PricingError::Validation(format!(
                            "competitor price for '{product}' must be non-negative, got {price}"
                        )));
                    }
                }
                Ok(ProductQuery::new(product, competitor_price, inventory))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Optimizer output
// ---------------------------------------------------------------------------

/// One product's best-response price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub name: String,
    pub price: f64,
    pub inventory: f64,
    /// Competitor price exactly as submitted, including non-positive values
    /// that were priced as unknown.
    pub competitor_price: Option<f64>,
    pub demand: f64,
    /// Realized profit at `price` (revenue minus holding cost). May be negative.
    pub profit: f64,
}

impl fmt::Display for OptimizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: price={:.2} inventory={:.1} demand={:.1} profit={:.2}",
            self.name, self.price, self.inventory, self.demand, self.profit
        )
    }
}

/// Why a product was left out of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingProductData,
    OptimizationTimeout,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingProductData => write!(f, "missing product data"),
            SkipReason::OptimizationTimeout => write!(f, "optimization timeout"),
        }
    }
}

/// A product that did not produce a result, with the diagnostic message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedProduct {
    pub name: String,
    pub reason: SkipReason,
    pub detail: String,
}

/// Results for a whole batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub prices: Vec<OptimizationResult>,
    /// Sum of per-product profit contributions.
    pub profit: f64,
    #[serde(default)]
    pub skipped: Vec<SkippedProduct>,
}

impl BatchResult {
    /// True when at least one product was skipped.
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Price board
// ---------------------------------------------------------------------------

/// One row of the live price board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardEntry {
    pub name: String,
    pub price: f64,
    pub competitor_price: f64,
    pub inventory: f64,
    pub profit: f64,
    pub season: Option<String>,
    pub weather: Option<String>,
}

/// A complete, immutable snapshot published by the refresh loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBoard {
    /// Monotonic publication counter; 0 means nothing published yet.
    pub generation: u64,
    pub published_at: DateTime<Utc>,
    pub entries: Vec<BoardEntry>,
    pub expected_profit: f64,
}

impl PriceBoard {
    /// The board visible before the first refresh completes.
    pub fn empty() -> Self {
        Self {
            generation: 0,
            published_at: Utc::now(),
            entries: Vec::new(),
            expected_profit: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PriceBoard {
    fn default() -> Self {
        Self::empty()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain errors raised by the pricing engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No historical data for product '{product}'")]
    MissingProductData { product: String },

    #[error("Optimization for '{product}' did not converge within {evaluations} evaluations")]
    OptimizationTimeout { product: String, evaluations: usize },

    #[error("Board refresh priced {produced} of {expected} products")]
    IncompleteBoard { expected: usize, produced: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PricingError {
    /// Errors that drop a single product but let the batch continue.
    pub fn is_per_product(&self) -> bool {
        matches!(
            self,
            PricingError::MissingProductData { .. } | PricingError::OptimizationTimeout { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
