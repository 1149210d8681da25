//! Price optimizer: best-response pricing for a batch of products.
//!
//! For every product: resolve demand, seed the search near the competitor
//! price, minimize the payoff cost over the configured price bounds, then
//! re-evaluate the payoff at the minimizer to get the profit contribution.

pub mod payoff;
pub mod solver;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::data::demand::DemandEstimator;
use crate::data::{MarketDataSource, COMPETITOR_PRICE, PRODUCT_NAME};
use crate::types::{
    BatchResult, OptimizationResult, OptimizeRequest, PricingError, ProductQuery, SkipReason,
    SkippedProduct,
};
use payoff::PayoffModel;
use solver::{minimize_bounded, SolverConfig};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Optimizer configuration (defaults, overridden by config.toml at runtime).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    #[serde(flatten)]
    pub payoff: PayoffModel,
    /// Lowest price the search may return.
    pub lower_bound: f64,
    /// Highest price the search may return.
    pub upper_bound: f64,
    /// Seed = competitor price × markup when the competitor price is known.
    pub seed_markup: f64,
    /// Seed when the competitor price is unknown.
    pub fallback_seed: f64,
    pub solver: SolverConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            payoff: PayoffModel::default(),
            lower_bound: 0.0,
            upper_bound: 500.0,
            seed_markup: 1.05,
            fallback_seed: 1.0,
            solver: SolverConfig::default(),
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), PricingError> {
        let s = self.payoff.sensitivity;
        if !(0.0..=1.0).contains(&s) {
            return Err(PricingError::Config(format!(
                "sensitivity must be within [0, 1], got {s}"
            )));
        }
        if !self.payoff.cost_rate.is_finite() || self.payoff.cost_rate < 0.0 {
            return Err(PricingError::Config(format!(
                "cost_rate must be non-negative, got {}",
                self.payoff.cost_rate
            )));
        }
        if !self.lower_bound.is_finite()
            || !self.upper_bound.is_finite()
            || self.lower_bound < 0.0
            || self.lower_bound > self.upper_bound
        {
            return Err(PricingError::Config(format!(
                "price bounds must satisfy 0 <= lower <= upper, got [{}, {}]",
                self.lower_bound, self.upper_bound
            )));
        }
        if self.solver.grid_points < 2 {
            return Err(PricingError::Config("solver.grid_points must be at least 2".into()));
        }
        if self.solver.tolerance.is_nan() || self.solver.tolerance <= 0.0 {
            return Err(PricingError::Config("solver.tolerance must be positive".into()));
        }
        // Grid scan, seed and the first two golden-section probes.
        let minimum_evaluations = self.solver.grid_points.saturating_add(3);
        if self.solver.max_evaluations < minimum_evaluations {
            return Err(PricingError::Config(format!(
                "solver.max_evaluations must be at least grid_points + 3 ({minimum_evaluations}), got {}",
                self.solver.max_evaluations
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Optimizer
// ---------------------------------------------------------------------------

/// Computes best-response prices. Cheap to share behind an `Arc`; holds no
/// mutable state, so concurrent batches never interfere.
pub struct PriceOptimizer {
    config: OptimizerConfig,
    data: Arc<dyn MarketDataSource>,
    demand: Arc<dyn DemandEstimator>,
}

impl PriceOptimizer {
    pub fn new(
        config: OptimizerConfig,
        data: Arc<dyn MarketDataSource>,
        demand: Arc<dyn DemandEstimator>,
    ) -> Result<Self, PricingError> {
        config.validate()?;
        Ok(Self {
            config,
            data,
            demand,
        })
    }

    /// Access the optimizer configuration.
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn payoff(&self) -> &PayoffModel {
        &self.config.payoff
    }

    /// Validate and optimize a raw request of parallel arrays.
    pub fn optimize_request(&self, request: OptimizeRequest) -> Result<BatchResult, PricingError> {
        let queries = request.into_queries()?;
        self.optimize(&queries)
    }

    /// Optimize every product in `queries`.
    ///
    /// The data-source schema is checked once up front; a missing column
    /// fails the whole batch. Products without history or whose search runs
    /// out of budget are skipped and listed in [`BatchResult::skipped`].
    pub fn optimize(&self, queries: &[ProductQuery]) -> Result<BatchResult, PricingError> {
        self.check_schema()?;

        let mut batch = BatchResult::default();
        for query in queries {
            match self.optimize_product(query) {
                Ok(result) => batch.prices.push(result),
                Err(e) if e.is_per_product() => {
                    let reason = match e {
                        PricingError::OptimizationTimeout { .. } => SkipReason::OptimizationTimeout,
                        _ => SkipReason::MissingProductData,
                    };
                    warn!(
                        product = %query.product,
                        reason = %reason,
                        error = %e,
                        "Skipping product"
                    );
                    batch.skipped.push(SkippedProduct {
                        name: query.product.clone(),
                        reason,
                        detail: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        batch.profit = batch.prices.iter().map(|r| r.profit).sum();

        info!(
            requested = queries.len(),
            optimized = batch.prices.len(),
            skipped = batch.skipped.len(),
            profit = format!("{:.2}", batch.profit),
            "Batch optimized"
        );

        Ok(batch)
    }

    /// Best-response price for a single product.
    pub fn optimize_product(&self, query: &ProductQuery) -> Result<OptimizationResult, PricingError> {
        let demand = self.demand.estimate_demand(&query.product)?;
        self.best_response(query, demand)
    }

    /// Solve for the best response given an already-resolved demand.
    ///
    /// With zero inventory the objective is flat in price and the result is
    /// the lower bound.
    pub fn best_response(
        &self,
        query: &ProductQuery,
        demand: f64,
    ) -> Result<OptimizationResult, PricingError> {
        let competitor = query.known_competitor_price();
        let inventory = query.inventory;
        let payoff = self.config.payoff;

        let seed = competitor
            .map(|p| p * self.config.seed_markup)
            .unwrap_or(self.config.fallback_seed);

        let minimum = minimize_bounded(
            |price| payoff.cost(price, competitor, demand, inventory),
            self.config.lower_bound,
            self.config.upper_bound,
            seed,
            &self.config.solver,
        )
        .map_err(|e| PricingError::OptimizationTimeout {
            product: query.product.clone(),
            evaluations: e.budget,
        })?;

        let price = minimum.x;
        let profit = payoff.breakdown(price, competitor, demand, inventory).profit();

        debug!(
            product = %query.product,
            seed = format!("{seed:.2}"),
            price = format!("{price:.4}"),
            profit = format!("{profit:.2}"),
            evaluations = minimum.evaluations,
            "Best response found"
        );

        Ok(OptimizationResult {
            name: query.product.clone(),
            price,
            inventory,
            competitor_price: query.competitor_price,
            demand,
            profit,
        })
    }

    fn check_schema(&self) -> Result<(), PricingError> {
        let demand_columns = self.demand.required_columns();
        let mut required = vec![PRODUCT_NAME, COMPETITOR_PRICE];
        required.extend(demand_columns.iter().map(String::as_str));

        let missing = self.data.missing_columns(&required);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PricingError::Validation(format!(
                "market data is missing required columns: {}",
                missing.join(", ")
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
