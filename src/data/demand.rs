//! Demand estimation.
//!
//! The optimizer asks a [`DemandEstimator`] for each product's demand. The
//! default [`HistoricalMeanDemand`] averages a historical column and scales
//! it by a fixed multiplier; it is a proxy, so anything smarter can plug in
//! behind the same trait.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::{MarketDataSource, INVENTORY_LEVELS};
use crate::types::PricingError;

/// Estimates demand for a single product.
#[cfg_attr(test, mockall::automock)]
pub trait DemandEstimator: Send + Sync {
    /// Expected units demanded. Fails with
    /// [`PricingError::MissingProductData`] when the product has no history.
    fn estimate_demand(&self, product: &str) -> Result<f64, PricingError>;

    /// Data-source columns this estimator reads.
    fn required_columns(&self) -> Vec<String>;
}

/// Settings for [`HistoricalMeanDemand`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemandConfig {
    /// Column averaged as the demand signal.
    pub column: String,
    /// Scale applied to the historical mean.
    pub multiplier: f64,
}

impl Default for DemandConfig {
    fn default() -> Self {
        Self {
            column: INVENTORY_LEVELS.to_string(),
            multiplier: 0.8,
        }
    }
}

impl DemandConfig {
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.column.trim().is_empty() {
            return Err(PricingError::Config("demand column must not be empty".into()));
        }
        if !self.multiplier.is_finite() || self.multiplier < 0.0 {
            return Err(PricingError::Config(format!(
                "demand multiplier must be non-negative, got {}",
                self.multiplier
            )));
        }
        Ok(())
    }
}

/// Mean of a product's historical column times a multiplier.
pub struct HistoricalMeanDemand {
    data: Arc<dyn MarketDataSource>,
    config: DemandConfig,
}

impl HistoricalMeanDemand {
    pub fn new(data: Arc<dyn MarketDataSource>, config: DemandConfig) -> Self {
        Self { data, config }
    }
}

impl DemandEstimator for HistoricalMeanDemand {
    fn estimate_demand(&self, product: &str) -> Result<f64, PricingError> {
        let values: Vec<f64> = self
            .data
            .product_rows(product)
            .into_iter()
            .filter_map(|row| row.number(&self.config.column))
            .collect();

        if values.is_empty() {
            return Err(PricingError::MissingProductData {
                product: product.to_string(),
            });
        }

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let demand = (mean * self.config.multiplier).max(0.0);

        debug!(
            product,
            samples = values.len(),
            mean = format!("{mean:.3}"),
            demand = format!("{demand:.3}"),
            "Demand estimated"
        );

        Ok(demand)
    }

    fn required_columns(&self) -> Vec<String> {
        vec![self.config.column.clone()]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
