//! Vendor payoff model.
//!
//! Maps a candidate vendor price to a scalar cost (negative profit) given the
//! competitor's price, estimated demand and available inventory. The solver
//! evaluates this many times per product, so it must stay pure.

use serde::{Deserialize, Serialize};

/// Tunable constants of the demand-response and holding-cost model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayoffModel {
    /// How strongly the relative gap to the reference price suppresses
    /// demand. Must lie in [0, 1].
    pub sensitivity: f64,
    /// Carrying cost per unit of inventory, as a fraction of the reference
    /// price. Applied to all stock, sold or not.
    pub cost_rate: f64,
}

impl Default for PayoffModel {
    fn default() -> Self {
        Self {
            sensitivity: 0.7,
            cost_rate: 0.01,
        }
    }
}

/// Every intermediate quantity of a single payoff evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayoffBreakdown {
    pub reference_price: f64,
    pub adjusted_demand: f64,
    pub units_sold: f64,
    pub revenue: f64,
    pub holding_cost: f64,
}

impl PayoffBreakdown {
    pub fn profit(&self) -> f64 {
        self.revenue - self.holding_cost
    }

    /// The minimized objective: negative profit.
    pub fn cost(&self) -> f64 {
        -self.profit()
    }
}

impl PayoffModel {
    pub fn new(sensitivity: f64, cost_rate: f64) -> Self {
        Self {
            sensitivity,
            cost_rate,
        }
    }

    /// Evaluate the model and keep the intermediate terms.
    ///
    /// A missing or non-positive competitor price makes the vendor price its
    /// own reference, which zeroes the price-gap term instead of dividing by
    /// zero.
    pub fn breakdown(
        &self,
        vendor_price: f64,
        competitor_price: Option<f64>,
        demand: f64,
        inventory: f64,
    ) -> PayoffBreakdown {
        let reference_price = match competitor_price {
            Some(p) if p > 0.0 => p,
            _ => vendor_price,
        };

        let relative_gap = if reference_price > 0.0 {
            (vendor_price - reference_price) / reference_price
        } else {
            0.0
        };

        let adjusted_demand = (demand * (1.0 - self.sensitivity * relative_gap)).max(0.0);
        let units_sold = inventory.min(adjusted_demand);
        let revenue = vendor_price * units_sold;
        let holding_cost = self.cost_rate * reference_price * inventory;

        PayoffBreakdown {
            reference_price,
            adjusted_demand,
            units_sold,
            revenue,
            holding_cost,
        }
    }

    /// Cost of pricing at `vendor_price`. Lower is better.
    pub fn cost(
        &self,
        vendor_price: f64,
        competitor_price: Option<f64>,
        demand: f64,
        inventory: f64,
    ) -> f64 {
        self.breakdown(vendor_price, competitor_price, demand, inventory)
            .cost()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
