//! Mock market data source for integration testing.
//!
//! Provides a deterministic `MarketDataSource` whose columns and rows are
//! fully controllable from test code, plus helpers to wire an optimizer
//! around it.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use pricing_engine::data::demand::{DemandConfig, HistoricalMeanDemand};
use pricing_engine::data::{
    MarketDataSource, MarketRecord, COMPETITOR_PRICE, INVENTORY_LEVELS, PRODUCT_NAME,
};
use pricing_engine::pricing::{OptimizerConfig, PriceOptimizer};

/// In-memory market table with removable columns and a lookup log.
pub struct MockMarket {
    records: Vec<MarketRecord>,
    dropped_columns: HashSet<String>,
    lookups: Mutex<Vec<String>>,
}

impl MockMarket {
    /// Rows chosen so the default demand multiplier gives round numbers:
    /// Apple 40, Pear 10, plus ten "Crop-N" products for board tests.
    pub fn new() -> Self {
        let mut records = vec![
            MarketRecord::new("Apple", Some(100.0), 45.0),
            MarketRecord::new("Apple", Some(102.0), 55.0),
            MarketRecord::new("Pear", None, 12.5),
        ];
        for i in 0..10 {
            records.push(
                MarketRecord::new(&format!("Crop-{i}"), Some(80.0 + i as f64), 100.0 + 10.0 * i as f64)
                    .with("Season", "Winter"),
            );
        }
        Self {
            records,
            dropped_columns: HashSet::new(),
            lookups: Mutex::new(Vec::new()),
        }
    }

    /// Hide a column from `columns()`, as if the table never had it.
    pub fn without_column(mut self, column: &str) -> Self {
        self.dropped_columns.insert(column.to_string());
        self
    }

    /// Product names looked up so far, in call order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

impl MarketDataSource for MockMarket {
    fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self
            .records
            .iter()
            .flat_map(|r| r.columns().map(String::from).collect::<Vec<_>>())
            .filter(|c| !self.dropped_columns.contains(c))
            .collect();
        columns.sort();
        columns.dedup();
        columns
    }

    fn product_rows(&self, product: &str) -> Vec<&MarketRecord> {
        self.lookups.lock().unwrap().push(product.to_string());
        self.records
            .iter()
            .filter(|r| r.product_name() == Some(product))
            .collect()
    }

    fn product_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for name in self.records.iter().filter_map(|r| r.product_name()) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }
}

/// Optimizer with default settings over `market`.
pub fn optimizer_over(market: Arc<MockMarket>) -> PriceOptimizer {
    let data: Arc<dyn MarketDataSource> = market;
    let demand = Arc::new(HistoricalMeanDemand::new(Arc::clone(&data), DemandConfig::default()));
    PriceOptimizer::new(OptimizerConfig::default(), data, demand).unwrap()
}

#[test]
fn mock_reports_standard_columns() {
    let market = MockMarket::new();
    let columns = market.columns();
    for required in [PRODUCT_NAME, COMPETITOR_PRICE, INVENTORY_LEVELS] {
        assert!(columns.iter().any(|c| c == required), "missing {required}");
    }
    assert!(!MockMarket::new()
        .without_column(COMPETITOR_PRICE)
        .has_column(COMPETITOR_PRICE));
}
