//! Market data sources.
//!
//! The optimizer reads historical market rows through the
//! [`MarketDataSource`] trait. The in-memory [`MarketDataset`] is the
//! default implementation, loaded from a JSON array of row objects keyed
//! by column name.

pub mod demand;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

/// Column holding the product identifier.
pub const PRODUCT_NAME: &str = "Product Name";
/// Column holding the observed competitor price.
pub const COMPETITOR_PRICE: &str = "Competitor Price";
/// Column used as the default demand proxy.
pub const INVENTORY_LEVELS: &str = "Inventory Levels (kg)";
pub const SEASON: &str = "Season";
pub const WEATHER: &str = "Weather";

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One row of the market table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketRecord {
    cells: Map<String, Value>,
}

impl MarketRecord {
    /// A row with the three standard columns filled in.
    pub fn new(product: &str, competitor_price: Option<f64>, inventory_level: f64) -> Self {
        Self::default()
            .with(PRODUCT_NAME, product)
            .with(COMPETITOR_PRICE, competitor_price)
            .with(INVENTORY_LEVELS, inventory_level)
    }

    /// Set a cell, replacing any existing value.
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.cells.insert(column.to_string(), value.into());
        self
    }

    pub fn from_cells(cells: Map<String, Value>) -> Self {
        Self { cells }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn product_name(&self) -> Option<&str> {
        self.text(PRODUCT_NAME)
    }

    /// Text cell, or `None` when missing or not a string.
    pub fn text(&self, column: &str) -> Option<&str> {
        self.cells.get(column).and_then(Value::as_str)
    }

    /// Numeric cell. Numeric strings are accepted; null and non-finite values
    /// read as missing.
    pub fn number(&self, column: &str) -> Option<f64> {
        let value = match self.cells.get(column)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        value.filter(|v| v.is_finite())
    }
}

// ---------------------------------------------------------------------------
// Data source
// ---------------------------------------------------------------------------

/// Tabular market history, queryable by exact product name.
pub trait MarketDataSource: Send + Sync {
    /// Every column present in the table.
    fn columns(&self) -> Vec<String>;

    /// Rows whose product name matches exactly. Possibly empty.
    fn product_rows(&self, product: &str) -> Vec<&MarketRecord>;

    /// Distinct product names in first-seen order.
    fn product_names(&self) -> Vec<String>;

    fn has_column(&self, column: &str) -> bool {
        self.columns().iter().any(|c| c == column)
    }

    /// Required columns that are absent, in the order given.
    fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        let columns = self.columns();
        required
            .iter()
            .filter(|r| !columns.iter().any(|c| c == *r))
            .map(|r| r.to_string())
            .collect()
    }
}

/// In-memory market table.
#[derive(Debug, Clone, Default)]
pub struct MarketDataset {
    columns: BTreeSet<String>,
    records: Vec<MarketRecord>,
}

impl MarketDataset {
    pub fn new(records: Vec<MarketRecord>) -> Self {
        let columns = records
            .iter()
            .flat_map(|r| r.columns().map(String::from))
            .collect();
        Self { columns, records }
    }

    /// Declare a column even if no row carries it (an empty table still has
    /// a header).
    pub fn with_column(mut self, column: &str) -> Self {
        self.columns.insert(column.to_string());
        self
    }

    /// Parse a JSON array of row objects.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let rows: Vec<Map<String, Value>> =
            serde_json::from_str(json).context("Market data must be a JSON array of objects")?;
        Ok(Self::new(rows.into_iter().map(MarketRecord::from_cells).collect()))
    }

    /// Load a dataset file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read market data: {}", path.display()))?;
        let dataset = Self::from_json_str(&json)
            .with_context(|| format!("Failed to parse market data: {}", path.display()))?;

        info!(
            path = %path.display(),
            rows = dataset.len(),
            products = dataset.product_names().len(),
            columns = dataset.columns.len(),
            "Market data loaded"
        );
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl MarketDataSource for MarketDataset {
    fn columns(&self) -> Vec<String> {
        self.columns.iter().cloned().collect()
    }

    fn product_rows(&self, product: &str) -> Vec<&MarketRecord> {
        self.records
            .iter()
            .filter(|r| r.product_name() == Some(product))
            .collect()
    }

    fn product_names(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.records
            .iter()
            .filter_map(MarketRecord::product_name)
            .filter(|name| seen.insert(*name))
            .map(String::from)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
