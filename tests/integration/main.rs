//! Integration tests for the pricing engine.

mod mock_market;
mod refresh;
mod scenarios;
