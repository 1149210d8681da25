//! Pricing engine, best-response vendor pricing.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod data;
pub mod pricing;
pub mod engine;
pub mod dashboard;
