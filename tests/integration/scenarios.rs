//! End-to-end optimizer scenarios over the mock market.

use std::sync::Arc;

use pricing_engine::data::{COMPETITOR_PRICE, INVENTORY_LEVELS};
use pricing_engine::types::{OptimizeRequest, PricingError, ProductQuery, SkipReason};

use crate::mock_market::{optimizer_over, MockMarket};

fn request(names: &[&str], quantities: &[f64], prices: Option<Vec<Option<f64>>>) -> OptimizeRequest {
    OptimizeRequest {
        product_names: names.iter().map(|s| s.to_string()).collect(),
        quantities: quantities.to_vec(),
        competitor_prices: prices,
    }
}

#[test]
fn apple_with_known_competitor_price() {
    let optimizer = optimizer_over(Arc::new(MockMarket::new()));
    let batch = optimizer
        .optimize_request(request(&["Apple"], &[50.0], Some(vec![Some(100.0)])))
        .unwrap();

    let apple = &batch.prices[0];
    assert_eq!(apple.name, "Apple");
    assert!((apple.demand - 40.0).abs() < 1e-9);
    assert!(apple.price > 0.0 && apple.price < 500.0, "price {}", apple.price);

    let b = optimizer
        .payoff()
        .breakdown(apple.price, apple.competitor_price, apple.demand, apple.inventory);
    assert!(b.revenue <= apple.price * 50.0);
    assert!((b.holding_cost - 50.0).abs() < 1e-9);
    assert!((apple.profit - b.profit()).abs() < 1e-9);
}

#[test]
fn pear_without_competitor_price() {
    let optimizer = optimizer_over(Arc::new(MockMarket::new()));
    let batch = optimizer
        .optimize_request(request(&["Pear"], &[20.0], Some(vec![None])))
        .unwrap();

    let pear = &batch.prices[0];
    assert!((pear.demand - 10.0).abs() < 1e-9);
    assert_eq!(pear.competitor_price, None);
    assert!((0.0..=500.0).contains(&pear.price));
    assert!(pear.profit.is_finite());
}

#[test]
fn product_without_history_is_skipped() {
    let optimizer = optimizer_over(Arc::new(MockMarket::new()));
    let batch = optimizer
        .optimize_request(request(
            &["Apple", "Dragonfruit", "Pear"],
            &[50.0, 10.0, 20.0],
            Some(vec![Some(100.0), Some(30.0), None]),
        ))
        .unwrap();

    let names: Vec<&str> = batch.prices.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Apple", "Pear"]);
    assert_eq!(batch.skipped.len(), 1);
    assert_eq!(batch.skipped[0].name, "Dragonfruit");
    assert_eq!(batch.skipped[0].reason, SkipReason::MissingProductData);
}

#[test]
fn mismatched_arrays_fail_validation() {
    let market = Arc::new(MockMarket::new());
    let optimizer = optimizer_over(Arc::clone(&market));
    let err = optimizer
        .optimize_request(request(&["Apple", "Pear", "Plum"], &[1.0, 2.0], None))
        .unwrap_err();

    assert!(matches!(err, PricingError::Validation(_)));
    assert!(market.lookups().is_empty());
}

#[test]
fn missing_column_fails_before_any_product_work() {
    let market = Arc::new(MockMarket::new().without_column(COMPETITOR_PRICE));
    let optimizer = optimizer_over(Arc::clone(&market));
    let err = optimizer
        .optimize(&[ProductQuery::new("Apple", Some(100.0), 50.0)])
        .unwrap_err();

    assert!(matches!(err, PricingError::Validation(ref msg) if msg.contains(COMPETITOR_PRICE)));
    assert!(market.lookups().is_empty());
}

#[test]
fn missing_demand_column_fails_validation() {
    let market = Arc::new(MockMarket::new().without_column(INVENTORY_LEVELS));
    let optimizer = optimizer_over(market);
    let err = optimizer
        .optimize(&[ProductQuery::new("Apple", Some(100.0), 50.0)])
        .unwrap_err();
    assert!(matches!(err, PricingError::Validation(_)));
}

#[test]
fn aggregate_profit_matches_recomputed_parts() {
    let optimizer = optimizer_over(Arc::new(MockMarket::new()));
    let queries: Vec<ProductQuery> = (0..10)
        .map(|i| ProductQuery::new(format!("Crop-{i}"), Some(60.0 + 15.0 * i as f64), 25.0 * i as f64))
        .collect();
    let batch = optimizer.optimize(&queries).unwrap();
    assert_eq!(batch.len(), 10);

    let recomputed: f64 = batch
        .prices
        .iter()
        .map(|r| {
            optimizer
                .payoff()
                .breakdown(r.price, r.competitor_price, r.demand, r.inventory)
                .profit()
        })
        .sum();
    assert!((batch.profit - recomputed).abs() < 1e-6);

    for r in &batch.prices {
        assert!((0.0..=500.0).contains(&r.price), "{} out of bounds", r.name);
    }
    // Crop-0 has no stock: flat objective, lower bound.
    assert_eq!(batch.prices[0].price, 0.0);
}

#[test]
fn repeated_batches_are_identical() {
    let optimizer = optimizer_over(Arc::new(MockMarket::new()));
    let queries = vec![
        ProductQuery::new("Apple", Some(100.0), 50.0),
        ProductQuery::new("Pear", None, 20.0),
    ];
    assert_eq!(optimizer.optimize(&queries).unwrap(), optimizer.optimize(&queries).unwrap());
}
