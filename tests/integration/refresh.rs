//! Refresh loop against the shared board, driven on paused tokio time.

use std::sync::Arc;
use std::time::Duration;

use pricing_engine::data::MarketDataSource;
use pricing_engine::engine::board::SharedPriceBoard;
use pricing_engine::engine::refresh::{RefreshConfig, RefreshLoop};

use crate::mock_market::{optimizer_over, MockMarket};

fn spawn_loop(top_n: usize) -> (SharedPriceBoard, pricing_engine::engine::refresh::RefreshHandle) {
    let market = Arc::new(MockMarket::new());
    let optimizer = Arc::new(optimizer_over(Arc::clone(&market)));
    let data: Arc<dyn MarketDataSource> = market;
    let board = SharedPriceBoard::new();
    let config = RefreshConfig {
        top_n,
        seed: Some(2024),
        ..RefreshConfig::default()
    };
    let handle = RefreshLoop::new(optimizer, data, board.clone(), config)
        .unwrap()
        .spawn();
    (board, handle)
}

#[tokio::test(start_paused = true)]
async fn board_always_has_exactly_n_entries_after_two_periods() {
    let (board, handle) = spawn_loop(10);

    tokio::time::sleep(Duration::from_secs(21)).await;
    assert!(board.latest().generation >= 2);

    let mut last_generation = 0;
    for _ in 0..50 {
        let first = board.latest();
        let second = board.latest();
        assert_eq!(first.len(), 10);
        assert_eq!(second.len(), 10);
        assert!(second.generation >= first.generation);
        assert!(first.generation >= last_generation);
        last_generation = second.generation;
        tokio::time::sleep(Duration::from_millis(700)).await;
    }

    handle.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn board_products_are_fixed_across_refreshes() {
    let (board, handle) = spawn_loop(5);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let first = board.latest();
    tokio::time::sleep(Duration::from_secs(10)).await;
    let second = board.latest();

    assert!(second.generation > first.generation);
    let names = |b: &pricing_engine::types::PriceBoard| {
        b.entries.iter().map(|e| e.name.clone()).collect::<Vec<_>>()
    };
    assert_eq!(names(&first), names(&second));
    assert_eq!(names(&first), vec!["Apple", "Pear", "Crop-0", "Crop-1", "Crop-2"]);

    handle.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stopped_loop_publishes_nothing_more() {
    let (board, handle) = spawn_loop(3);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!handle.is_finished());
    handle.stop().await.unwrap();

    let generation = board.latest().generation;
    tokio::time::sleep(Duration::from_secs(100)).await;
    assert_eq!(board.latest().generation, generation);
}
