//! Shared price board.
//!
//! Holds the most recent [`PriceBoard`] snapshot behind a `watch` channel.
//! Publishing swaps the whole `Arc` in one step, so a reader sees either the
//! previous complete board or the new one, never a mix of entries.

use std::sync::Arc;
use tokio::sync::watch;

use crate::types::PriceBoard;

/// Process-wide handle to the latest published board. Clones share the same
/// underlying snapshot.
#[derive(Clone)]
pub struct SharedPriceBoard {
    tx: Arc<watch::Sender<Arc<PriceBoard>>>,
}

impl SharedPriceBoard {
    /// A board holding the empty generation-0 snapshot.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(PriceBoard::empty()));
        Self { tx: Arc::new(tx) }
    }

    /// Current snapshot. Never waits on the publisher beyond the pointer copy.
    pub fn latest(&self) -> Arc<PriceBoard> {
        self.tx.borrow().clone()
    }

    /// Replace the board wholesale and return the generation assigned to it.
    pub fn publish(&self, mut board: PriceBoard) -> u64 {
        let mut generation = 0;
        self.tx.send_modify(|current| {
            generation = current.generation + 1;
            board.generation = generation;
            *current = Arc::new(board);
        });
        generation
    }

    /// Receiver notified after every publish.
    pub fn subscribe(&self) -> watch::Receiver<Arc<PriceBoard>> {
        self.tx.subscribe()
    }
}

impl Default for SharedPriceBoard {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
