//! Live engine: the shared price board and the loop that keeps it fresh.

pub mod board;
pub mod refresh;
