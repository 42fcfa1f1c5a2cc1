//! Cursor-following list aggregation

pub mod aggregator;
pub mod ports;

pub use aggregator::{collect_all, PageCollection};
