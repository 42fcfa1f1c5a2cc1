//! Infrastructure error conversions

pub mod conversions;

pub use conversions::{to_retail, InfraError};
