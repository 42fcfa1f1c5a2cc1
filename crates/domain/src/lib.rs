//! # Lightspeed Domain
//!
//! Data types shared by every layer of the Lightspeed Retail client.
//!
//! This crate contains:
//! - Token records and refresh-grant payloads
//! - Request descriptors, query parameters and normalized responses
//! - Credentials, client and storage configuration
//! - The error taxonomy and `Result` alias
//!
//! ## Architecture
//! - No dependencies on other workspace crates
//! - No I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

pub use config::*;
pub use errors::*;
pub use types::*;
