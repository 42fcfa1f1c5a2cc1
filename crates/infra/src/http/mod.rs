//! HTTP transport and the Retail API request executor

pub mod client;
pub mod executor;

pub use client::{reqwest_method, HttpClient, HttpClientBuilder};
pub use executor::{RequestExecutor, RetryPolicy};
