//! OAuth token endpoint adapter

pub mod client;

pub use client::OAuthTokenClient;
