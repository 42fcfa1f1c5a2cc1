//! Retail API facade
//!
//! [`LightspeedClient`] owns the token manager and request executor for one
//! account; [`ResourceApi`] builds per-resource calls on top of it.

pub mod client;
pub mod resources;

pub use client::{
    LightspeedClient, LightspeedClientBuilder, PingReport, PingStatus, RefreshOutcome,
};
pub use resources::{Resource, ResourceApi};
