//! Authenticated encryption for token records

pub mod encryption;

pub use encryption::{EncryptedPayload, EncryptionService};
