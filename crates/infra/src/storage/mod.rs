//! Token storage backends
//!
//! Every backend implements [`TokenStorage`](lightspeed_core::TokenStorage).
//! Backends that persist a raw JSON document also implement
//! [`DocumentStore`], which lets [`EncryptedTokenStorage`] wrap them.

pub mod discovery;
pub mod document;
pub mod encrypted;
pub mod file;
pub mod memory;
pub mod sqlite;

pub use discovery::{
    auto_discover_storage, create_storage_from_settings, discover_storage, DiscoveredStorage,
    DiscoveryOptions, DiscoverySource, SavedStorageConfig, StorageConfigFile,
};
pub use document::DocumentStore;
pub use encrypted::EncryptedTokenStorage;
pub use file::FileTokenStorage;
pub use memory::InMemoryTokenStorage;
pub use sqlite::SqliteTokenStorage;
