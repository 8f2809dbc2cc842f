//! Durable client-side storage for session tokens, profiles and settings.
//!
//! Everything here is a plain key-value mapping. Nothing in this crate looks
//! inside a token; validation belongs to `rpa-auth`.
//!
//! - [`KeyValueStorage`]: backend trait (string keys, string values)
//! - [`FileStorage`]: JSON file backend, every write durable before returning
//! - [`MemoryStorage`]: in-process backend for tests and throwaway sessions
//! - [`TokenStore`]: token / profile / refresh-token trio for one surface
//! - [`SettingsStore`]: client preferences read by the HTTP layer

mod file;
mod keys;
mod memory;
mod settings;
mod token_store;
mod traits;

pub use file::FileStorage;
pub use keys::{StorageKeys, TokenKeys};
pub use memory::MemoryStorage;
pub use settings::{ClientSettings, SettingsStore};
pub use token_store::TokenStore;
pub use traits::KeyValueStorage;

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific failure
    #[error("Platform storage error: {0}")]
    Platform(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Open the file-backed storage shared by both surfaces.
pub fn open_file_storage(path: &Path) -> StorageResult<Arc<dyn KeyValueStorage>> {
    let storage = FileStorage::open(path)?;
    Ok(Arc::new(storage))
}
