//! Key-value backing store port (outbound).
//!
//! Defines the flat string-to-string storage the persistence layer writes
//! its slices into. Values are opaque to the store.

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a backing key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Outbound port for durable key-value storage.
///
/// Implementations must survive process restarts. Concurrent writers are not
/// expected; callers issue one operation at a time.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read the value stored under `key`, or `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove every key.
    async fn clear(&self) -> Result<(), StoreError>;
}
