//! Core traits and types for secret storage

use async_trait::async_trait;
use thiserror::Error;

use crate::types::SecretBundle;

/// Errors that can occur during secret store operations
///
/// A missing secret is not an error: reads return `Ok(None)`.
#[derive(Error, Debug)]
pub enum SecretStoreError {
    #[error("network error communicating with the secrets engine: {0}")]
    Network(#[from] reqwest::Error),

    #[error("secrets engine rejected the token (check token permissions)")]
    Unauthorized,

    #[error("secrets engine rate limit exceeded")]
    RateLimited,

    #[error("secrets engine server error ({0})")]
    Server(u16),

    #[error("unexpected secrets engine response: status {0}")]
    UnexpectedStatus(u16),

    #[error("invalid secrets engine response: {0}")]
    InvalidResponse(String),

    #[error("Store not available: {0}")]
    NotAvailable(String),
}

pub type SecretStoreResult<T> = Result<T, SecretStoreError>;

/// Trait for versioned secret storage backends
///
/// Paths are relative to the store's mount point. Every call is a single
/// request with no retries.
///
/// Implementations:
/// - `VaultSecretStore`: HashiCorp Vault KV v2 over HTTP
/// - `MemorySecretStore`: In-memory, for tests and local use
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Human-readable name of this store
    fn name(&self) -> &str;

    /// Mount point of the secrets engine this store addresses
    fn mount_point(&self) -> &str;

    /// Check whether the configured credentials are accepted
    async fn is_authenticated(&self) -> bool {
        true
    }

    /// Upsert `bundle` at `path`, creating a new version
    async fn write(&self, path: &str, bundle: &SecretBundle) -> SecretStoreResult<()>;

    /// Read the latest version at `path`
    ///
    /// Returns `Ok(None)` when nothing is stored there.
    async fn read(&self, path: &str) -> SecretStoreResult<Option<SecretBundle>>;

    /// Remove every version and the metadata at `path`
    ///
    /// Deleting a path that holds nothing succeeds.
    async fn delete(&self, path: &str) -> SecretStoreResult<()>;

    /// List the immediate children of `prefix`
    ///
    /// Returns an empty list when the prefix has no children.
    async fn list(&self, prefix: &str) -> SecretStoreResult<Vec<String>>;
}
