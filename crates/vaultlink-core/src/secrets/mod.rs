//! Secret storage abstractions and implementations
//!
//! - `SecretStore` trait for versioned bundle storage addressed by path
//! - `VaultSecretStore`: Vault KV v2 over HTTP
//! - `MemorySecretStore`: In-memory with failure injection

mod traits;
mod memory_store;
mod vault_store;

pub use traits::{SecretStore, SecretStoreError, SecretStoreResult};
pub use memory_store::{MemorySecretStore, SecretOperation};
pub use vault_store::VaultSecretStore;
