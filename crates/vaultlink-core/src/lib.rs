//! Vaultlink Core
//!
//! Keeps service secrets in Vault and only references to them in Consul.
//! The crate is backend-agnostic at its seams: the coordinator talks to a
//! `SecretStore` and a `RegistryStore`, with HTTP clients for Vault KV v2
//! and Consul plus in-memory stores for tests.
//!
//! ## Registering a service with secrets
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vaultlink_core::{AppConfig, SecretCoordinator, ServiceRegistration};
//! use vaultlink_core::{ConsulRegistryStore, TracingLogger, VaultSecretStore};
//!
//! let config = AppConfig::load("config.yaml")?;
//! let secrets = VaultSecretStore::new(&config.vault, Arc::new(TracingLogger::for_component("vault")))?;
//! let registry = ConsulRegistryStore::new(&config.consul, Arc::new(TracingLogger::for_component("consul")))?;
//!
//! let coordinator = SecretCoordinator::new(
//!     Arc::new(secrets),
//!     Arc::new(registry),
//!     config.integration.secret_prefix.clone(),
//!     Arc::new(TracingLogger::for_component("coordinator")),
//! );
//!
//! let registration = ServiceRegistration::new("billing", "billing-1", "10.0.0.5", 9090);
//! coordinator.register_with_secret(registration, &bundle).await?;
//!
//! // Later, from any client
//! let secret = coordinator.get_secret("billing").await;
//! ```

pub mod types;
pub mod secrets;
pub mod registry;
pub mod coordinator;
pub mod logging;
pub mod config;

mod http;

// Re-export commonly used types
pub use types::{
    SecretBundle, ServiceRegistration, ServiceInstance,
    SECRETS_IN_VAULT_META_KEY, SECRETS_IN_VAULT_META_VALUE,
};

pub use secrets::{
    SecretStore, SecretStoreError, SecretStoreResult,
    VaultSecretStore, MemorySecretStore,
};

pub use registry::{
    RegistryStore, RegistryError, RegistryResult,
    ConsulRegistryStore, MemoryRegistryStore,
};

pub use coordinator::{
    SecretCoordinator, ServiceResolution,
    CoordinatorError, CoordinatorResult,
    ReferenceRecord, reference_key,
};

pub use logging::{Logger, SharedLogger, NoOpLogger, TracingLogger};

pub use config::{AppConfig, VaultConfig, ConsulConfig, IntegrationConfig, ConfigError, ConfigResult};
