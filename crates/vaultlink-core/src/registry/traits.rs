//! Core traits and types for the discovery registry

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{ServiceInstance, ServiceRegistration};

/// Errors that can occur during registry operations
///
/// A missing KV key is not an error: `get` returns `Ok(None)`.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("network error communicating with the registry: {0}")]
    Network(#[from] reqwest::Error),

    #[error("registry rejected the ACL token")]
    Unauthorized,

    #[error("registry server error ({0})")]
    Server(u16),

    #[error("unexpected registry response: status {0}")]
    UnexpectedStatus(u16),

    #[error("registry refused the write to {0}")]
    Rejected(String),

    #[error("invalid registry response: {0}")]
    InvalidResponse(String),

    #[error("Registry not available: {0}")]
    NotAvailable(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Trait for service-discovery backends with a flat key-value store
///
/// Implementations:
/// - `ConsulRegistryStore`: Consul agent over HTTP
/// - `MemoryRegistryStore`: In-memory, for tests and local use
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Human-readable name of this registry
    fn name(&self) -> &str;

    /// Register or replace the service entry keyed by `registration.id`
    async fn register(&self, registration: &ServiceRegistration) -> RegistryResult<()>;

    /// Remove a service entry; an unknown id succeeds
    async fn deregister(&self, service_id: &str) -> RegistryResult<()>;

    /// Store `value` under `key`
    async fn put(&self, key: &str, value: &str) -> RegistryResult<()>;

    /// Fetch the value under `key`, `Ok(None)` if absent
    async fn get(&self, key: &str) -> RegistryResult<Option<String>>;

    /// Remove `key`; an absent key succeeds
    async fn delete(&self, key: &str) -> RegistryResult<()>;

    /// Every service instance known to the registry
    async fn services(&self) -> RegistryResult<Vec<ServiceInstance>>;

    /// Instances of `name` currently passing their health checks
    async fn healthy_instances(&self, name: &str) -> RegistryResult<Vec<ServiceInstance>>;
}
