//! Shared types for the secret store, the registry and the coordinator

mod service;

pub use service::{
    ServiceRegistration, ServiceInstance,
    SECRETS_IN_VAULT_META_KEY, SECRETS_IN_VAULT_META_VALUE,
};

/// A secret bundle: string keys mapped to arbitrary JSON values
///
/// The bundle is opaque to the coordinator; it is written and read back
/// verbatim.
pub type SecretBundle = serde_json::Map<String, serde_json::Value>;
