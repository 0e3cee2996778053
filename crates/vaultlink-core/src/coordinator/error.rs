//! Coordinator error types

use thiserror::Error;

use crate::registry::RegistryError;
use crate::secrets::SecretStoreError;

/// Errors reported by `SecretCoordinator` operations
///
/// Not-found is never an error here: lookups return `None` instead.
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// The bundle could not be written; nothing was changed in the registry
    #[error("failed to write secret for {service}: {source}")]
    SecretWrite {
        service: String,
        source: SecretStoreError,
    },

    /// The bundle was written but no reference points at it
    #[error("secret for {service} stored at {secret_path} but its reference could not be written: {source}")]
    ReferenceWrite {
        service: String,
        secret_path: String,
        source: RegistryError,
    },

    /// The name cannot be used as a path segment; no backend was contacted
    #[error("invalid service name {name:?}: {reason}")]
    InvalidServiceName {
        name: String,
        reason: &'static str,
    },

    /// At least one delete step failed; successful steps are not undone
    #[error(
        "failed to delete secrets for {service} (secret: {}, reference: {})",
        step_outcome(.secret),
        step_outcome(.reference)
    )]
    PartialDelete {
        service: String,
        secret: Option<SecretStoreError>,
        reference: Option<RegistryError>,
    },

    /// Registration failed after the secret was stored
    ///
    /// `compensated` is true when the stored secret and its reference were
    /// removed again.
    #[error("failed to register service {service_id}: {source}")]
    Registration {
        service_id: String,
        source: RegistryError,
        compensated: bool,
    },

    #[error("failed to deregister service {service_id}: {source}")]
    Deregistration {
        service_id: String,
        source: RegistryError,
    },

    #[error("failed to list secrets under {prefix}: {source}")]
    SecretList {
        prefix: String,
        source: SecretStoreError,
    },

    #[error("registry lookup failed: {0}")]
    Registry(#[from] RegistryError),
}

fn step_outcome<E: std::fmt::Display>(err: &Option<E>) -> String {
    match err {
        Some(e) => e.to_string(),
        None => "ok".to_string(),
    }
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_delete_message_names_failed_step() {
        let err = CoordinatorError::PartialDelete {
            service: "billing".to_string(),
            secret: None,
            reference: Some(RegistryError::Server(500)),
        };
        let message = err.to_string();
        assert!(message.contains("billing"));
        assert!(message.contains("secret: ok"));
        assert!(message.contains("registry server error (500)"));
    }
}
