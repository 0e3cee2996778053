//! Coordination of secrets and registry references
//!
//! Bundles live in the secret store at `{prefix}/{service}`; the registry
//! only ever holds a small JSON reference under
//! `services/{service}/vault-secret`.

mod error;
mod reference;
mod secret_coordinator;

pub use error::{CoordinatorError, CoordinatorResult};
pub use reference::{reference_key, validate_service_name, ReferenceParseError, ReferenceRecord};
pub use secret_coordinator::{SecretCoordinator, ServiceResolution};
