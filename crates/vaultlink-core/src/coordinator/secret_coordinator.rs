//! Reference coordinator
//!
//! Each operation is a short saga over the secret store and the registry:
//! steps run strictly in order, every step's outcome is logged, and the only
//! compensating action is removing a stored secret when registration of its
//! service fails.

use std::sync::Arc;

use super::error::{CoordinatorError, CoordinatorResult};
use super::reference::{reference_key, validate_service_name, ReferenceParseError, ReferenceRecord};
use crate::logging::SharedLogger;
use crate::registry::RegistryStore;
use crate::secrets::SecretStore;
use crate::types::{
    SecretBundle, ServiceInstance, ServiceRegistration,
    SECRETS_IN_VAULT_META_KEY, SECRETS_IN_VAULT_META_VALUE,
};
use crate::{log_debug, log_error, log_info, log_warn};

/// Result of resolving a service by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResolution {
    pub name: String,
    /// Instances passing their health checks
    pub instances: Vec<ServiceInstance>,
    /// Where the service's secrets live, if a usable reference exists
    pub reference: Option<ReferenceRecord>,
}

/// Coordinates secrets in the secret store with references in the registry
///
/// Holds no state besides the two store handles, the path prefix and the
/// logger, so one instance can serve any number of calls. There is no
/// locking across calls: concurrent writes for the same service are
/// last-write-wins at each backend independently.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use vaultlink_core::coordinator::SecretCoordinator;
/// use vaultlink_core::logging::NoOpLogger;
/// use vaultlink_core::registry::MemoryRegistryStore;
/// use vaultlink_core::secrets::MemorySecretStore;
///
/// let coordinator = SecretCoordinator::new(
///     Arc::new(MemorySecretStore::new()),
///     Arc::new(MemoryRegistryStore::new()),
///     "consul-services",
///     Arc::new(NoOpLogger::new()),
/// );
/// assert_eq!(coordinator.secret_path("billing"), "consul-services/billing");
/// ```
pub struct SecretCoordinator {
    secrets: Arc<dyn SecretStore>,
    registry: Arc<dyn RegistryStore>,
    secret_prefix: String,
    logger: SharedLogger,
}

impl SecretCoordinator {
    pub fn new(
        secrets: Arc<dyn SecretStore>,
        registry: Arc<dyn RegistryStore>,
        secret_prefix: impl Into<String>,
        logger: SharedLogger,
    ) -> Self {
        let secret_prefix = secret_prefix.into().trim_matches('/').to_string();
        Self {
            secrets,
            registry,
            secret_prefix,
            logger,
        }
    }

    pub fn secret_prefix(&self) -> &str {
        &self.secret_prefix
    }

    /// Path of `service_name`'s bundle in the secret store
    pub fn secret_path(&self, service_name: &str) -> String {
        format!("{}/{}", self.secret_prefix, service_name)
    }

    fn check_name(&self, service_name: &str) -> CoordinatorResult<()> {
        validate_service_name(service_name).map_err(|reason| {
            log_error!(self.logger, "Rejected service name {:?}: {}", service_name, reason);
            CoordinatorError::InvalidServiceName {
                name: service_name.to_string(),
                reason,
            }
        })
    }

    /// Write `bundle` to the secret store, then a reference to it in the registry
    ///
    /// If the reference write fails the bundle stays in the secret store
    /// without a reachable reference; that is logged and reported, not
    /// rolled back. Names that are not a single path segment (see
    /// `validate_service_name`) are rejected before any backend call.
    pub async fn store_secret(&self, service_name: &str, bundle: &SecretBundle) -> CoordinatorResult<()> {
        self.check_name(service_name)?;
        let secret_path = self.secret_path(service_name);

        if let Err(source) = self.secrets.write(&secret_path, bundle).await {
            log_error!(self.logger, "Failed to write secret for {} to {}: {}", service_name, secret_path, source);
            return Err(CoordinatorError::SecretWrite {
                service: service_name.to_string(),
                source,
            });
        }
        log_info!(self.logger, "Wrote secret for {} to {}", service_name, secret_path);

        let reference = ReferenceRecord::new(&secret_path, self.secrets.mount_point());
        let json = reference.to_json();

        let key = reference_key(service_name);
        if let Err(source) = self.registry.put(&key, &json).await {
            log_warn!(
                self.logger,
                "Secret for {} exists at {} without a reachable reference: writing {} failed: {}",
                service_name, secret_path, key, source
            );
            return Err(CoordinatorError::ReferenceWrite {
                service: service_name.to_string(),
                secret_path,
                source,
            });
        }

        log_info!(self.logger, "Successfully stored secret for service {}", service_name);
        Ok(())
    }

    /// Follow `service_name`'s reference and read the bundle it points at
    ///
    /// Every way of not getting a bundle (invalid name, no reference,
    /// registry failure, corrupt reference, missing bundle, secret store
    /// failure) returns
    /// `None`; the log says which one it was.
    pub async fn get_secret(&self, service_name: &str) -> Option<SecretBundle> {
        if self.check_name(service_name).is_err() {
            return None;
        }
        let key = reference_key(service_name);

        let text = match self.registry.get(&key).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                log_warn!(self.logger, "No Vault reference found in the registry for {}", service_name);
                return None;
            }
            Err(e) => {
                log_warn!(self.logger, "Could not read Vault reference for {} from the registry: {}", service_name, e);
                return None;
            }
        };

        let reference = match ReferenceRecord::parse(&text) {
            Ok(reference) => reference,
            Err(ReferenceParseError::Malformed(e)) => {
                log_error!(self.logger, "Error parsing Vault reference for {}: {}", service_name, e);
                return None;
            }
            Err(ReferenceParseError::MissingPath) => {
                log_error!(self.logger, "Invalid Vault reference for {}: no vault_path", service_name);
                return None;
            }
        };

        if !reference.mount_point.is_empty() && reference.mount_point != self.secrets.mount_point() {
            log_warn!(
                self.logger,
                "Reference for {} names mount {} but the secret store uses {}",
                service_name, reference.mount_point, self.secrets.mount_point()
            );
        }

        match self.secrets.read(&reference.vault_path).await {
            Ok(Some(bundle)) => {
                log_debug!(self.logger, "Read secret for {} from {}", service_name, reference.vault_path);
                Some(bundle)
            }
            Ok(None) => {
                log_warn!(
                    self.logger,
                    "Reference for {} points at {} but no secret is stored there",
                    service_name, reference.vault_path
                );
                None
            }
            Err(e) => {
                log_error!(self.logger, "Error reading secret for {} from {}: {}", service_name, reference.vault_path, e);
                None
            }
        }
    }

    /// Remove `service_name`'s bundle and its reference
    ///
    /// Both steps are attempted regardless of each other. The call fails if
    /// either step failed; the step that succeeded is not undone.
    pub async fn delete_secret(&self, service_name: &str) -> CoordinatorResult<()> {
        self.check_name(service_name)?;
        let secret_path = self.secret_path(service_name);
        let secret = match self.secrets.delete(&secret_path).await {
            Ok(()) => {
                log_info!(self.logger, "Deleted secret for {} at {}", service_name, secret_path);
                None
            }
            Err(e) => {
                log_warn!(self.logger, "Failed to delete secret from Vault for {}: {}", service_name, e);
                Some(e)
            }
        };

        let key = reference_key(service_name);
        let reference = match self.registry.delete(&key).await {
            Ok(()) => {
                log_info!(self.logger, "Deleted Vault reference {} for {}", key, service_name);
                None
            }
            Err(e) => {
                log_warn!(self.logger, "Failed to delete Vault reference from the registry for {}: {}", service_name, e);
                Some(e)
            }
        };

        if secret.is_none() && reference.is_none() {
            return Ok(());
        }
        Err(CoordinatorError::PartialDelete {
            service: service_name.to_string(),
            secret,
            reference,
        })
    }

    /// Store `bundle` for the service, then register the service
    ///
    /// The registration's metadata always gets `secrets_in_vault = "true"`,
    /// replacing any value the caller put there. When registration fails the
    /// stored secret is deleted again; a failure of that cleanup is logged
    /// and reflected in `compensated`.
    pub async fn register_with_secret(
        &self,
        mut registration: ServiceRegistration,
        bundle: &SecretBundle,
    ) -> CoordinatorResult<()> {
        if let Err(e) = self.store_secret(&registration.name, bundle).await {
            log_error!(self.logger, "Failed to store secrets for {}", registration.name);
            return Err(e);
        }

        registration.meta.insert(
            SECRETS_IN_VAULT_META_KEY.to_string(),
            SECRETS_IN_VAULT_META_VALUE.to_string(),
        );

        if let Err(source) = self.registry.register(&registration).await {
            log_error!(self.logger, "Failed to register service {} ({}): {}", registration.name, registration.id, source);

            let compensated = match self.delete_secret(&registration.name).await {
                Ok(()) => {
                    log_info!(self.logger, "Removed secrets stored for {} after failed registration", registration.name);
                    true
                }
                Err(e) => {
                    log_error!(self.logger, "Could not remove secrets for {} after failed registration: {}", registration.name, e);
                    false
                }
            };

            return Err(CoordinatorError::Registration {
                service_id: registration.id,
                source,
                compensated,
            });
        }

        log_info!(
            self.logger,
            "Successfully registered service {} ({}) with secrets in Vault",
            registration.name, registration.id
        );
        Ok(())
    }

    /// Names of services with a bundle under the prefix
    ///
    /// A secret store failure is logged and yields an empty list, so callers
    /// cannot tell it apart from "no services"; use
    /// `try_list_services_with_secrets` when that matters.
    pub async fn list_services_with_secrets(&self) -> Vec<String> {
        match self.try_list_services_with_secrets().await {
            Ok(names) => names,
            Err(e) => {
                log_error!(self.logger, "Error listing services with secrets: {}", e);
                Vec::new()
            }
        }
    }

    /// Names of services with a bundle under the prefix, surfacing failures
    pub async fn try_list_services_with_secrets(&self) -> CoordinatorResult<Vec<String>> {
        self.secrets
            .list(&self.secret_prefix)
            .await
            .map_err(|source| CoordinatorError::SecretList {
                prefix: self.secret_prefix.clone(),
                source,
            })
    }

    /// Remove a service registration
    ///
    /// Secrets are left in place; they may outlive the registration.
    pub async fn deregister_service(&self, service_id: &str) -> CoordinatorResult<()> {
        match self.registry.deregister(service_id).await {
            Ok(()) => {
                log_info!(self.logger, "Deregistered service {}", service_id);
                Ok(())
            }
            Err(source) => {
                log_error!(self.logger, "Error deregistering service {}: {}", service_id, source);
                Err(CoordinatorError::Deregistration {
                    service_id: service_id.to_string(),
                    source,
                })
            }
        }
    }

    /// Healthy instances of `name` together with its secret reference
    ///
    /// A missing or unusable reference leaves `reference` empty; only a
    /// failed instance lookup is an error.
    pub async fn resolve_service(&self, name: &str) -> CoordinatorResult<ServiceResolution> {
        self.check_name(name)?;
        let instances = self.registry.healthy_instances(name).await?;

        let reference = match self.registry.get(&reference_key(name)).await {
            Ok(Some(text)) => match ReferenceRecord::parse(&text) {
                Ok(reference) => Some(reference),
                Err(e) => {
                    log_error!(self.logger, "Invalid Vault reference for {}: {}", name, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                log_warn!(self.logger, "Could not read Vault reference for {}: {}", name, e);
                None
            }
        };

        log_debug!(self.logger, "Resolved {} to {} healthy instance(s)", name, instances.len());
        Ok(ServiceResolution {
            name: name.to_string(),
            instances,
            reference,
        })
    }
}

impl std::fmt::Debug for SecretCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCoordinator")
            .field("secrets", &self.secrets.name())
            .field("registry", &self.registry.name())
            .field("secret_prefix", &self.secret_prefix)
            .finish()
    }
}
