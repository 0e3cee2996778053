//! In-memory registry

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::traits::{RegistryError, RegistryResult, RegistryStore};
use crate::types::{ServiceInstance, ServiceRegistration};

/// Operations that can be made to fail on a `MemoryRegistryStore`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryOperation {
    Register,
    Deregister,
    Put,
    Get,
    Delete,
    Services,
}

/// In-memory registry for testing and ephemeral use
///
/// Every registered instance is treated as healthy.
///
/// # Example
///
/// ```
/// use vaultlink_core::registry::{MemoryRegistryStore, RegistryOperation};
///
/// let registry = MemoryRegistryStore::new();
/// registry.fail_on(RegistryOperation::Register);
/// assert!(registry.is_failing(RegistryOperation::Register));
/// ```
#[derive(Debug, Default)]
pub struct MemoryRegistryStore {
    services: RwLock<BTreeMap<String, ServiceRegistration>>,
    kv: RwLock<BTreeMap<String, String>>,
    failing: RwLock<HashSet<RegistryOperation>>,
}

impl MemoryRegistryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `op` fail until `recover` is called
    pub fn fail_on(&self, op: RegistryOperation) {
        self.failing.write().insert(op);
    }

    /// Stop failing `op`
    pub fn recover(&self, op: RegistryOperation) {
        self.failing.write().remove(&op);
    }

    pub fn is_failing(&self, op: RegistryOperation) -> bool {
        self.failing.read().contains(&op)
    }

    /// Registered entry for `service_id`, bypassing failure injection
    pub fn registration(&self, service_id: &str) -> Option<ServiceRegistration> {
        self.services.read().get(service_id).cloned()
    }

    /// Raw KV value, bypassing failure injection
    pub fn kv_value(&self, key: &str) -> Option<String> {
        self.kv.read().get(key).cloned()
    }

    /// Set a KV value directly, bypassing failure injection
    pub fn put_sync(&self, key: &str, value: &str) {
        self.kv.write().insert(key.to_string(), value.to_string());
    }

    fn check(&self, op: RegistryOperation) -> RegistryResult<()> {
        if self.is_failing(op) {
            return Err(RegistryError::NotAvailable(format!(
                "memory registry configured to fail {:?}",
                op
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RegistryStore for MemoryRegistryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn register(&self, registration: &ServiceRegistration) -> RegistryResult<()> {
        self.check(RegistryOperation::Register)?;
        self.services
            .write()
            .insert(registration.id.clone(), registration.clone());
        Ok(())
    }

    async fn deregister(&self, service_id: &str) -> RegistryResult<()> {
        self.check(RegistryOperation::Deregister)?;
        self.services.write().remove(service_id);
        Ok(())
    }

    async fn put(&self, key: &str, value: &str) -> RegistryResult<()> {
        self.check(RegistryOperation::Put)?;
        self.put_sync(key, value);
        Ok(())
    }

    async fn get(&self, key: &str) -> RegistryResult<Option<String>> {
        self.check(RegistryOperation::Get)?;
        Ok(self.kv_value(key))
    }

    async fn delete(&self, key: &str) -> RegistryResult<()> {
        self.check(RegistryOperation::Delete)?;
        self.kv.write().remove(key);
        Ok(())
    }

    async fn services(&self) -> RegistryResult<Vec<ServiceInstance>> {
        self.check(RegistryOperation::Services)?;
        Ok(self.services.read().values().cloned().map(Into::into).collect())
    }

    async fn healthy_instances(&self, name: &str) -> RegistryResult<Vec<ServiceInstance>> {
        self.check(RegistryOperation::Services)?;
        Ok(self
            .services
            .read()
            .values()
            .filter(|s| s.name == name)
            .cloned()
            .map(Into::into)
            .collect())
    }
}
