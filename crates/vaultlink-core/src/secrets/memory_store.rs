//! In-memory secret store

use std::collections::{BTreeMap, BTreeSet, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::traits::{SecretStore, SecretStoreError, SecretStoreResult};
use crate::types::SecretBundle;

/// Operations that can be made to fail on a `MemorySecretStore`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretOperation {
    Write,
    Read,
    Delete,
    List,
}

#[derive(Debug, Default, Clone)]
struct VersionedEntry {
    version: u64,
    data: SecretBundle,
}

/// In-memory secret store for testing and ephemeral use
///
/// Keeps a version counter per path the way a KV v2 engine does, and can be
/// told to fail chosen operations so failure paths can be exercised without
/// a running backend.
///
/// # Example
///
/// ```
/// use vaultlink_core::secrets::{MemorySecretStore, SecretOperation};
///
/// let store = MemorySecretStore::new();
/// store.fail_on(SecretOperation::Write);
/// assert!(store.is_failing(SecretOperation::Write));
/// ```
#[derive(Debug)]
pub struct MemorySecretStore {
    mount_point: String,
    secrets: RwLock<BTreeMap<String, VersionedEntry>>,
    failing: RwLock<HashSet<SecretOperation>>,
}

impl Default for MemorySecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySecretStore {
    /// Create a new empty memory store mounted at `secret`
    pub fn new() -> Self {
        Self::with_mount_point("secret")
    }

    /// Create a new empty memory store with a custom mount point
    pub fn with_mount_point(mount_point: impl Into<String>) -> Self {
        Self {
            mount_point: mount_point.into(),
            secrets: RwLock::new(BTreeMap::new()),
            failing: RwLock::new(HashSet::new()),
        }
    }

    /// Make `op` fail until `recover` is called
    pub fn fail_on(&self, op: SecretOperation) {
        self.failing.write().insert(op);
    }

    /// Stop failing `op`
    pub fn recover(&self, op: SecretOperation) {
        self.failing.write().remove(&op);
    }

    pub fn is_failing(&self, op: SecretOperation) -> bool {
        self.failing.read().contains(&op)
    }

    /// Whether anything is stored at `path`, bypassing failure injection
    pub fn contains(&self, path: &str) -> bool {
        self.secrets.read().contains_key(normalize(path))
    }

    /// Current version number at `path`
    pub fn version(&self, path: &str) -> Option<u64> {
        self.secrets.read().get(normalize(path)).map(|e| e.version)
    }

    /// Get the number of paths in the store
    pub fn len(&self) -> usize {
        self.secrets.read().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self, op: SecretOperation) -> SecretStoreResult<()> {
        if self.is_failing(op) {
            return Err(SecretStoreError::NotAvailable(format!(
                "memory store configured to fail {:?}",
                op
            )));
        }
        Ok(())
    }
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn mount_point(&self) -> &str {
        &self.mount_point
    }

    async fn write(&self, path: &str, bundle: &SecretBundle) -> SecretStoreResult<()> {
        self.check(SecretOperation::Write)?;
        let mut secrets = self.secrets.write();
        let entry = secrets.entry(normalize(path).to_string()).or_default();
        entry.version += 1;
        entry.data = bundle.clone();
        Ok(())
    }

    async fn read(&self, path: &str) -> SecretStoreResult<Option<SecretBundle>> {
        self.check(SecretOperation::Read)?;
        Ok(self.secrets.read().get(normalize(path)).map(|e| e.data.clone()))
    }

    async fn delete(&self, path: &str) -> SecretStoreResult<()> {
        self.check(SecretOperation::Delete)?;
        self.secrets.write().remove(normalize(path));
        Ok(())
    }

    async fn list(&self, prefix: &str) -> SecretStoreResult<Vec<String>> {
        self.check(SecretOperation::List)?;
        let prefix = normalize(prefix);
        let prefix = if prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", prefix)
        };

        let secrets = self.secrets.read();
        let children: BTreeSet<String> = secrets
            .keys()
            .filter_map(|key| key.strip_prefix(prefix.as_str()))
            .map(|rest| match rest.split_once('/') {
                // Nested paths show up as folders, like the KV engine lists them
                Some((folder, _)) => format!("{}/", folder),
                None => rest.to_string(),
            })
            .collect();
        Ok(children.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bundle(value: serde_json::Value) -> SecretBundle {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_memory_store_name() {
        let store = MemorySecretStore::new();
        assert_eq!(store.name(), "memory");
        assert_eq!(store.mount_point(), "secret");
        assert_eq!(MemorySecretStore::with_mount_point("kv").mount_point(), "kv");
    }

    #[tokio::test]
    async fn test_memory_store_crud() {
        let store = MemorySecretStore::new();
        assert!(store.is_empty());
        assert_eq!(store.read("app/db").await.unwrap(), None);

        store.write("app/db", &bundle(json!({"password": "x"}))).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.version("app/db"), Some(1));
        assert_eq!(
            store.read("app/db").await.unwrap(),
            Some(bundle(json!({"password": "x"})))
        );

        store.write("app/db", &bundle(json!({"password": "y"}))).await.unwrap();
        assert_eq!(store.version("app/db"), Some(2));
        assert_eq!(
            store.read("/app/db/").await.unwrap(),
            Some(bundle(json!({"password": "y"})))
        );

        store.delete("app/db").await.unwrap();
        assert!(!store.contains("app/db"));
        // Deleting again is not an error
        store.delete("app/db").await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_store_list_children() {
        let store = MemorySecretStore::new();
        let b = bundle(json!({"k": "v"}));
        store.write("consul-services/billing", &b).await.unwrap();
        store.write("consul-services/auth", &b).await.unwrap();
        store.write("consul-services/nested/deep", &b).await.unwrap();
        store.write("other/thing", &b).await.unwrap();

        let listed = store.list("consul-services").await.unwrap();
        assert_eq!(listed, vec!["auth", "billing", "nested/"]);

        assert!(store.list("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_failure_injection() {
        let store = MemorySecretStore::new();
        store.fail_on(SecretOperation::Write);

        let err = store.write("a", &bundle(json!({}))).await.unwrap_err();
        assert!(matches!(err, SecretStoreError::NotAvailable(_)));
        assert!(store.is_empty());

        store.recover(SecretOperation::Write);
        store.write("a", &bundle(json!({}))).await.unwrap();

        store.fail_on(SecretOperation::List);
        assert!(store.list("").await.is_err());
        // Other operations are unaffected
        assert!(store.read("a").await.unwrap().is_some());
    }
}
