//! Service registration and instance types

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Metadata key marking a service whose secrets live in Vault
pub const SECRETS_IN_VAULT_META_KEY: &str = "secrets_in_vault";

/// Value stored under `SECRETS_IN_VAULT_META_KEY`
pub const SECRETS_IN_VAULT_META_VALUE: &str = "true";

/// A service entry to register in the discovery registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRegistration {
    /// Service name (shared by all instances)
    pub name: String,
    /// Unique instance id; registration is an upsert keyed by this
    pub id: String,
    /// Address the instance listens on
    pub address: String,
    /// Port the instance listens on
    pub port: u16,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
}

impl ServiceRegistration {
    /// Create a registration with no tags and no metadata
    pub fn new(
        name: impl Into<String>,
        id: impl Into<String>,
        address: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            address: address.into(),
            port,
            tags: BTreeSet::new(),
            meta: BTreeMap::new(),
        }
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Replace the tag set
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Add a metadata entry
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Whether this registration carries the secrets-in-Vault marker
    pub fn has_secrets_in_vault(&self) -> bool {
        self.meta.get(SECRETS_IN_VAULT_META_KEY).map(String::as_str)
            == Some(SECRETS_IN_VAULT_META_VALUE)
    }
}

/// A live service instance as reported by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
}

impl ServiceInstance {
    /// Whether the instance was registered with its secrets in Vault
    pub fn has_secrets_in_vault(&self) -> bool {
        self.meta.get(SECRETS_IN_VAULT_META_KEY).map(String::as_str)
            == Some(SECRETS_IN_VAULT_META_VALUE)
    }
}

impl From<ServiceRegistration> for ServiceInstance {
    fn from(reg: ServiceRegistration) -> Self {
        Self {
            id: reg.id,
            name: reg.name,
            address: reg.address,
            port: reg.port,
            tags: reg.tags,
            meta: reg.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_builder() {
        let reg = ServiceRegistration::new("billing", "billing-1", "10.0.0.5", 9090)
            .with_tags(["v1", "primary"])
            .with_tag("v1")
            .with_meta("team", "payments");

        assert_eq!(reg.tags.len(), 2);
        assert_eq!(reg.meta.get("team").map(String::as_str), Some("payments"));
        assert!(!reg.has_secrets_in_vault());
    }

    #[test]
    fn test_secrets_marker_is_string_true() {
        let reg = ServiceRegistration::new("billing", "billing-1", "10.0.0.5", 9090)
            .with_meta(SECRETS_IN_VAULT_META_KEY, "yes");
        assert!(!reg.has_secrets_in_vault());

        let reg = reg.with_meta(SECRETS_IN_VAULT_META_KEY, SECRETS_IN_VAULT_META_VALUE);
        assert!(reg.has_secrets_in_vault());

        let instance: ServiceInstance = reg.into();
        assert!(instance.has_secrets_in_vault());
    }
}
