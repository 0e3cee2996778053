//! Reference records stored in the registry KV

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Registry key holding the reference for `service_name`
pub fn reference_key(service_name: &str) -> String {
    format!("services/{}/vault-secret", service_name)
}

/// Check that `service_name` is usable as a single path segment
///
/// The name is spliced into both the secret path and the registry key, and
/// HTTP clients resolve `.` and `..` segments (encoded or not) before the
/// request is sent, so such names would address something other than the
/// recorded path.
pub fn validate_service_name(service_name: &str) -> Result<(), &'static str> {
    if service_name.is_empty() {
        return Err("name is empty");
    }
    if service_name.contains('/') {
        return Err("name contains '/'");
    }
    if service_name == "." || service_name == ".." {
        return Err("name is a relative path segment");
    }
    Ok(())
}

/// Pointer from the registry to a bundle in the secrets engine
///
/// Serialized as `{"vault_path": "...", "mount_point": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub vault_path: String,
    pub mount_point: String,
}

/// Why a stored reference could not be used
#[derive(Debug, Error)]
pub enum ReferenceParseError {
    #[error("reference is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("reference has no vault_path")]
    MissingPath,
}

// Lenient shape for parsing: only vault_path is required to be usable
#[derive(Deserialize)]
struct StoredReference {
    #[serde(default)]
    vault_path: Option<String>,
    #[serde(default)]
    mount_point: Option<String>,
}

impl ReferenceRecord {
    pub fn new(vault_path: impl Into<String>, mount_point: impl Into<String>) -> Self {
        Self {
            vault_path: vault_path.into(),
            mount_point: mount_point.into(),
        }
    }

    /// JSON text stored in the registry
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "vault_path": self.vault_path,
            "mount_point": self.mount_point,
        })
        .to_string()
    }

    /// Parse stored JSON text
    ///
    /// A missing, null or empty `vault_path` is an error; a missing
    /// `mount_point` is tolerated and left empty.
    pub fn parse(text: &str) -> Result<Self, ReferenceParseError> {
        let stored: StoredReference = serde_json::from_str(text)?;
        let vault_path = stored
            .vault_path
            .filter(|p| !p.is_empty())
            .ok_or(ReferenceParseError::MissingPath)?;
        Ok(Self {
            vault_path,
            mount_point: stored.mount_point.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_key() {
        assert_eq!(reference_key("billing"), "services/billing/vault-secret");
    }

    #[test]
    fn test_validate_service_name() {
        assert!(validate_service_name("billing").is_ok());
        assert!(validate_service_name("billing-v2.internal").is_ok());
        assert!(validate_service_name("..billing").is_ok());

        assert_eq!(validate_service_name(""), Err("name is empty"));
        assert_eq!(validate_service_name("a/../b"), Err("name contains '/'"));
        assert_eq!(validate_service_name("../../sys/policy/x"), Err("name contains '/'"));
        assert!(validate_service_name(".").is_err());
        assert!(validate_service_name("..").is_err());
    }

    #[test]
    fn test_wire_format_field_names() {
        let record = ReferenceRecord::new("consul-services/billing", "secret");
        let value: serde_json::Value = serde_json::from_str(&record.to_json()).unwrap();
        assert_eq!(value["vault_path"], "consul-services/billing");
        assert_eq!(value["mount_point"], "secret");
        assert_eq!(value.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_parse_valid() {
        let record =
            ReferenceRecord::parse(r#"{"vault_path": "p/billing", "mount_point": "kv"}"#).unwrap();
        assert_eq!(record, ReferenceRecord::new("p/billing", "kv"));

        let record = ReferenceRecord::parse(r#"{"vault_path": "p/billing"}"#).unwrap();
        assert_eq!(record.mount_point, "");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            ReferenceRecord::parse("not json"),
            Err(ReferenceParseError::Malformed(_))
        ));
        assert!(matches!(
            ReferenceRecord::parse("[1, 2]"),
            Err(ReferenceParseError::Malformed(_))
        ));
        assert!(matches!(
            ReferenceRecord::parse(r#"{"mount_point": "secret"}"#),
            Err(ReferenceParseError::MissingPath)
        ));
        assert!(matches!(
            ReferenceRecord::parse(r#"{"vault_path": ""}"#),
            Err(ReferenceParseError::MissingPath)
        ));
        assert!(matches!(
            ReferenceRecord::parse(r#"{"vault_path": null}"#),
            Err(ReferenceParseError::MissingPath)
        ));
    }
}
