//! Typed configuration loaded from YAML
//!
//! Looks for `config.yaml` in the working directory first, then for
//! `~/.config/vaultlink/config.yaml`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};

pub const DEFAULT_MOUNT_POINT: &str = "secret";
pub const DEFAULT_SECRET_PREFIX: &str = "consul-services";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the secrets engine (Vault)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Base URL, e.g. `http://127.0.0.1:8200` (required)
    pub address: String,
    /// Client token (required)
    pub token: String,
    /// Enterprise namespace; empty means none
    pub namespace: String,
    /// Mount point of the KV v2 engine
    pub mount_point: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            token: String::new(),
            namespace: String::new(),
            mount_point: DEFAULT_MOUNT_POINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl VaultConfig {
    pub fn new(address: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: token.into(),
            ..Default::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_mount_point(mut self, mount_point: impl Into<String>) -> Self {
        self.mount_point = mount_point.into();
        self
    }

    /// Check required fields and value formats
    pub fn validate(&self) -> ConfigResult<()> {
        if self.address.trim().is_empty() {
            return Err(ConfigError::invalid("vault.address", "is required"));
        }
        if !(self.address.starts_with("http://") || self.address.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "vault.address",
                format!("'{}' must be an http:// or https:// URL", self.address),
            ));
        }
        if self.token.trim().is_empty() {
            return Err(ConfigError::invalid("vault.token", "is required (or set VAULT_TOKEN)"));
        }
        if self.mount_point.trim_matches('/').is_empty() {
            return Err(ConfigError::invalid("vault.mount_point", "must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid("vault.timeout_secs", "must be greater than zero"));
        }
        Ok(())
    }
}

/// Connection settings for the discovery registry (Consul)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsulConfig {
    pub host: String,
    pub port: u16,
    /// ACL token; empty means anonymous
    pub token: String,
    /// `http` or `https`
    pub scheme: String,
    pub datacenter: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for ConsulConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8500,
            token: String::new(),
            scheme: "http".to_string(),
            datacenter: "dc1".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ConsulConfig {
    /// Base URL of the agent HTTP API
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    /// Check required fields and value formats
    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::invalid("consul.host", "is required"));
        }
        if self.port == 0 {
            return Err(ConfigError::invalid("consul.port", "must be non-zero"));
        }
        if self.scheme != "http" && self.scheme != "https" {
            return Err(ConfigError::invalid(
                "consul.scheme",
                format!("'{}' is not one of http, https", self.scheme),
            ));
        }
        if self.datacenter.trim().is_empty() {
            return Err(ConfigError::invalid("consul.datacenter", "must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid("consul.timeout_secs", "must be greater than zero"));
        }
        Ok(())
    }
}

/// Settings for the coordinator itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    /// Path prefix under which service bundles are written
    pub secret_prefix: String,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            secret_prefix: DEFAULT_SECRET_PREFIX.to_string(),
        }
    }
}

impl IntegrationConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.secret_prefix.trim_matches('/').is_empty() {
            return Err(ConfigError::invalid("integration.secret_prefix", "must not be empty"));
        }
        Ok(())
    }
}

/// Top-level configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub vault: VaultConfig,
    pub consul: ConsulConfig,
    pub integration: IntegrationConfig,
}

impl AppConfig {
    /// Load from `path`, apply environment overrides, then validate
    ///
    /// A missing file is an error, not an empty configuration.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML file without overrides or validation
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse YAML text without overrides or validation
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        // An empty document deserializes to null, which we treat as all defaults
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Validate every section, failing on the first bad field
    pub fn validate(&self) -> ConfigResult<()> {
        self.vault.validate()?;
        self.consul.validate()?;
        self.integration.validate()
    }

    /// Default config location
    ///
    /// `config.yaml` in the working directory if it exists, otherwise the
    /// user-level `vaultlink/config.yaml` under the platform config dir.
    pub fn default_path() -> PathBuf {
        let local = PathBuf::from("config.yaml");
        if local.exists() {
            return local;
        }
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        config_dir.join("vaultlink").join("config.yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const FULL: &str = r#"
vault:
  address: http://localhost:8200
  token: test-token
  namespace: team-a
  mount_point: kv
consul:
  host: consul.internal
  port: 8501
  scheme: https
  datacenter: eu1
integration:
  secret_prefix: test-prefix
"#;

    #[test]
    fn test_parse_full_config() {
        let config = AppConfig::from_yaml_str(FULL).unwrap();
        assert_eq!(config.vault.address, "http://localhost:8200");
        assert_eq!(config.vault.namespace, "team-a");
        assert_eq!(config.vault.mount_point, "kv");
        assert_eq!(config.consul.host, "consul.internal");
        assert_eq!(config.consul.base_url(), "https://consul.internal:8501");
        assert_eq!(config.integration.secret_prefix, "test-prefix");
        config.validate().unwrap();
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = AppConfig::from_yaml_str(
            "vault:\n  address: http://localhost:8200\n  token: t\n",
        )
        .unwrap();
        assert_eq!(config.vault.mount_point, "secret");
        assert_eq!(config.vault.timeout_secs, 30);
        assert_eq!(config.consul.host, "localhost");
        assert_eq!(config.consul.port, 8500);
        assert_eq!(config.consul.scheme, "http");
        assert_eq!(config.consul.datacenter, "dc1");
        assert_eq!(config.integration.secret_prefix, "consul-services");
        config.validate().unwrap();
    }

    #[test]
    fn test_missing_required_fields() {
        let config = AppConfig::from_yaml_str("consul:\n  host: localhost\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "vault.address", .. })
        ));

        let config = AppConfig::from_yaml_str("vault:\n  address: http://v:8200\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "vault.token", .. })
        ));
    }

    #[test]
    fn test_invalid_values() {
        let mut config = AppConfig::from_yaml_str(FULL).unwrap();
        config.consul.scheme = "ftp".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "consul.scheme", .. })
        ));

        let mut config = AppConfig::from_yaml_str(FULL).unwrap();
        config.vault.address = "localhost:8200".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "vault.address", .. })
        ));

        let mut config = AppConfig::from_yaml_str(FULL).unwrap();
        config.integration.secret_prefix = "/".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "integration.secret_prefix", .. })
        ));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            AppConfig::from_yaml_str("vault: [unclosed"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, FULL).unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.consul.datacenter, "eu1");
    }
}
