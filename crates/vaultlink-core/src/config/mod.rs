//! Configuration for the Vault client, the Consul client and the coordinator
//!
//! - `AppConfig`: YAML file sections with explicit defaults
//! - Environment overrides (`VAULT_TOKEN`, `VAULT_ADDR`, `CONSUL_HTTP_TOKEN`, `CONSUL_HTTP_ADDR`)
//! - Validation at load time, so a bad config fails before any backend call

mod error;
mod file;
mod env;

pub use error::{ConfigError, ConfigResult};
pub use file::{
    AppConfig, VaultConfig, ConsulConfig, IntegrationConfig,
    DEFAULT_MOUNT_POINT, DEFAULT_SECRET_PREFIX, DEFAULT_TIMEOUT_SECS,
};
pub use env::{ConsulAddr, VAULT_TOKEN_ENV, VAULT_ADDR_ENV, CONSUL_TOKEN_ENV, CONSUL_ADDR_ENV};
