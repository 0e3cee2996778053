//! Command implementations

pub mod register;
pub mod get_secret;
pub mod store_secret;
pub mod delete_secret;
pub mod list;
pub mod deregister;
pub mod resolve;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use vaultlink_core::{
    AppConfig, ConsulRegistryStore, SecretBundle, SecretCoordinator, SecretStore, TracingLogger,
    VaultSecretStore,
};

use crate::cli::SecretsSource;

/// Load config, build both backend clients and check the Vault token
///
/// Every command goes through here, so a bad config or a rejected token
/// fails before any backend is changed.
pub async fn connect(config_path: Option<&Path>) -> Result<SecretCoordinator> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    let secrets = VaultSecretStore::new(&config.vault, Arc::new(TracingLogger::for_component("vault")))
        .context("Failed to create Vault client")?;
    if !secrets.is_authenticated().await {
        bail!("Vault authentication failed for {}", secrets.address());
    }

    let registry =
        ConsulRegistryStore::new(&config.consul, Arc::new(TracingLogger::for_component("consul")))
            .context("Failed to create Consul client")?;

    Ok(SecretCoordinator::new(
        Arc::new(secrets),
        Arc::new(registry),
        config.integration.secret_prefix.clone(),
        Arc::new(TracingLogger::for_component("coordinator")),
    ))
}

/// Read a secret bundle from `--secrets` or `--secrets-file`
pub fn read_secrets(source: &SecretsSource) -> Result<SecretBundle> {
    let (text, origin) = match (&source.secrets, &source.secrets_file) {
        (Some(inline), _) => (inline.clone(), "--secrets".to_string()),
        (None, Some(path)) => (
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read secrets file {}", path.display()))?,
            path.display().to_string(),
        ),
        (None, None) => bail!("Either --secrets or --secrets-file is required"),
    };
    parse_bundle(&text).with_context(|| format!("Invalid secrets in {}", origin))
}

fn parse_bundle(text: &str) -> Result<SecretBundle> {
    match serde_json::from_str::<serde_json::Value>(text)? {
        serde_json::Value::Object(bundle) => Ok(bundle),
        other => bail!("expected a JSON object, got {}", json_kind(&other)),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Split `--tags a,b` into trimmed, non-empty tags
pub fn parse_tags(tags: Option<&str>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// Parse `--meta` as a JSON object of string values
pub fn parse_meta(meta: Option<&str>) -> Result<BTreeMap<String, String>> {
    match meta {
        Some(text) => serde_json::from_str(text)
            .context("Invalid --meta: expected a JSON object with string values"),
        None => Ok(BTreeMap::new()),
    }
}
