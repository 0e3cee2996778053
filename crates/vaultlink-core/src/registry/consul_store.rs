//! Consul agent registry
//!
//! Uses the agent API for registration, the health API for lookups and the
//! KV API for references.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::traits::{RegistryError, RegistryResult, RegistryStore};
use crate::config::ConsulConfig;
use crate::http::{build_client, encode_path, percent_encode_component};
use crate::logging::SharedLogger;
use crate::types::{ServiceInstance, ServiceRegistration};
use crate::{log_debug, log_warn};

const TOKEN_HEADER: &str = "X-Consul-Token";

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RegisterBody<'a> {
    name: &'a str,
    #[serde(rename = "ID")]
    id: &'a str,
    address: &'a str,
    port: u16,
    tags: &'a BTreeSet<String>,
    meta: &'a BTreeMap<String, String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AgentService {
    #[serde(rename = "ID")]
    id: String,
    service: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    port: u16,
    #[serde(default)]
    tags: Option<BTreeSet<String>>,
    #[serde(default)]
    meta: Option<BTreeMap<String, String>>,
}

impl AgentService {
    fn into_instance(self, fallback_address: Option<String>) -> ServiceInstance {
        let address = match (self.address.is_empty(), fallback_address) {
            (true, Some(node)) => node,
            _ => self.address,
        };
        ServiceInstance {
            id: self.id,
            name: self.service,
            address,
            port: self.port,
            tags: self.tags.unwrap_or_default(),
            meta: self.meta.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HealthNode {
    #[serde(default)]
    address: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HealthEntry {
    node: Option<HealthNode>,
    service: AgentService,
}

fn status_error(status: StatusCode) -> RegistryError {
    match status.as_u16() {
        401 | 403 => RegistryError::Unauthorized,
        code @ 500..=599 => RegistryError::Server(code),
        other => RegistryError::UnexpectedStatus(other),
    }
}

/// Registry backed by a Consul agent
pub struct ConsulRegistryStore {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    datacenter: String,
    logger: SharedLogger,
}

impl ConsulRegistryStore {
    /// Build a registry client from validated configuration
    pub fn new(config: &ConsulConfig, logger: SharedLogger) -> RegistryResult<Self> {
        Self::with_base_url(config, config.base_url(), logger)
    }

    /// Build a registry client against an explicit base URL
    ///
    /// Host, port and scheme from `config` are ignored.
    pub fn with_base_url(
        config: &ConsulConfig,
        base_url: impl Into<String>,
        logger: SharedLogger,
    ) -> RegistryResult<Self> {
        let http = build_client(config.timeout_secs)?;
        let token = Some(config.token.clone()).filter(|t| !t.is_empty());
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            datacenter: config.datacenter.clone(),
            logger,
        })
    }

    /// Base URL requests are sent to
    pub fn address(&self) -> &str {
        &self.base_url
    }

    fn kv_url(&self, key: &str) -> String {
        format!("{}/v1/kv/{}", self.base_url, encode_path(key))
    }

    async fn send(&self, request: RequestBuilder) -> RegistryResult<Response> {
        let request = match &self.token {
            Some(token) => request.header(TOKEN_HEADER, token),
            None => request,
        };
        request.send().await.map_err(RegistryError::Network)
    }

    fn ensure_success(&self, resp: &Response, what: &str) -> RegistryResult<()> {
        if resp.status().is_success() {
            return Ok(());
        }
        let err = status_error(resp.status());
        log_warn!(self.logger, "Error {}: {}", what, err);
        Err(err)
    }
}

impl std::fmt::Debug for ConsulRegistryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsulRegistryStore")
            .field("base_url", &self.base_url)
            .field("datacenter", &self.datacenter)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[async_trait]
impl RegistryStore for ConsulRegistryStore {
    fn name(&self) -> &str {
        "consul"
    }

    async fn register(&self, registration: &ServiceRegistration) -> RegistryResult<()> {
        let body = RegisterBody {
            name: &registration.name,
            id: &registration.id,
            address: &registration.address,
            port: registration.port,
            tags: &registration.tags,
            meta: &registration.meta,
        };
        let url = format!("{}/v1/agent/service/register", self.base_url);
        let resp = self.send(self.http.put(&url).json(&body)).await?;
        self.ensure_success(&resp, &format!("registering service {}", registration.id))?;
        log_debug!(self.logger, "Registered service {}", registration.id);
        Ok(())
    }

    async fn deregister(&self, service_id: &str) -> RegistryResult<()> {
        let url = format!(
            "{}/v1/agent/service/deregister/{}",
            self.base_url,
            percent_encode_component(service_id)
        );
        let resp = self.send(self.http.put(&url)).await?;
        // Consul answers 404 for an unknown service id
        if resp.status() == StatusCode::NOT_FOUND {
            log_debug!(self.logger, "Service {} was not registered", service_id);
            return Ok(());
        }
        self.ensure_success(&resp, &format!("deregistering service {}", service_id))?;
        log_debug!(self.logger, "Deregistered service {}", service_id);
        Ok(())
    }

    async fn put(&self, key: &str, value: &str) -> RegistryResult<()> {
        let request = self
            .http
            .put(self.kv_url(key))
            .query(&[("dc", self.datacenter.as_str())])
            .body(value.to_string());
        let resp = self.send(request).await?;
        self.ensure_success(&resp, &format!("storing KV {}", key))?;

        let accepted = resp.text().await.map_err(RegistryError::Network)?;
        if accepted.trim() != "true" {
            log_warn!(self.logger, "Consul refused KV write to {}", key);
            return Err(RegistryError::Rejected(key.to_string()));
        }
        log_debug!(self.logger, "Stored KV {}", key);
        Ok(())
    }

    async fn get(&self, key: &str) -> RegistryResult<Option<String>> {
        let request = self
            .http
            .get(self.kv_url(key))
            .query(&[("dc", self.datacenter.as_str()), ("raw", "")]);
        let resp = self.send(request).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.ensure_success(&resp, &format!("getting KV {}", key))?;
        let value = resp.text().await.map_err(RegistryError::Network)?;
        Ok(Some(value))
    }

    async fn delete(&self, key: &str) -> RegistryResult<()> {
        let request = self
            .http
            .delete(self.kv_url(key))
            .query(&[("dc", self.datacenter.as_str())]);
        let resp = self.send(request).await?;
        self.ensure_success(&resp, &format!("deleting KV {}", key))?;
        log_debug!(self.logger, "Deleted KV {}", key);
        Ok(())
    }

    async fn services(&self) -> RegistryResult<Vec<ServiceInstance>> {
        let url = format!("{}/v1/agent/services", self.base_url);
        let resp = self.send(self.http.get(&url)).await?;
        self.ensure_success(&resp, "listing services")?;
        let services: BTreeMap<String, AgentService> = resp
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;
        Ok(services
            .into_values()
            .map(|s| s.into_instance(None))
            .collect())
    }

    async fn healthy_instances(&self, name: &str) -> RegistryResult<Vec<ServiceInstance>> {
        let url = format!(
            "{}/v1/health/service/{}",
            self.base_url,
            percent_encode_component(name)
        );
        let request = self
            .http
            .get(&url)
            .query(&[("dc", self.datacenter.as_str()), ("passing", "true")]);
        let resp = self.send(request).await?;
        self.ensure_success(&resp, &format!("looking up service {}", name))?;
        let entries: Vec<HealthEntry> = resp
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;
        Ok(entries
            .into_iter()
            .map(|e| e.service.into_instance(e.node.map(|n| n.address)))
            .collect())
    }
}
