//! HashiCorp Vault KV v2 secret store
//!
//! Talks to the KV v2 HTTP API directly:
//! - `POST   /v1/{mount}/data/{path}` to write a new version
//! - `GET    /v1/{mount}/data/{path}` to read the latest version
//! - `DELETE /v1/{mount}/metadata/{path}` to destroy every version
//! - `GET    /v1/{mount}/metadata/{prefix}?list=true` to list children

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::traits::{SecretStore, SecretStoreError, SecretStoreResult};
use crate::config::VaultConfig;
use crate::http::{build_client, encode_path};
use crate::logging::SharedLogger;
use crate::types::SecretBundle;
use crate::{log_debug, log_warn};

const TOKEN_HEADER: &str = "X-Vault-Token";
const NAMESPACE_HEADER: &str = "X-Vault-Namespace";

#[derive(Deserialize)]
struct ReadResponse {
    data: Option<ReadData>,
}

#[derive(Deserialize)]
struct ReadData {
    // Null when the latest version has been soft-deleted
    data: Option<SecretBundle>,
}

#[derive(Deserialize)]
struct ListResponse {
    data: ListData,
}

#[derive(Deserialize)]
struct ListData {
    #[serde(default)]
    keys: Vec<String>,
}

/// Map a non-success status to an error. Raw response bodies are never exposed.
fn status_error(status: StatusCode) -> SecretStoreError {
    match status.as_u16() {
        401 | 403 => SecretStoreError::Unauthorized,
        429 => SecretStoreError::RateLimited,
        code @ 500..=599 => SecretStoreError::Server(code),
        other => SecretStoreError::UnexpectedStatus(other),
    }
}

/// Secret store backed by a Vault KV v2 engine
pub struct VaultSecretStore {
    http: reqwest::Client,
    base_url: String,
    token: String,
    namespace: Option<String>,
    mount_point: String,
    logger: SharedLogger,
}

impl VaultSecretStore {
    /// Build a store from validated configuration
    pub fn new(config: &VaultConfig, logger: SharedLogger) -> SecretStoreResult<Self> {
        let http = build_client(config.timeout_secs)?;
        let namespace = Some(config.namespace.trim().to_string()).filter(|ns| !ns.is_empty());
        Ok(Self {
            http,
            base_url: config.address.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            namespace,
            mount_point: config.mount_point.trim_matches('/').to_string(),
            logger,
        })
    }

    /// Base URL requests are sent to
    pub fn address(&self) -> &str {
        &self.base_url
    }

    fn data_url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}/data/{}",
            self.base_url,
            encode_path(&self.mount_point),
            encode_path(path)
        )
    }

    fn metadata_url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}/metadata/{}",
            self.base_url,
            encode_path(&self.mount_point),
            encode_path(path)
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .header(TOKEN_HEADER, &self.token)
            .header("Accept", "application/json");
        match &self.namespace {
            Some(ns) => request.header(NAMESPACE_HEADER, ns),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> SecretStoreResult<Response> {
        self.authorize(request).send().await.map_err(SecretStoreError::Network)
    }
}

impl std::fmt::Debug for VaultSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSecretStore")
            .field("base_url", &self.base_url)
            .field("namespace", &self.namespace)
            .field("mount_point", &self.mount_point)
            .finish()
    }
}

#[async_trait]
impl SecretStore for VaultSecretStore {
    fn name(&self) -> &str {
        "vault"
    }

    fn mount_point(&self) -> &str {
        &self.mount_point
    }

    async fn is_authenticated(&self) -> bool {
        let url = format!("{}/v1/auth/token/lookup-self", self.base_url);
        match self.send(self.http.get(&url)).await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                log_warn!(self.logger, "Vault token lookup returned status {}", resp.status().as_u16());
                false
            }
            Err(e) => {
                log_warn!(self.logger, "Error checking Vault authentication: {}", e);
                false
            }
        }
    }

    async fn write(&self, path: &str, bundle: &SecretBundle) -> SecretStoreResult<()> {
        let resp = self
            .send(self.http.post(self.data_url(path)).json(&json!({ "data": bundle })))
            .await?;

        if !resp.status().is_success() {
            let err = status_error(resp.status());
            log_warn!(self.logger, "Error writing secret to {}: {}", path, err);
            return Err(err);
        }
        log_debug!(self.logger, "Wrote secret to {}", path);
        Ok(())
    }

    async fn read(&self, path: &str) -> SecretStoreResult<Option<SecretBundle>> {
        let resp = self.send(self.http.get(self.data_url(path))).await?;

        match resp.status() {
            StatusCode::OK => {
                let body: ReadResponse = resp
                    .json()
                    .await
                    .map_err(|e| SecretStoreError::InvalidResponse(e.to_string()))?;
                Ok(body.data.and_then(|d| d.data))
            }
            StatusCode::NOT_FOUND => {
                log_debug!(self.logger, "No secret at {}", path);
                Ok(None)
            }
            status => {
                let err = status_error(status);
                log_warn!(self.logger, "Error reading secret from {}: {}", path, err);
                Err(err)
            }
        }
    }

    async fn delete(&self, path: &str) -> SecretStoreResult<()> {
        let resp = self.send(self.http.delete(self.metadata_url(path))).await?;

        match resp.status() {
            status if status.is_success() => {
                log_debug!(self.logger, "Deleted secret at {}", path);
                Ok(())
            }
            StatusCode::NOT_FOUND => Ok(()),
            status => {
                let err = status_error(status);
                log_warn!(self.logger, "Error deleting secret from {}: {}", path, err);
                Err(err)
            }
        }
    }

    async fn list(&self, prefix: &str) -> SecretStoreResult<Vec<String>> {
        let resp = self
            .send(self.http.get(self.metadata_url(prefix)).query(&[("list", "true")]))
            .await?;

        match resp.status() {
            StatusCode::OK => {
                let body: ListResponse = resp
                    .json()
                    .await
                    .map_err(|e| SecretStoreError::InvalidResponse(e.to_string()))?;
                Ok(body.data.keys)
            }
            // Vault answers 404 for a prefix with no children
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            status => {
                let err = status_error(status);
                log_warn!(self.logger, "Error listing secrets under {}: {}", prefix, err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer, namespace: &str) -> VaultSecretStore {
        let config = VaultConfig::new(server.uri(), "test-token").with_namespace(namespace);
        VaultSecretStore::new(&config, Arc::new(NoOpLogger::new())).unwrap()
    }

    fn bundle(value: serde_json::Value) -> SecretBundle {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(status_error(StatusCode::FORBIDDEN), SecretStoreError::Unauthorized));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS),
            SecretStoreError::RateLimited
        ));
        assert!(matches!(status_error(StatusCode::BAD_GATEWAY), SecretStoreError::Server(502)));
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST),
            SecretStoreError::UnexpectedStatus(400)
        ));
    }

    #[tokio::test]
    async fn write_posts_data_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/secret/data/consul-services/billing"))
            .and(header("X-Vault-Token", "test-token"))
            .and(body_json(json!({"data": {"api_key": "x"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"version": 1}})))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server, "");
        store
            .write("consul-services/billing", &bundle(json!({"api_key": "x"})))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn namespace_header_sent_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/secret/data/app"))
            .and(header("X-Vault-Namespace", "team-a"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server, "team-a");
        store.write("app", &bundle(json!({"k": "v"}))).await.unwrap();
    }

    #[tokio::test]
    async fn write_maps_forbidden_to_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let store = store_for(&server, "");
        let err = store.write("app", &bundle(json!({}))).await.unwrap_err();
        assert!(matches!(err, SecretStoreError::Unauthorized));
    }

    #[tokio::test]
    async fn read_returns_inner_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/secret/data/consul-services/billing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "data": {"api_key": "x", "port": 5432},
                    "metadata": {"version": 3}
                }
            })))
            .mount(&server)
            .await;

        let store = store_for(&server, "");
        let secret = store.read("consul-services/billing").await.unwrap();
        assert_eq!(secret, Some(bundle(json!({"api_key": "x", "port": 5432}))));
    }

    #[tokio::test]
    async fn read_not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"errors": []})))
            .mount(&server)
            .await;

        let store = store_for(&server, "");
        assert_eq!(store.read("consul-services/absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn read_server_error_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let store = store_for(&server, "");
        assert!(matches!(
            store.read("app").await,
            Err(SecretStoreError::Server(503))
        ));
    }

    #[tokio::test]
    async fn delete_hits_metadata_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/secret/metadata/consul-services/billing"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server, "");
        store.delete("consul-services/billing").await.unwrap();
    }

    #[tokio::test]
    async fn delete_missing_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = store_for(&server, "");
        store.delete("consul-services/absent").await.unwrap();
    }

    #[tokio::test]
    async fn list_returns_keys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/secret/metadata/consul-services"))
            .and(query_param("list", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"keys": ["auth", "billing"]}
            })))
            .mount(&server)
            .await;

        let store = store_for(&server, "");
        assert_eq!(
            store.list("consul-services").await.unwrap(),
            vec!["auth".to_string(), "billing".to_string()]
        );
    }

    #[tokio::test]
    async fn list_empty_prefix_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = store_for(&server, "");
        assert!(store.list("consul-services").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn is_authenticated_checks_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/auth/token/lookup-self"))
            .and(header("X-Vault-Token", "test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
            .mount(&server)
            .await;

        let store = store_for(&server, "");
        assert!(store.is_authenticated().await);

        let config = VaultConfig::new(server.uri(), "bad-token");
        let other = VaultSecretStore::new(&config, Arc::new(NoOpLogger::new())).unwrap();
        // wiremock answers 404 for requests no mock matches
        assert!(!other.is_authenticated().await);
    }

    #[tokio::test]
    async fn unreachable_backend_is_network_error() {
        let config = VaultConfig::new("http://127.0.0.1:1", "t");
        let store = VaultSecretStore::new(&config, Arc::new(NoOpLogger::new())).unwrap();
        assert!(matches!(
            store.read("app").await,
            Err(SecretStoreError::Network(_))
        ));
    }
}
