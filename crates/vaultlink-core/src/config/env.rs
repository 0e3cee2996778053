//! Environment variable overrides
//!
//! Values found in the environment win over the file. Empty variables are
//! ignored.

use super::error::{ConfigError, ConfigResult};
use super::file::AppConfig;

pub const VAULT_TOKEN_ENV: &str = "VAULT_TOKEN";
pub const VAULT_ADDR_ENV: &str = "VAULT_ADDR";
pub const CONSUL_TOKEN_ENV: &str = "CONSUL_HTTP_TOKEN";
pub const CONSUL_ADDR_ENV: &str = "CONSUL_HTTP_ADDR";

/// Parsed form of `CONSUL_HTTP_ADDR`: `[scheme://]host[:port]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsulAddr {
    pub scheme: Option<String>,
    pub host: String,
    pub port: Option<u16>,
}

impl ConsulAddr {
    pub fn parse(addr: &str) -> ConfigResult<Self> {
        let addr = addr.trim().trim_end_matches('/');
        let (scheme, rest) = match addr.split_once("://") {
            Some((scheme, rest)) => (Some(scheme.to_lowercase()), rest),
            None => (None, addr),
        };

        // A bracketed IPv6 literal keeps its brackets; only a colon after `]` starts the port
        let (host, port) = match rest.strip_prefix('[') {
            Some(bracketed) => {
                let end = bracketed.find(']').ok_or_else(|| {
                    ConfigError::invalid(CONSUL_ADDR_ENV, format!("unclosed '[' in '{}'", addr))
                })?;
                let host = &rest[..end + 2];
                match &rest[end + 2..] {
                    "" => (host, None),
                    tail => match tail.strip_prefix(':') {
                        Some(port) => (host, Some(parse_port(port, addr)?)),
                        None => {
                            return Err(ConfigError::invalid(
                                CONSUL_ADDR_ENV,
                                format!("unexpected '{}' after host in '{}'", tail, addr),
                            ))
                        }
                    },
                }
            }
            None => match rest.rsplit_once(':') {
                Some((host, port)) => (host, Some(parse_port(port, addr)?)),
                None => (rest, None),
            },
        };

        if host.is_empty() {
            return Err(ConfigError::invalid(CONSUL_ADDR_ENV, format!("missing host in '{}'", addr)));
        }

        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
        })
    }
}

fn parse_port(port: &str, addr: &str) -> ConfigResult<u16> {
    port.parse::<u16>()
        .map_err(|_| ConfigError::invalid(CONSUL_ADDR_ENV, format!("invalid port in '{}'", addr)))
}

impl AppConfig {
    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup
    ///
    /// Lets callers (and tests) supply variables without touching the
    /// process environment.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(token) = get(VAULT_TOKEN_ENV) {
            self.vault.token = token;
        }
        if let Some(addr) = get(VAULT_ADDR_ENV) {
            self.vault.address = addr;
        }
        if let Some(token) = get(CONSUL_TOKEN_ENV) {
            self.consul.token = token;
        }
        if let Some(addr) = get(CONSUL_ADDR_ENV) {
            let parsed = ConsulAddr::parse(&addr)?;
            if let Some(scheme) = parsed.scheme {
                self.consul.scheme = scheme;
            }
            self.consul.host = parsed.host;
            if let Some(port) = parsed.port {
                self.consul.port = port;
            }
        }
        Ok(())
    }
}
