//! Configuration types and loading
//!
//! Config precedence: `--config` > `OAUTH2_CONFIG` env var > `oauth2-authcode.toml`.
//! The client secret is resolved from `OAUTH2_CLIENT_SECRET`, then
//! `client.secret_file`, then an inline `client.secret`.

use common::Secret;
use oauth2_authcode::{AuthOptions, ClientCredentials, ClientOptions, RequestOptions};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "OAUTH2_CONFIG";
pub const CLIENT_SECRET_ENV: &str = "OAUTH2_CLIENT_SECRET";
pub const DEFAULT_CONFIG_PATH: &str = "oauth2-authcode.toml";

/// Root configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub client: ClientSection,
    pub auth: AuthOptions,
    #[serde(default)]
    pub options: RequestOptions,
    #[serde(default)]
    pub http: HttpSection,
}

/// `[client]` as written on disk; the secret may live in a separate file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSection {
    pub id: String,
    #[serde(default)]
    pub secret: Option<Secret<String>>,
    /// File holding the client secret (alternative to OAUTH2_CLIENT_SECRET)
    #[serde(default)]
    pub secret_file: Option<PathBuf>,
    #[serde(default)]
    pub id_param_name: Option<String>,
    #[serde(default)]
    pub secret_param_name: Option<String>,
}

/// Transport settings for the outgoing token request
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSection {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a TOML file, then resolve the client secret.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if config.http.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        config.client.secret = Some(config.client.resolve_secret()?);
        Ok(config)
    }

    /// Resolve config file path from CLI arg or OAUTH2_CONFIG env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var(CONFIG_PATH_ENV) {
            return PathBuf::from(p);
        }
        PathBuf::from(DEFAULT_CONFIG_PATH)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    /// Library options for this config. Endpoint validation happens when
    /// the client is constructed.
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            client: ClientCredentials {
                id: Some(self.client.id.clone()),
                secret: self.client.secret.clone(),
                id_param_name: self.client.id_param_name.clone(),
                secret_param_name: self.client.secret_param_name.clone(),
            },
            auth: self.auth.clone(),
            options: self.options.clone(),
        }
    }
}

impl ClientSection {
    fn resolve_secret(&self) -> common::Result<Secret<String>> {
        if let Ok(secret) = std::env::var(CLIENT_SECRET_ENV)
            && !secret.trim().is_empty()
        {
            return Ok(Secret::new(secret));
        }

        if let Some(ref secret_file) = self.secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            let secret = secret.trim().to_owned();
            if !secret.is_empty() {
                return Ok(Secret::new(secret));
            }
        }

        match self.secret {
            Some(ref secret) if !secret.is_blank() => Ok(secret.clone()),
            _ => Err(common::Error::Config(format!(
                "client secret not set: use {CLIENT_SECRET_ENV}, client.secret_file or client.secret"
            ))),
        }
    }
}
