//! Client configuration and settings resolution
//!
//! `ClientOptions` is the raw, partially-filled configuration a caller
//! builds in code or deserializes from a file. `ClientSettings::resolve`
//! validates it once, applies defaults, and produces the immutable settings
//! every other component reads.
//!
//! Defaults:
//! - `id_param_name`: `client_id`
//! - `secret_param_name`: `client_secret`
//! - `authorize_host`: same as `token_host`
//! - `authorize_path`: `/oauth/authorize`
//! - `token_path`: `/oauth/token`
//! - credentials in the request body, form-encoded body, no extra headers

use common::Secret;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use std::str::FromStr;
use tracing::debug;
use url::Url;

use crate::authorize::{REDIRECT_URI, RESPONSE_TYPE};
use crate::error::{Error, Result};
use crate::request::{CODE, GRANT_TYPE};

pub const DEFAULT_ID_PARAM_NAME: &str = "client_id";
pub const DEFAULT_SECRET_PARAM_NAME: &str = "client_secret";
pub const DEFAULT_AUTHORIZE_PATH: &str = "/oauth/authorize";
pub const DEFAULT_TOKEN_PATH: &str = "/oauth/token";

/// Keys the authorize URL and token body always carry.
const PROTOCOL_KEYS: [&str; 4] = [RESPONSE_TYPE, REDIRECT_URI, CODE, GRANT_TYPE];

/// Raw client configuration, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientOptions {
    #[serde(default)]
    pub client: ClientCredentials,
    #[serde(default)]
    pub auth: AuthOptions,
    #[serde(default)]
    pub options: RequestOptions,
}

/// `[client]` section: identity of this application at the provider.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientCredentials {
    pub id: Option<String>,
    pub secret: Option<Secret<String>>,
    /// Query/body key for the client id (some providers use e.g. `appid`)
    pub id_param_name: Option<String>,
    /// Body key for the client secret
    pub secret_param_name: Option<String>,
}

/// `[auth]` section: provider endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthOptions {
    pub token_host: Option<String>,
    pub token_path: Option<String>,
    /// Origin of the authorize endpoint when it differs from the token host
    pub authorize_host: Option<String>,
    pub authorize_path: Option<String>,
}

/// `[options]` section: provider-specific deviations in the token request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestOptions {
    #[serde(default)]
    pub credentials: CredentialsPlacement,
    #[serde(default)]
    pub body_format: BodyFormat,
    /// Static headers added to every token request
    #[serde(default)]
    pub headers: Vec<HeaderInjection>,
}

/// Where the client id/secret go in the token request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialsPlacement {
    /// Form/JSON body fields (RFC 6749 §2.3.1 alternative)
    #[default]
    Body,
    /// `Authorization: Basic` header only
    BasicHeader,
    /// Header and body, for providers that accept either
    Both,
}

impl CredentialsPlacement {
    pub fn in_body(self) -> bool {
        matches!(self, Self::Body | Self::Both)
    }

    pub fn in_header(self) -> bool {
        matches!(self, Self::BasicHeader | Self::Both)
    }
}

/// Encoding of the token request body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyFormat {
    /// `application/x-www-form-urlencoded`
    #[default]
    Form,
    /// `application/json`
    Json,
}

/// Header to add to token requests
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderInjection {
    pub name: String,
    pub value: String,
}

impl ClientOptions {
    /// Options with the three required values set and everything else default.
    pub fn new(
        id: impl Into<String>,
        secret: impl Into<String>,
        token_host: impl Into<String>,
    ) -> Self {
        Self {
            client: ClientCredentials {
                id: Some(id.into()),
                secret: Some(Secret::new(secret.into())),
                ..Default::default()
            },
            auth: AuthOptions {
                token_host: Some(token_host.into()),
                ..Default::default()
            },
            options: RequestOptions::default(),
        }
    }

    pub fn id_param_name(mut self, name: impl Into<String>) -> Self {
        self.client.id_param_name = Some(name.into());
        self
    }

    pub fn secret_param_name(mut self, name: impl Into<String>) -> Self {
        self.client.secret_param_name = Some(name.into());
        self
    }

    pub fn authorize_host(mut self, host: impl Into<String>) -> Self {
        self.auth.authorize_host = Some(host.into());
        self
    }

    pub fn authorize_path(mut self, path: impl Into<String>) -> Self {
        self.auth.authorize_path = Some(path.into());
        self
    }

    pub fn token_path(mut self, path: impl Into<String>) -> Self {
        self.auth.token_path = Some(path.into());
        self
    }

    pub fn credentials(mut self, placement: CredentialsPlacement) -> Self {
        self.options.credentials = placement;
        self
    }

    pub fn body_format(mut self, format: BodyFormat) -> Self {
        self.options.body_format = format;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.headers.push(HeaderInjection {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

/// Validated, immutable client settings.
///
/// Built once per client and shared read-only by every call, so concurrent
/// exchanges need no synchronization.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    id: String,
    secret: Secret<String>,
    id_param_name: String,
    secret_param_name: String,
    token_host: String,
    token_path: String,
    authorize_host: String,
    authorize_path: String,
    credentials: CredentialsPlacement,
    body_format: BodyFormat,
    headers: HeaderMap,
}

impl ClientSettings {
    /// Validate `options` and apply defaults.
    ///
    /// Fails with `Error::Configuration` when `client.id`, `client.secret` or
    /// `auth.token_host` is missing or blank, when a host is not an absolute
    /// http(s) URL, when a path does not start with `/`, or when a param
    /// name is empty, reuses a protocol key, or both names are the same.
    pub fn resolve(options: ClientOptions) -> Result<Self> {
        let ClientOptions {
            client,
            auth,
            options,
        } = options;

        let id = required("client.id", client.id.as_deref())?;
        let secret = match client.secret {
            Some(secret) if !secret.is_blank() => secret,
            _ => return Err(Error::Configuration("client.secret is required".into())),
        };

        let token_host = required("auth.token_host", auth.token_host.as_deref())?;
        let token_host = normalize_host("auth.token_host", &token_host)?;
        let authorize_host = match auth.authorize_host.as_deref() {
            Some(host) => normalize_host("auth.authorize_host", host)?,
            None => token_host.clone(),
        };

        let id_param_name = param_name(
            "client.id_param_name",
            client.id_param_name,
            DEFAULT_ID_PARAM_NAME,
        )?;
        let secret_param_name = param_name(
            "client.secret_param_name",
            client.secret_param_name,
            DEFAULT_SECRET_PARAM_NAME,
        )?;
        if id_param_name == secret_param_name {
            return Err(Error::Configuration(format!(
                "client.id_param_name and client.secret_param_name must differ, both are {id_param_name:?}"
            )));
        }

        let settings = Self {
            id,
            secret,
            id_param_name,
            secret_param_name,
            token_path: path("auth.token_path", auth.token_path, DEFAULT_TOKEN_PATH)?,
            authorize_path: path(
                "auth.authorize_path",
                auth.authorize_path,
                DEFAULT_AUTHORIZE_PATH,
            )?,
            token_host,
            authorize_host,
            credentials: options.credentials,
            body_format: options.body_format,
            headers: header_map(&options.headers)?,
        };

        debug!(
            token_endpoint = %settings.token_endpoint(),
            authorize_endpoint = %settings.authorize_endpoint(),
            credentials = ?settings.credentials,
            body_format = ?settings.body_format,
            "resolved client settings"
        );

        Ok(settings)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn secret(&self) -> &Secret<String> {
        &self.secret
    }

    pub fn id_param_name(&self) -> &str {
        &self.id_param_name
    }

    pub fn secret_param_name(&self) -> &str {
        &self.secret_param_name
    }

    pub fn token_host(&self) -> &str {
        &self.token_host
    }

    pub fn authorize_host(&self) -> &str {
        &self.authorize_host
    }

    pub fn credentials(&self) -> CredentialsPlacement {
        self.credentials
    }

    pub fn body_format(&self) -> BodyFormat {
        self.body_format
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// `authorize_host + authorize_path`
    pub fn authorize_endpoint(&self) -> String {
        format!("{}{}", self.authorize_host, self.authorize_path)
    }

    /// `token_host + token_path`
    pub fn token_endpoint(&self) -> String {
        format!("{}{}", self.token_host, self.token_path)
    }
}

fn required(field: &str, value: Option<&str>) -> Result<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_owned()),
        _ => Err(Error::Configuration(format!("{field} is required"))),
    }
}

/// Parse-check a host and trim trailing slashes so `host + path` never
/// produces `//`.
fn normalize_host(field: &str, raw: &str) -> Result<String> {
    let raw = raw.trim();
    let url = Url::parse(raw)
        .map_err(|e| Error::Configuration(format!("{field} is not a valid URL ({raw}): {e}")))?;

    if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
        return Err(Error::Configuration(format!(
            "{field} must be an absolute http(s) URL, got: {raw}"
        )));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(Error::Configuration(format!(
            "{field} must not carry a query or fragment, got: {raw}"
        )));
    }

    Ok(raw.trim_end_matches('/').to_owned())
}

fn param_name(field: &str, value: Option<String>, default: &str) -> Result<String> {
    match value {
        None => Ok(default.to_owned()),
        Some(name) if name.trim().is_empty() => {
            Err(Error::Configuration(format!("{field} must not be empty")))
        }
        Some(name) if PROTOCOL_KEYS.contains(&name.as_str()) => Err(Error::Configuration(
            format!("{field} cannot be {name:?}; the protocol sets that key"),
        )),
        Some(name) => Ok(name),
    }
}

fn path(field: &str, value: Option<String>, default: &str) -> Result<String> {
    match value {
        None => Ok(default.to_owned()),
        Some(p) if p.starts_with('/') => Ok(p),
        Some(p) => Err(Error::Configuration(format!(
            "{field} must start with '/', got: {p}"
        ))),
    }
}

fn header_map(injections: &[HeaderInjection]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for injection in injections {
        let name = HeaderName::from_str(&injection.name).map_err(|e| {
            Error::Configuration(format!("invalid header name {:?}: {e}", injection.name))
        })?;
        if name == CONTENT_TYPE || name == AUTHORIZATION {
            return Err(Error::Configuration(format!(
                "options.headers cannot set {name}; it is derived from the request options"
            )));
        }
        let value = HeaderValue::from_str(&injection.value).map_err(|e| {
            Error::Configuration(format!("invalid value for header {name}: {e}"))
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}
