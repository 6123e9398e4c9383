//! Token endpoint response normalization
//!
//! Providers answer with JSON (RFC 6749 §5.1) or, in older deployments
//! such as GitHub's default, a form-encoded body. Either way the caller gets
//! the full mapping back unmodified so provider extensions survive.

use serde::Serialize;
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::error::{Error, Result};
use crate::http::HttpResponse;

/// Parsed token endpoint body. Always carries a string `access_token`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TokenResponse(Map<String, Value>);

enum BodyKind {
    Json,
    Form,
    Unknown,
}

impl TokenResponse {
    /// Normalize a raw HTTP response.
    ///
    /// Non-2xx statuses become `Error::InvalidTokenResponse` carrying the
    /// provider's `error` / `error_description` when the body has them. A
    /// 2xx body that cannot be parsed, is not an object, or lacks a string
    /// `access_token` is rejected the same way.
    pub fn from_http(response: HttpResponse) -> Result<Self> {
        let status = response.status;
        let parsed = parse_body(&response);

        if !response.is_success() {
            return Err(provider_error(status, parsed.as_ref(), &response.body));
        }

        let fields = parsed.ok_or_else(|| {
            Error::invalid_response(
                status,
                format!(
                    "token endpoint returned {status} with an unparsable body ({} bytes)",
                    response.body.len()
                ),
            )
        })?;

        Self::from_map(status, fields)
    }

    fn from_map(status: u16, fields: Map<String, Value>) -> Result<Self> {
        match fields.get("access_token") {
            Some(Value::String(token)) if !token.is_empty() => Ok(Self(fields)),
            _ => Err(Error::invalid_response(
                status,
                "token response has no access_token",
            )),
        }
    }

    pub fn access_token(&self) -> &str {
        self.0
            .get("access_token")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.get_str("refresh_token")
    }

    pub fn token_type(&self) -> Option<&str> {
        self.get_str("token_type")
    }

    pub fn scope(&self) -> Option<&str> {
        self.get_str("scope")
    }

    /// Lifetime in seconds. Form-encoded bodies carry it as a string.
    pub fn expires_in(&self) -> Option<u64> {
        match self.0.get("expires_in")? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Any field, including provider-specific ones.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl TryFrom<Map<String, Value>> for TokenResponse {
    type Error = Error;

    fn try_from(fields: Map<String, Value>) -> Result<Self> {
        Self::from_map(200, fields)
    }
}

fn body_kind(media_type: Option<&str>) -> BodyKind {
    match media_type {
        Some("application/json") => BodyKind::Json,
        Some(t) if t.ends_with("+json") => BodyKind::Json,
        Some("application/x-www-form-urlencoded") => BodyKind::Form,
        _ => BodyKind::Unknown,
    }
}

/// Parse by declared content type; otherwise JSON first, then form.
fn parse_body(response: &HttpResponse) -> Option<Map<String, Value>> {
    match body_kind(response.media_type().as_deref()) {
        BodyKind::Json => parse_json(&response.body),
        BodyKind::Form => parse_form(&response.body),
        BodyKind::Unknown => parse_json(&response.body).or_else(|| parse_form(&response.body)),
    }
}

fn parse_json(body: &[u8]) -> Option<Map<String, Value>> {
    match serde_json::from_slice(body).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn parse_form(body: &[u8]) -> Option<Map<String, Value>> {
    let text = std::str::from_utf8(body).ok()?.trim();
    if text.is_empty() || !text.contains('=') {
        return None;
    }
    Some(
        form_urlencoded::parse(text.as_bytes())
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect(),
    )
}

fn provider_error(status: u16, parsed: Option<&Map<String, Value>>, raw: &[u8]) -> Error {
    let field = |name: &str| {
        parsed
            .and_then(|m| m.get(name))
            .and_then(Value::as_str)
            .map(str::to_owned)
    };
    let error = field("error");
    let description = field("error_description");

    let detail = match (&error, &description) {
        (Some(code), Some(desc)) => format!("{code} ({desc})"),
        (Some(code), None) => code.clone(),
        (None, _) => {
            let body = String::from_utf8_lossy(raw);
            let body = body.trim();
            if body.is_empty() {
                String::from("<no body>")
            } else {
                body.chars().take(512).collect()
            }
        }
    };

    Error::InvalidTokenResponse {
        status,
        error,
        description,
        message: format!("token endpoint returned {status}: {detail}"),
    }
}
