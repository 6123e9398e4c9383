//! Token endpoint request encoding
//!
//! Turns `code` + `redirect_uri` (plus caller extras such as a PKCE
//! `code_verifier`) into the POST sent to the token endpoint. With default
//! settings the body is exactly:
//!
//! `code=<code>&redirect_uri=<enc>&grant_type=authorization_code&client_id=<id>&client_secret=<secret>`

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::debug;
use url::form_urlencoded;

use crate::authorize::REDIRECT_URI;
use crate::config::{BodyFormat, ClientSettings};
use crate::error::{Error, Result};
use crate::http::HttpRequest;
use crate::params::TokenRequestParams;

pub const CODE: &str = "code";
pub const GRANT_TYPE: &str = "grant_type";
pub const AUTHORIZATION_CODE_GRANT: &str = "authorization_code";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Build the code-exchange request. No network I/O.
///
/// Field order: `code`, `redirect_uri`, `grant_type`, client id, client
/// secret, then remaining caller params in insertion order. Client
/// credentials move to an `Authorization: Basic` header when the settings
/// say so.
pub fn token_request(
    settings: &ClientSettings,
    params: &TokenRequestParams,
) -> Result<HttpRequest> {
    let code = params.required(CODE)?;
    let redirect_uri = params.required(REDIRECT_URI)?;

    let placement = settings.credentials();
    let mut reserved = vec![GRANT_TYPE];
    if placement.in_body() {
        reserved.push(settings.id_param_name());
        reserved.push(settings.secret_param_name());
    }
    if let Some(key) = reserved.iter().find(|key| params.contains_key(key)) {
        return Err(Error::Validation(format!(
            "{key} is set by the client and cannot be passed as a token param"
        )));
    }

    let mut fields: Vec<(&str, &str)> = vec![
        (CODE, code),
        (REDIRECT_URI, redirect_uri),
        (GRANT_TYPE, AUTHORIZATION_CODE_GRANT),
    ];
    if placement.in_body() {
        fields.push((settings.id_param_name(), settings.id()));
        fields.push((settings.secret_param_name(), settings.secret().expose()));
    }
    fields.extend(params.extras(&[CODE, REDIRECT_URI]));

    let mut headers = settings.headers().clone();
    headers.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));
    if placement.in_header() {
        headers.insert(AUTHORIZATION, basic_authorization(settings)?);
    }

    let body = match settings.body_format() {
        BodyFormat::Form => {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
            encode_form(&fields)
        }
        BodyFormat::Json => {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
            encode_json(&fields)
        }
    };

    let url = settings.token_endpoint();
    debug!(
        url = %url,
        credentials = ?placement,
        body_format = ?settings.body_format(),
        fields = fields.len(),
        "encoded token request"
    );

    Ok(HttpRequest {
        method: Method::POST,
        url,
        headers: redact_sensitive(headers),
        body,
    })
}

fn encode_form(fields: &[(&str, &str)]) -> Vec<u8> {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in fields {
        serializer.append_pair(key, value);
    }
    serializer.finish().into_bytes()
}

fn encode_json(fields: &[(&str, &str)]) -> Vec<u8> {
    let object: serde_json::Map<String, serde_json::Value> = fields
        .iter()
        .map(|(k, v)| ((*k).to_owned(), serde_json::Value::String((*v).to_owned())))
        .collect();
    serde_json::Value::Object(object).to_string().into_bytes()
}

/// RFC 6749 §2.3.1: `Basic base64(urlencode(id) ":" urlencode(secret))`
fn basic_authorization(settings: &ClientSettings) -> Result<HeaderValue> {
    let id: String = form_urlencoded::byte_serialize(settings.id().as_bytes()).collect();
    let secret: String =
        form_urlencoded::byte_serialize(settings.secret().expose().as_bytes()).collect();
    let encoded = STANDARD.encode(format!("{id}:{secret}"));
    HeaderValue::from_str(&format!("Basic {encoded}"))
        .map_err(|e| Error::Configuration(format!("client credentials not header-safe: {e}")))
}

/// Mark the credential header sensitive so `Debug` and transports skip it.
fn redact_sensitive(mut headers: HeaderMap) -> HeaderMap {
    if let Some(value) = headers.get_mut(AUTHORIZATION) {
        value.set_sensitive(true);
    }
    headers
}
