//! HTTP transport seam for the token exchange
//!
//! The exchange is described as a plain `HttpRequest` and handed to an
//! `HttpClient`. `reqwest::Client` implements the trait directly; tests and
//! embedders with their own transport supply another implementation.
//!
//! Timeouts and retries belong to the transport (e.g. a `reqwest::Client`
//! built with `.timeout(...)`), not to this crate.

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use std::future::Future;
use std::pin::Pin;

use crate::error::{Error, Result};

/// Description of an outgoing request. Building one performs no I/O.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Status, headers and raw body of a completed request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Media type from `Content-Type`, lowercased, without parameters.
    pub fn media_type(&self) -> Option<String> {
        let value = self.headers.get(CONTENT_TYPE)?.to_str().ok()?;
        let essence = value.split(';').next().unwrap_or_default().trim();
        (!essence.is_empty()).then(|| essence.to_ascii_lowercase())
    }
}

/// Performs one network round trip per `send`.
///
/// Uses `Pin<Box<dyn Future>>` so clients can be held as `Arc<dyn HttpClient>`.
/// Transport failures must be reported as `Error::Network`; any HTTP status,
/// including 4xx/5xx, is a successful `send`.
pub trait HttpClient: Send + Sync {
    fn send(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + '_>>;
}

impl HttpClient for reqwest::Client {
    fn send(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + '_>> {
        Box::pin(execute(self, request))
    }
}

async fn execute(client: &reqwest::Client, request: HttpRequest) -> Result<HttpResponse> {
    let HttpRequest {
        method,
        url,
        headers,
        body,
    } = request;

    let response = client
        .request(method, &url)
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(|e| Error::Network(format!("request to {url} failed: {e}")))?;

    let status = response.status().as_u16();
    let headers = response.headers().clone();
    let body = response
        .bytes()
        .await
        .map_err(|e| Error::Network(format!("reading response from {url} failed: {e}")))?;

    Ok(HttpResponse {
        status,
        headers,
        body: body.to_vec(),
    })
}
