//! Authorization code grant client
//!
//! `get_token` validates and encodes the exchange up front, then returns a
//! `TokenExchange`: one pending request that is consumed exactly once,
//! either by awaiting it or by handing it a callback. Both surfaces drive
//! the same future, so they cannot diverge or double-send.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::authorize::authorize_url;
use crate::config::{ClientOptions, ClientSettings};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpRequest};
use crate::metrics::{outcome, record_token_request};
use crate::params::{AuthorizeParams, TokenRequestParams};
use crate::request::token_request;
use crate::response::TokenResponse;

type ExchangeFuture = Pin<Box<dyn Future<Output = Result<TokenResponse>> + Send>>;

/// Entry point: resolved settings plus the grant helpers built on them.
pub struct OAuth2Client {
    settings: Arc<ClientSettings>,
    authorization_code: AuthorizationCode,
}

impl OAuth2Client {
    /// Resolve `options` and bind the client to `http`.
    ///
    /// Fails with `Error::Configuration` on invalid options.
    pub fn new(options: ClientOptions, http: Arc<dyn HttpClient>) -> Result<Self> {
        let settings = Arc::new(ClientSettings::resolve(options)?);
        Ok(Self {
            authorization_code: AuthorizationCode::new(settings.clone(), http),
            settings,
        })
    }

    /// Client backed by a default `reqwest::Client`.
    pub fn with_reqwest(options: ClientOptions) -> Result<Self> {
        Self::new(options, Arc::new(reqwest::Client::new()))
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn authorization_code(&self) -> &AuthorizationCode {
        &self.authorization_code
    }
}

/// The authorization code grant: authorize URL plus code exchange.
///
/// Cheap to clone; clones share the same settings and HTTP client.
#[derive(Clone)]
pub struct AuthorizationCode {
    settings: Arc<ClientSettings>,
    http: Arc<dyn HttpClient>,
}

impl AuthorizationCode {
    pub fn new(settings: Arc<ClientSettings>, http: Arc<dyn HttpClient>) -> Self {
        Self { settings, http }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// URL to redirect the resource owner to. Pure; no I/O.
    pub fn authorize_url(&self, params: &AuthorizeParams) -> Result<String> {
        authorize_url(&self.settings, params)
    }

    /// Prepare the code exchange.
    ///
    /// Missing `code` / `redirect_uri` fail here with `Error::Validation`
    /// before any I/O. Everything else (network, provider errors) arrives
    /// through the returned exchange.
    ///
    /// ```no_run
    /// # async fn run(client: oauth2_authcode::OAuth2Client) -> oauth2_authcode::Result<()> {
    /// use oauth2_authcode::Params;
    ///
    /// let params = Params::from([("code", "abc"), ("redirect_uri", "https://app.test/cb")]);
    /// let token = client.authorization_code().get_token(&params)?.await?;
    /// println!("{}", token.access_token());
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_token(&self, params: &TokenRequestParams) -> Result<TokenExchange> {
        let request = token_request(&self.settings, params)?;
        Ok(TokenExchange::new(self.http.clone(), request))
    }

    /// Callback form of [`AuthorizationCode::get_token`].
    ///
    /// The callback runs exactly once on the current tokio runtime with the
    /// exchange result. Outside a runtime this fails with
    /// `Error::Configuration`, nothing is sent and the callback never runs.
    pub fn get_token_with<F>(
        &self,
        params: &TokenRequestParams,
        callback: F,
    ) -> Result<JoinHandle<()>>
    where
        F: FnOnce(Result<TokenResponse>) + Send + 'static,
    {
        self.get_token(params)?.on_complete(callback)
    }
}

/// A pending code exchange. Nothing is sent until it is awaited or given a
/// callback; either consumes it, so the request goes out at most once.
#[must_use = "a token exchange sends nothing until awaited or given a callback"]
pub struct TokenExchange {
    future: ExchangeFuture,
}

impl TokenExchange {
    fn new(http: Arc<dyn HttpClient>, request: HttpRequest) -> Self {
        let future = async move {
            let url = request.url.clone();
            let started = Instant::now();

            let result = match http.send(request).await {
                Ok(response) => TokenResponse::from_http(response),
                Err(e) => Err(e),
            };

            record_token_request(outcome(&result), started.elapsed().as_secs_f64());
            match &result {
                Ok(token) => info!(
                    url = %url,
                    token_type = token.token_type().unwrap_or("unspecified"),
                    expires_in = ?token.expires_in(),
                    "token exchange succeeded"
                ),
                Err(e) => warn!(url = %url, error = %e, "token exchange failed"),
            }
            result
        };

        Self {
            future: Box::pin(future),
        }
    }

    /// Drive the exchange on the current tokio runtime and hand the result
    /// to `callback` exactly once.
    pub fn on_complete<F>(self, callback: F) -> Result<JoinHandle<()>>
    where
        F: FnOnce(Result<TokenResponse>) + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|e| {
            Error::Configuration(format!("callback-style exchange needs a tokio runtime: {e}"))
        })?;
        Ok(runtime.spawn(async move { callback(self.future.await) }))
    }
}

impl IntoFuture for TokenExchange {
    type Output = Result<TokenResponse>;
    type IntoFuture = ExchangeFuture;

    fn into_future(self) -> Self::IntoFuture {
        self.future
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::RecordingClient;
    use crate::params::Params;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    const EXPECTED_BODY: &str = "code=code&redirect_uri=http%3A%2F%2Fcallback.com\
                                 &grant_type=authorization_code&client_id=client-id\
                                 &client_secret=client-secret";

    fn options(token_host: &str) -> ClientOptions {
        ClientOptions::new("client-id", "client-secret", token_host)
    }

    fn client_with(http: Arc<dyn HttpClient>) -> OAuth2Client {
        OAuth2Client::new(options("https://example.org"), http).unwrap()
    }

    fn token_params() -> TokenRequestParams {
        Params::from([("code", "code"), ("redirect_uri", "http://callback.com")])
    }

    /// Run the callback surface and wait for its single invocation.
    async fn via_callback(grant: &AuthorizationCode) -> Result<TokenResponse> {
        let (tx, rx) = oneshot::channel();
        let handle = grant
            .get_token_with(&token_params(), move |result| {
                tx.send(result).unwrap();
            })
            .unwrap();
        handle.await.unwrap();
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn both_styles_return_the_access_token() {
        let http = RecordingClient::json(200, r#"{"access_token":"abc","token_type":"bearer"}"#);
        let client = client_with(http.clone());
        let grant = client.authorization_code();

        let from_callback = via_callback(grant).await.unwrap();
        let from_future = grant.get_token(&token_params()).unwrap().await.unwrap();

        assert_eq!(from_callback.access_token(), "abc");
        assert_eq!(from_future.access_token(), "abc");
        assert_eq!(from_callback, from_future);
    }

    #[tokio::test]
    async fn each_call_issues_exactly_one_post() {
        let http = RecordingClient::json(200, r#"{"access_token":"abc"}"#);
        let client = client_with(http.clone());
        let grant = client.authorization_code();

        via_callback(grant).await.unwrap();
        grant.get_token(&token_params()).unwrap().await.unwrap();

        let requests = http.requests();
        assert_eq!(requests.len(), 2);
        for request in requests {
            assert_eq!(request.method, reqwest::Method::POST);
            assert_eq!(request.url, "https://example.org/oauth/token");
            assert_eq!(std::str::from_utf8(&request.body).unwrap(), EXPECTED_BODY);
        }
    }

    #[tokio::test]
    async fn unconsumed_exchange_sends_nothing() {
        let http = RecordingClient::json(200, r#"{"access_token":"abc"}"#);
        let client = client_with(http.clone());

        let exchange = client.authorization_code().get_token(&token_params()).unwrap();
        drop(exchange);

        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn validation_errors_are_synchronous_and_send_nothing() {
        let http = RecordingClient::json(200, r#"{"access_token":"abc"}"#);
        let client = client_with(http.clone());
        let grant = client.authorization_code();

        let params = Params::from([("code", "code")]);
        assert!(matches!(grant.get_token(&params), Err(Error::Validation(_))));

        let called = Arc::new(AtomicUsize::new(0));
        let counter = called.clone();
        let result = grant.get_token_with(&params, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(matches!(result, Err(Error::Validation(_))));

        let authorize = grant.authorize_url(&Params::from([("scope", "user")]));
        assert_eq!(
            authorize.unwrap_err(),
            Error::Validation("redirect_uri is required".into())
        );

        assert!(http.requests().is_empty());
        assert_eq!(called.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn network_error_reaches_both_styles_verbatim() {
        let failure = Error::Network("connection refused".into());
        let http = RecordingClient::replying(Err(failure.clone()));
        let client = client_with(http.clone());
        let grant = client.authorization_code();

        let from_callback = via_callback(grant).await.unwrap_err();
        let from_future = grant.get_token(&token_params()).unwrap().await.unwrap_err();

        assert_eq!(from_callback, failure);
        assert_eq!(from_future, failure);
        assert_eq!(http.requests().len(), 2);
    }

    #[tokio::test]
    async fn provider_error_reaches_both_styles_identically() {
        let http = RecordingClient::json(
            400,
            r#"{"error":"invalid_grant","error_description":"bad code"}"#,
        );
        let client = client_with(http);
        let grant = client.authorization_code();

        let from_callback = via_callback(grant).await.unwrap_err();
        let from_future = grant.get_token(&token_params()).unwrap().await.unwrap_err();

        assert_eq!(from_callback, from_future);
        assert_eq!(from_future.oauth_error(), Some("invalid_grant"));
    }

    #[tokio::test]
    async fn callback_runs_exactly_once() {
        let http = RecordingClient::json(200, r#"{"access_token":"abc"}"#);
        let client = client_with(http);

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        client
            .authorization_code()
            .get_token_with(&token_params(), move |result| {
                assert!(result.is_ok());
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap()
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_exchanges_are_independent() {
        let http = RecordingClient::json(200, r#"{"access_token":"abc"}"#);
        let client = client_with(http.clone());
        let grant = client.authorization_code().clone();

        let mut handles = vec![];
        for i in 0..10 {
            let grant = grant.clone();
            handles.push(tokio::spawn(async move {
                let params = Params::from([
                    ("code", format!("code-{i}")),
                    ("redirect_uri", "http://callback.com".to_string()),
                ]);
                grant.get_token(&params).unwrap().await
            }));
        }
        for h in handles {
            assert_eq!(h.await.unwrap().unwrap().access_token(), "abc");
        }

        let mut codes: Vec<String> = http
            .requests()
            .iter()
            .map(|r| String::from_utf8(r.body.clone()).unwrap())
            .map(|body| body.split('&').next().unwrap().to_string())
            .collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 10);
    }

    #[test]
    fn callback_style_without_runtime_is_an_error() {
        let http = RecordingClient::json(200, r#"{"access_token":"abc"}"#);
        let client = client_with(http.clone());

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let result = client
            .authorization_code()
            .get_token_with(&token_params(), move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        assert!(
            matches!(result, Err(Error::Configuration(ref msg)) if msg.contains("tokio runtime")),
            "got: {:?}",
            result.map(|_| ())
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(http.requests().is_empty());
    }

    #[test]
    fn invalid_options_fail_construction() {
        let http = RecordingClient::json(200, "{}");
        let options = ClientOptions::new("", "secret", "https://example.org");
        let result = OAuth2Client::new(options, http);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    mod over_http {
        use super::*;
        use axum::extract::State;
        use axum::http::{HeaderMap, StatusCode};
        use tokio::net::TcpListener;

        /// Token endpoint that only accepts the exact default form body.
        async fn start_token_server() -> (String, Arc<AtomicUsize>) {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let url = format!("http://{}", listener.local_addr().unwrap());
            let hits = Arc::new(AtomicUsize::new(0));

            let app = axum::Router::new()
                .route(
                    "/oauth/token",
                    axum::routing::post(
                        |State(hits): State<Arc<AtomicUsize>>, headers: HeaderMap, body: String| async move {
                            hits.fetch_add(1, Ordering::SeqCst);
                            let form = headers
                                .get("content-type")
                                .is_some_and(|v| v == "application/x-www-form-urlencoded");
                            if form && body == EXPECTED_BODY {
                                (
                                    StatusCode::OK,
                                    axum::Json(serde_json::json!({
                                        "access_token": "ec1a59d298",
                                        "token_type": "bearer",
                                        "expires_in": 7200,
                                        "refresh_token": "ec1a59d298-refresh",
                                    })),
                                )
                            } else {
                                (
                                    StatusCode::BAD_REQUEST,
                                    axum::Json(serde_json::json!({
                                        "error": "invalid_request",
                                        "error_description": body,
                                    })),
                                )
                            }
                        },
                    ),
                )
                .with_state(hits.clone());

            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            (url, hits)
        }

        #[tokio::test]
        async fn makes_the_http_request_once_per_style() {
            let (base, hits) = start_token_server().await;
            let client = OAuth2Client::with_reqwest(options(&base)).unwrap();
            let grant = client.authorization_code();

            let from_callback = via_callback(grant).await.unwrap();
            let from_future = grant.get_token(&token_params()).unwrap().await.unwrap();

            assert_eq!(hits.load(Ordering::SeqCst), 2);
            assert_eq!(from_callback.access_token(), "ec1a59d298");
            assert_eq!(from_future.access_token(), "ec1a59d298");
            assert_eq!(from_future.refresh_token(), Some("ec1a59d298-refresh"));
            assert_eq!(from_future.expires_in(), Some(7200));
        }

        #[tokio::test]
        async fn authorize_host_override_does_not_move_token_exchange() {
            let (base, hits) = start_token_server().await;
            let client = OAuth2Client::with_reqwest(
                options(&base).authorize_host("https://othersite.com"),
            )
            .unwrap();

            let token = client
                .authorization_code()
                .get_token(&token_params())
                .unwrap()
                .await
                .unwrap();
            assert_eq!(token.access_token(), "ec1a59d298");
            assert_eq!(hits.load(Ordering::SeqCst), 1);
        }
    }
}
