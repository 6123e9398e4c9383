//! OAuth2 authorization code grant client
//!
//! Builds the provider authorization URL and exchanges the returned code
//! for an access token. Provider deviations (custom client id parameter
//! names, a separate authorize host, Basic-auth credentials, JSON bodies)
//! are handled through `ClientOptions`.
//!
//! Flow:
//! 1. `ClientSettings::resolve()` validates options once (via `OAuth2Client::new`)
//! 2. `AuthorizationCode::authorize_url()` builds the redirect for the user agent
//! 3. The provider redirects back with `code` (and the `state` you sent)
//! 4. `AuthorizationCode::get_token()` encodes the exchange, returning a
//!    `TokenExchange` to await or hand a callback
//! 5. The configured `HttpClient` sends one POST; `TokenResponse::from_http()`
//!    normalizes the reply
//!
//! Token storage and refresh are left to the caller.

pub mod authorize;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod params;
pub mod pkce;
pub mod request;
pub mod response;

pub use authorize::authorize_url;
pub use client::{AuthorizationCode, OAuth2Client, TokenExchange};
pub use config::{
    AuthOptions, BodyFormat, ClientCredentials, ClientOptions, ClientSettings,
    CredentialsPlacement, HeaderInjection, RequestOptions,
};
pub use error::{Error, Result};
pub use http::{HttpClient, HttpRequest, HttpResponse};
pub use params::{AuthorizeParams, Params, TokenRequestParams};
pub use pkce::{compute_challenge, generate_state, generate_verifier};
pub use request::token_request;
pub use response::TokenResponse;
