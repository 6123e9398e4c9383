//! Error types for the authorization code client

/// Errors from configuring the client and running the code exchange.
///
/// `Clone` so the future and callback surfaces can hand out the same
/// failure value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Invalid or missing client settings. Fatal to the client being built.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A required per-call parameter is missing or reserved. Raised before
    /// any network I/O.
    #[error("validation error: {0}")]
    Validation(String),

    /// Transport failure reported by the HTTP client (DNS, connect, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx status or a body that is not a usable token response.
    #[error("invalid token response: {message}")]
    InvalidTokenResponse {
        /// HTTP status of the token endpoint response
        status: u16,
        /// OAuth2 `error` code from the provider body, when present
        error: Option<String>,
        /// OAuth2 `error_description` from the provider body, when present
        description: Option<String>,
        message: String,
    },
}

impl Error {
    pub(crate) fn invalid_response(status: u16, message: impl Into<String>) -> Self {
        Self::InvalidTokenResponse {
            status,
            error: None,
            description: None,
            message: message.into(),
        }
    }

    /// OAuth2 error code carried by an `InvalidTokenResponse`, if any.
    pub fn oauth_error(&self) -> Option<&str> {
        match self {
            Self::InvalidTokenResponse { error, .. } => error.as_deref(),
            _ => None,
        }
    }
}

/// Result alias for authorization code operations.
pub type Result<T> = std::result::Result<T, Error>;
