//! Token exchange metrics
//!
//! - `oauth2_token_requests_total` (counter): label `outcome`
//! - `oauth2_token_request_duration_seconds` (histogram): label `outcome`
//!
//! Calls are no-ops until the embedding binary installs a recorder.

use crate::error::{Error, Result};

/// Label value for a finished exchange.
pub fn outcome<T>(result: &Result<T>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(Error::Network(_)) => "network_error",
        Err(Error::InvalidTokenResponse { .. }) => "invalid_response",
        Err(Error::Validation(_)) => "validation_error",
        Err(Error::Configuration(_)) => "configuration_error",
    }
}

pub fn record_token_request(outcome: &'static str, duration_secs: f64) {
    metrics::counter!("oauth2_token_requests_total", "outcome" => outcome).increment(1);
    metrics::histogram!("oauth2_token_request_duration_seconds", "outcome" => outcome)
        .record(duration_secs);
}
