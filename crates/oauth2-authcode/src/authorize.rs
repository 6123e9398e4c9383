//! Authorization redirect URL construction
//!
//! The URL the resource owner's browser is sent to. Pure string building:
//! no I/O, same settings and params always give the same URL.

use tracing::debug;
use url::form_urlencoded;

use crate::config::ClientSettings;
use crate::error::{Error, Result};
use crate::params::AuthorizeParams;

pub const RESPONSE_TYPE: &str = "response_type";
pub const REDIRECT_URI: &str = "redirect_uri";

/// Build `<authorize_host><authorize_path>?<query>`.
///
/// Query order is fixed: `response_type=code`, `<id_param_name>=<id>`,
/// `redirect_uri`, then the caller's remaining params in insertion order.
/// Values are form-urlencoded, so `http://localhost:3000/callback` becomes
/// `http%3A%2F%2Flocalhost%3A3000%2Fcallback`.
pub fn authorize_url(settings: &ClientSettings, params: &AuthorizeParams) -> Result<String> {
    let redirect_uri = params.required(REDIRECT_URI)?;

    let id_param = settings.id_param_name();
    for reserved in [RESPONSE_TYPE, id_param] {
        if params.contains_key(reserved) {
            return Err(Error::Validation(format!(
                "{reserved} is set by the client and cannot be passed as an authorize param"
            )));
        }
    }

    let mut query = form_urlencoded::Serializer::new(String::new());
    query
        .append_pair(RESPONSE_TYPE, "code")
        .append_pair(id_param, settings.id())
        .append_pair(REDIRECT_URI, redirect_uri);
    for (key, value) in params.extras(&[REDIRECT_URI]) {
        query.append_pair(key, value);
    }

    let url = format!("{}?{}", settings.authorize_endpoint(), query.finish());
    debug!(
        endpoint = %settings.authorize_endpoint(),
        extra_params = params.len() - 1,
        "built authorize url"
    );
    Ok(url)
}
