//! OAuth 2.0 authorization code CLI
//!
//! Thin command-line front end over `oauth2-authcode`:
//! 1. `authorize-url` prints the URL to send the user to
//! 2. `exchange` trades the returned code for a token and prints it as JSON
//!
//! Logs go to stderr as JSON so stdout stays machine-readable.

mod cli;
mod config;
mod error;

use anyhow::{Context, Result};
use oauth2_authcode::{
    OAuth2Client, Params, TokenResponse, compute_challenge, generate_state, generate_verifier,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command, USAGE};
use crate::config::Config;

const STATE: &str = "state";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match Cli::parse(args.as_slice()) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    match cli.command {
        Command::Help => println!("{USAGE}"),
        Command::AuthorizeUrl { params, pkce } => {
            let client = build_client(cli.config.as_deref())?;
            let (params, verifier) = authorize_params(params, pkce);
            let url = client.authorization_code().authorize_url(&params)?;
            if let Some(verifier) = verifier {
                // Needed later as `exchange code_verifier=...`
                eprintln!("code_verifier={verifier}");
            }
            println!("{url}");
        }
        Command::Exchange { params } => {
            let client = build_client(cli.config.as_deref())?;
            let token = client.authorization_code().get_token(&params)?.await?;
            println!("{}", render(&token)?);
        }
    }

    Ok(())
}

fn build_client(cli_path: Option<&str>) -> Result<OAuth2Client> {
    let config_path = Config::resolve_path(cli_path);
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    info!(config = %config_path.display(), client_id = %config.client.id, "loaded configuration");

    let http = reqwest::Client::builder()
        .timeout(config.timeout())
        .build()
        .context("failed to build HTTP client")?;
    OAuth2Client::new(config.client_options(), Arc::new(http))
        .context("invalid client configuration")
}

/// Fill in a random `state` when the caller gave none, and a PKCE
/// challenge when requested. Returns the verifier to hand back to the user.
fn authorize_params(mut params: Params, pkce: bool) -> (Params, Option<String>) {
    if params.get(STATE).is_none_or(str::is_empty) {
        params.insert(STATE, generate_state());
    }
    if !pkce {
        return (params, None);
    }
    let verifier = generate_verifier();
    let params = params.with_pkce_challenge(compute_challenge(&verifier));
    (params, Some(verifier))
}

fn render(token: &TokenResponse) -> Result<String> {
    serde_json::to_string_pretty(token).context("failed to serialize token response")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_state_when_absent_or_empty() {
        let (params, verifier) = authorize_params(Params::from([("redirect_uri", "x")]), false);
        assert_eq!(params.get(STATE).unwrap().len(), 43);
        assert!(verifier.is_none());

        let (params, _) = authorize_params(Params::from([("state", "")]), false);
        assert!(!params.get(STATE).unwrap().is_empty());
    }

    #[test]
    fn keeps_caller_state() {
        let (params, _) = authorize_params(Params::from([("state", "02afe928b")]), false);
        assert_eq!(params.get(STATE), Some("02afe928b"));
    }

    #[test]
    fn pkce_adds_challenge_for_returned_verifier() {
        let (params, verifier) = authorize_params(Params::from([("redirect_uri", "x")]), true);
        let verifier = verifier.unwrap();
        assert_eq!(
            params.get("code_challenge"),
            Some(compute_challenge(&verifier).as_str())
        );
        assert_eq!(params.get("code_challenge_method"), Some("S256"));
    }

    #[test]
    fn renders_token_as_json() {
        let mut fields = serde_json::Map::new();
        fields.insert("access_token".into(), "abc".into());
        let token = TokenResponse::try_from(fields).unwrap();
        let rendered = render(&token).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, serde_json::json!({"access_token": "abc"}));
    }
}
