//! Argument parsing
//!
//! ```text
//! oauth2-authcode [--config PATH] authorize-url [--pkce] key=value...
//! oauth2-authcode [--config PATH] exchange key=value...
//! ```

use oauth2_authcode::Params;

use crate::error::{Error, Result};

pub const USAGE: &str = "\
usage: oauth2-authcode [--config PATH] <command> [key=value...]

commands:
  authorize-url [--pkce] redirect_uri=URI [scope=...] [state=...] [key=value...]
      print the authorization URL (a random state is added when absent)
  exchange code=CODE redirect_uri=URI [code_verifier=...] [key=value...]
      exchange an authorization code and print the token response as JSON";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    AuthorizeUrl { params: Params, pkce: bool },
    Exchange { params: Params },
    Help,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Cli {
    pub config: Option<String>,
    pub command: Command,
}

impl Cli {
    /// Parse arguments (without the program name).
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let mut config = None;
        let mut pkce = false;
        let mut command = None;
        let mut params = Params::new();

        let mut iter = args.iter().map(AsRef::<str>::as_ref);
        while let Some(arg) = iter.next() {
            match arg {
                "-h" | "--help" => {
                    return Ok(Self {
                        config,
                        command: Command::Help,
                    });
                }
                "--config" => {
                    let path = iter
                        .next()
                        .ok_or_else(|| Error::MissingValue("--config".into()))?;
                    config = Some(path.to_owned());
                }
                "--pkce" => pkce = true,
                flag if flag.starts_with("--") => return Err(Error::UnknownFlag(flag.into())),
                name if command.is_none() => command = Some(name.to_owned()),
                pair => {
                    let (key, value) = pair
                        .split_once('=')
                        .filter(|(k, _)| !k.is_empty())
                        .ok_or_else(|| Error::InvalidParam(pair.into()))?;
                    params.insert(key, value);
                }
            }
        }

        let command = match command.as_deref() {
            None => return Err(Error::MissingCommand),
            Some("authorize-url") => Command::AuthorizeUrl { params, pkce },
            Some("exchange") if pkce => return Err(Error::UnknownFlag("--pkce".into())),
            Some("exchange") => Command::Exchange { params },
            Some("help") => Command::Help,
            Some(other) => return Err(Error::UnknownCommand(other.into())),
        };

        Ok(Self { config, command })
    }
}
