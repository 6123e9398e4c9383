//! Command-line errors

use thiserror::Error;

/// Argument parsing errors. Config and exchange failures carry their own
/// types and are wrapped with context in `main`.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("missing command, expected `authorize-url` or `exchange`")]
    MissingCommand,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("{0} requires a value")]
    MissingValue(String),

    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("expected key=value, got: {0}")]
    InvalidParam(String),
}

/// Result alias using CLI Error
pub type Result<T> = std::result::Result<T, Error>;
