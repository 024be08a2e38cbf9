//! Error types for fwpolicy.

use thiserror::Error;

/// Error type for the service surfaces (listener, client, configuration).
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A connection did not complete within the configured timeout
    #[error("timed out while {0}")]
    Timeout(&'static str),

    /// Rule command error
    #[error(transparent)]
    Rule(#[from] RuleError),
}

/// Result type alias for fwpolicy operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for rule store and command operations.
///
/// Every variant is recovered by the command interpreter and turned into
/// response text; none of them ever reaches a connection handler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// Missing or malformed operand tokens
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Octet or port out of bounds, or high bound before low bound
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// No stored rule has the requested raw text
    #[error("rule not found")]
    NotFound,

    /// Unrecognized first character of a command
    #[error("illegal opcode")]
    IllegalOpcode,
}
