//! Error types for ratcom.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for ratcom operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Expect-engine and transport stream errors
    #[error("Expect error: {0}")]
    Expect(#[from] ExpectError),

    /// A bounded interactive retry loop was exceeded
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Invalid or incomplete device identity
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by the expect engine and the underlying byte stream.
#[derive(Error, Debug)]
pub enum ExpectError {
    /// No expected pattern was observed within the budget
    #[error("No pattern matched within {0:?}")]
    Timeout(Duration),

    /// The transport stream ended before any pattern matched
    #[error("Stream ended before a pattern matched")]
    Eof,

    /// The transport was already closed when the operation started
    #[error("Transport closed")]
    Closed,

    /// Invalid regex pattern
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// I/O error from the spawned client process
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A bounded retry loop on an interactive prompt was exceeded.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The ssh client asked to confirm a new host key more than once
    #[error("cannot persist host key: second host-key prompt after acceptance")]
    HostKeyRejected,

    /// The device asked for the password again after it was sent
    #[error("password rejected: second password prompt after send")]
    PasswordRejected,

    /// Privilege escalation did not reach the prompt
    #[error("enable escalation failed on '{host}'")]
    EnableFailed { host: String },

    /// The logout confirmation loop exceeded its bound
    #[error("cannot log out: confirmation loop exceeded {limit} iterations")]
    LogoutFailed { limit: usize },
}

/// Invalid or incomplete device identity.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required HostSpec field is missing
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    /// The vendor type tag is not in the supported enumeration
    #[error("unknown vendor type: '{tag}'")]
    UnknownVendor { tag: String },
}

/// Result type alias using ratcom's Error.
pub type Result<T> = std::result::Result<T, Error>;
