//! Errors returned by the fallible parts of the crate.
//!
//! Session and sampling operations never fail. Only parsing identifiers
//! received from outside the process and validating explicitly configured
//! values can.
use thiserror::Error;

/// Errors returned when parsing a [`SessionId`] from its textual form.
///
/// [`SessionId`]: crate::SessionId
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionIdError {
    /// The input is not exactly 32 characters long.
    #[error("session id must be 32 hex characters, got {0}")]
    InvalidLength(usize),

    /// The input contains a character other than `0-9` or `a-f`.
    #[error("session id must only contain lowercase hex characters")]
    InvalidCharacter,
}

/// Errors returned by [`SessionConfigBuilder::build`].
///
/// [`SessionConfigBuilder::build`]: crate::SessionConfigBuilder::build
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    /// The sample ratio is not a number in `[0.0, 1.0]`.
    #[error("sample ratio must be between 0.0 and 1.0, got {0}")]
    InvalidSampleRatio(f64),

    /// Sessions must live for a non-zero amount of time.
    #[error("max session age must be greater than zero")]
    ZeroMaxSessionAge,
}
