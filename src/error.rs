//! Error types for address parsing and encoding

use thiserror::Error;

/// Errors that can occur while parsing an address or address list.
///
/// Malformed input is never fatal to the high-level entry points: [`crate::parse`]
/// and friends log these at warning level and return no result. The typed
/// variants exist so callers of the `try_` entry points can decide how to
/// report a failure themselves.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Input was empty
    #[error("empty input")]
    Empty,

    /// Input exceeded a hard size ceiling
    #[error("input length {length} exceeds maximum of {max}")]
    TooLong { length: usize, max: usize },

    /// The tokenizer could not produce a token stream
    #[error("lexical error: {0}")]
    Lexical(String),

    /// The token stream did not match the requested grammar
    #[error("syntax error: {0}")]
    Syntax(String),

    /// A direct-construction entry point was called with unusable parts
    #[error("bad parameters: {0}")]
    BadParameters(String),
}

/// The address has no ASCII-compatible encoding.
///
/// Returned by [`crate::EmailAddress::to_ace`] when the local part contains
/// non-ASCII characters (IDNA covers the domain only). Check
/// [`crate::EmailAddress::requires_non_ascii`] first, or use `to_unicode`.
#[derive(Error, Debug)]
#[error("address {address} has no ASCII-compatible encoding")]
pub struct EncodingError {
    /// The offending address in `local@domain` form
    pub address: String,
}

/// Result type for address parsing operations
pub type Result<T, E = ParseError> = std::result::Result<T, E>;
