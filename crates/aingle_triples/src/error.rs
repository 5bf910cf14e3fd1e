//! Error types for AIngle Triples.

use thiserror::Error;

/// A specialized `Result` type for triple model and index operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Defines the errors that can occur while building or converting triples and patterns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The provided triple data was malformed or invalid.
    #[error("invalid triple: {0}")]
    InvalidTriple(String),

    /// A pattern could not be used for the requested operation.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
}
