//! Error types
//!
//! Defines the errors produced while building queries, parsing user input
//! and decoding replies. Transport failures are carried through unchanged.

use thiserror::Error;

/// Errors raised by strict reply decoding
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Sample value is not a valid number
    #[error("Invalid sample value: {0:?}")]
    InvalidValue(String),

    /// Sample timestamp is not a valid millisecond epoch
    #[error("Invalid sample timestamp: {0:?}")]
    InvalidTimestamp(String),
}

/// Errors raised when parsing query primitives from text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Unknown aggregation type token
    #[error("Unknown aggregation type: {0}")]
    AggregationType(String),

    /// Unknown reducer token
    #[error("Unknown reducer: {0}")]
    Reducer(String),

    /// Timestamp is neither a sentinel, a millisecond epoch nor RFC 3339
    #[error("Invalid timestamp: {0}")]
    Timestamp(String),

    /// Label filter expression could not be parsed
    #[error("Invalid filter: {0}")]
    Filter(String),
}

/// Errors returned by query calls
#[derive(Error, Debug)]
pub enum QueryError<E>
where
    E: std::error::Error + 'static,
{
    /// Failure reported by the transport, returned as-is
    #[error(transparent)]
    Transport(E),

    /// Reply could not be decoded (strict mode only)
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl<E> QueryError<E>
where
    E: std::error::Error + 'static,
{
    /// The transport error, if this is one
    pub fn as_transport(&self) -> Option<&E> {
        match self {
            QueryError::Transport(e) => Some(e),
            QueryError::Decode(_) => None,
        }
    }
}

/// Result type for query calls
pub type QueryResult<T, E> = Result<T, QueryError<E>>;
