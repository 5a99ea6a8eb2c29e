//! Error types for redisugar
//!
//! This module defines every failure an adapter can report. Local validation
//! failures (`TypeMismatch`, `IndexOutOfRange`, `InvalidArgument`) are raised
//! before any mutating round trip, so they never leave the remote value
//! partially modified.
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use thiserror::Error;

/// Result type alias for redisugar operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for redisugar
#[derive(Debug, Error)]
pub enum Error {
    /// A value of one remote type was used where another was required
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// What the operation needed
        expected: String,
        /// What was actually found
        actual: String,
    },

    /// Integer index outside `[-len, len)`
    #[error("Index out of range: index {index} for '{key}' of length {len}")]
    IndexOutOfRange {
        /// Namespace key of the indexed value
        key: String,
        /// The offending index as supplied by the caller
        index: i64,
        /// Length observed when the index was checked
        len: usize,
    },

    /// Key, field or member absent where presence is required
    #[error("Not found: {0}")]
    NotFound(String),

    /// Argument has the wrong shape or value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A stored string could not be projected into the requested type
    #[error("Cannot decode {value:?} as {target}")]
    Decode {
        /// Raw stored value
        value: String,
        /// Name of the target type
        target: &'static str,
    },

    /// Session with the store could not be established or was lost
    #[error("Connection error: {0}")]
    Connection(String),

    /// Reply did not have the shape the command promises
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Error reply from the store that has no more specific mapping
    #[error("Remote error: {0}")]
    Remote(String),

    /// I/O error (sockets, snapshot files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Build a `NotFound` error
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }

    /// Build an `InvalidArgument` error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Build a `TypeMismatch` error
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Build a `Protocol` error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Error::Protocol(msg.into())
    }

    /// Map an error reply string from the store into the taxonomy
    ///
    /// `WRONGTYPE` replies become `TypeMismatch`; everything else is `Remote`.
    pub fn from_reply(message: &str) -> Self {
        if let Some(rest) = message.strip_prefix("WRONGTYPE") {
            Error::TypeMismatch {
                expected: "value of matching type".to_string(),
                actual: rest.trim().to_string(),
            }
        } else {
            Error::Remote(message.to_string())
        }
    }

    /// True for `NotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_index_out_of_range() {
        let err = Error::IndexOutOfRange {
            key: "seq".to_string(),
            index: 7,
            len: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("Index out of range"));
        assert!(msg.contains("seq"));
        assert!(msg.contains('7'));
        assert!(msg.contains('3'));
    }

    #[test]
    fn test_error_display_type_mismatch() {
        let err = Error::type_mismatch("set", "list");
        let msg = err.to_string();
        assert!(msg.contains("expected set"));
        assert!(msg.contains("got list"));
    }

    #[test]
    fn test_error_display_decode() {
        let err = Error::Decode {
            value: "abc".to_string(),
            target: "i64",
        };
        assert!(err.to_string().contains("\"abc\""));
        assert!(err.to_string().contains("i64"));
    }

    #[test]
    fn test_from_reply_wrongtype() {
        let err = Error::from_reply(
            "WRONGTYPE Operation against a key holding the wrong kind of value",
        );
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_from_reply_generic() {
        let err = Error::from_reply("ERR index out of range");
        assert!(matches!(err, Error::Remote(ref m) if m == "ERR index out of range"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::not_found("field 'a'").is_not_found());
        assert!(!Error::invalid("bad").is_not_found());
    }
}
