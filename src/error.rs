//! Domain-specific errors for the ledger.
//!
//! Contains error variants for common failure cases like:
//! - Referenced entities that do not exist, or collide on creation
//! - Stored bytes that no longer decode
//! - Caller input that can never be valid (non-positive amounts, malformed IDs)
//! - Failures reported by the underlying record store
//!
//! No variant is retried locally; every error surfaces to the caller as-is.

use thiserror::Error;

use crate::codec::Kind;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("{kind} {id} does not exist")]
    NotFound { kind: Kind, id: String },

    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: Kind, id: String },

    #[error("corrupt record at {key:?}: {reason}")]
    CorruptRecord { key: String, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),
}

impl Error {
    pub(crate) fn not_found(kind: Kind, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn already_exists(kind: Kind, id: impl Into<String>) -> Self {
        Error::AlreadyExists {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn overflow(what: impl std::fmt::Display) -> Self {
        Error::InvalidArgument(format!("{what} overflows the decimal range"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
