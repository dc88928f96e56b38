//! Error types for wwr

use crate::codec::DecodeWarning;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    #[error("Malformed {file}: {warning}")]
    Decode {
        file: String,
        warning: DecodeWarning,
    },

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// True for outcomes the wire protocol reports as sentinels rather than failures
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::AlreadyExists(_))
    }
}
