use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid image identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("format '{0}' is unsupported")]
    UnsupportedFormat(String),
}
