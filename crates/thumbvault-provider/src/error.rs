use std::io;
use std::path::PathBuf;

use thumbvault_imaging::ImagingError;
use thumbvault_types::TypeError;

/// Errors from image provider operations.
///
/// A missing image is not an error: lookups return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The identifier is absent or not a well-formed UUID.
    #[error("invalid image identifier: {0}")]
    InvalidIdentifier(String),

    /// A required option is missing, malformed, or not recognised.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The storage environment failed (missing root, not writable, I/O).
    #[error("{message}")]
    Storage {
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    /// A directory outside the storage root was requested.
    #[error("path {} escapes the storage root {}", .path.display(), .root.display())]
    PathEscape { path: PathBuf, root: PathBuf },

    /// The image format name is not one of the supported formats.
    #[error("format '{0}' is unsupported")]
    UnsupportedFormat(String),

    /// Decoding, encoding, or resampling failed.
    #[error(transparent)]
    Imaging(#[from] ImagingError),

    /// The provider was disposed and can no longer serve requests.
    #[error("image provider '{0}' has been disposed")]
    Disposed(String),
}

impl ProviderError {
    /// A storage failure caused by an I/O error.
    pub fn storage(message: impl Into<String>, source: io::Error) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(source),
        }
    }

    /// A storage failure with no underlying cause.
    pub fn storage_message(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }
}

impl From<TypeError> for ProviderError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidIdentifier(value) => Self::InvalidIdentifier(value),
            TypeError::UnsupportedFormat(name) => Self::UnsupportedFormat(name),
        }
    }
}

/// Result alias for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;
