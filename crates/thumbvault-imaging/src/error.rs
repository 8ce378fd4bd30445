use thumbvault_types::ImageFormat;

/// Errors from decoding, encoding, or resampling images.
#[derive(Debug, thiserror::Error)]
pub enum ImagingError {
    /// A resample target with a non-positive side.
    #[error("invalid target dimensions {width}x{height}: both sides must be greater than zero")]
    InvalidDimensions { width: i32, height: i32 },

    /// The bytes are not a decodable image.
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// The encoder rejected the image.
    #[error("failed to encode image as {format}: {source}")]
    Encode {
        format: ImageFormat,
        #[source]
        source: image::ImageError,
    },

    /// Reading a source file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for imaging operations.
pub type Result<T> = std::result::Result<T, ImagingError>;
