//! Pixel-level operations for thumbvault.
//!
//! This crate is the only place that talks to the `image` crate directly.
//! Providers hand it encoded bytes or decoded images and get the same back.
//!
//! # Modules
//!
//! - [`codec`]: decode/encode in one of the supported [`ImageFormat`]s
//! - [`resize`]: target-size computation and bicubic resampling
//! - [`error`]: [`ImagingError`]

pub mod codec;
pub mod error;
pub mod resize;

pub use codec::{decode, decode_file, encode, extension_for};
pub use error::{ImagingError, Result};
pub use resize::{
    compute_target_size, create_thumbnail, create_thumbnail_from_file, resample, thumbnail_size,
};

// Re-exported so downstream crates name one image type.
pub use image::DynamicImage;
pub use thumbvault_types::{content_type_hint, ImageFormat, Size};
