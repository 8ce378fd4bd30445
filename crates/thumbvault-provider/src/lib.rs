//! Image providers for thumbvault.
//!
//! A provider stores encoded images keyed by [`ImageId`] and serves
//! aspect-preserving thumbnails of them.
//!
//! # Modules
//!
//! - [`traits`]: the [`ImageProvider`] contract
//! - [`filesystem`]: [`FileSystemImageProvider`], one file per image in a sharded tree
//! - [`cache`]: [`ThumbnailCache`], keeps computed thumbnails on disk
//! - [`memory`]: [`InMemoryImageProvider`]
//! - [`layout`]: id-to-path mapping and atomic file writes
//! - [`config`]: the option map providers are initialized from
//! - [`placeholder`]: bundled blank images for missing lookups

pub mod cache;
pub mod config;
pub mod error;
pub mod filesystem;
pub mod layout;
pub mod memory;
pub mod placeholder;
pub mod traits;

pub use cache::{CacheSnapshot, CacheStats, CachedFileSystemImageProvider, ThumbnailCache};
pub use config::{FileSystemOptions, ProviderConfig};
pub use error::{ProviderError, Result};
pub use filesystem::FileSystemImageProvider;
pub use layout::{Inventory, StorageLayout};
pub use memory::InMemoryImageProvider;
pub use placeholder::Placeholder;
pub use traits::ImageProvider;

pub use thumbvault_imaging::DynamicImage;
pub use thumbvault_types::{ImageFormat, ImageId, Size};
