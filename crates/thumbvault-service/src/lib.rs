//! Provider registry for thumbvault.
//!
//! Applications describe their providers in a TOML file, build one
//! [`ImageService`] from it at startup, and look providers up by name. A
//! blank name means the configured default.

pub mod config;
pub mod error;
pub mod service;

pub use config::{
    ProviderKind, ProviderSettings, ServiceConfig, DEFAULT_CONFIG_FILE, DEFAULT_PROVIDER_NAME,
};
pub use error::{ServiceError, ServiceResult};
pub use service::{ImageService, ProviderStats, SharedImageService};
