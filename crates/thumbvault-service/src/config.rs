use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thumbvault_provider::config::FILE_SYSTEM_PATH;
use thumbvault_provider::ProviderConfig;

use crate::error::ServiceResult;

/// Name used for the default provider when none is configured.
pub const DEFAULT_PROVIDER_NAME: &str = "FileSystemImageProvider";

/// Config file looked up when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "thumbvault.toml";

/// Which provider implementation backs a registration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    FileSystem,
    CachedFileSystem,
    Memory,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileSystem => "file_system",
            Self::CachedFileSystem => "cached_file_system",
            Self::Memory => "memory",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named provider and its options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub name: String,
    #[serde(default)]
    pub kind: ProviderKind,
    #[serde(default)]
    pub options: ProviderConfig,
}

impl ProviderSettings {
    pub fn new(name: impl Into<String>, kind: ProviderKind) -> Self {
        Self {
            name: name.into(),
            kind,
            options: ProviderConfig::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key, value);
        self
    }
}

/// Top-level service configuration.
///
/// ```toml
/// default_provider = "images"
///
/// [[providers]]
/// name = "images"
/// kind = "cached_file_system"
///
/// [providers.options]
/// fileSystemPath = "/var/lib/thumbvault"
/// imageFormat = "png"
/// sendBlankImage = true
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_provider_name")]
    pub default_provider: String,
    #[serde(default)]
    pub providers: Vec<ProviderSettings>,
}

fn default_provider_name() -> String {
    DEFAULT_PROVIDER_NAME.to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider_name(),
            providers: Vec::new(),
        }
    }
}

impl ServiceConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> ServiceResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> ServiceResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// A single file-system provider registered under the default name.
    pub fn file_system(root: impl Into<PathBuf>, cached: bool) -> Self {
        let kind = if cached {
            ProviderKind::CachedFileSystem
        } else {
            ProviderKind::FileSystem
        };
        let root: PathBuf = root.into();
        Self {
            default_provider: default_provider_name(),
            providers: vec![ProviderSettings::new(DEFAULT_PROVIDER_NAME, kind)
                .with_option(FILE_SYSTEM_PATH, root.to_string_lossy())],
        }
    }

    pub fn with_provider(mut self, settings: ProviderSettings) -> Self {
        self.providers.push(settings);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServiceConfig::default();
        assert_eq!(c.default_provider, "FileSystemImageProvider");
        assert!(c.providers.is_empty());
    }

    #[test]
    fn parse_full_document() {
        let c = ServiceConfig::from_toml_str(
            r#"
            default_provider = "images"

            [[providers]]
            name = "images"
            kind = "cached_file_system"

            [providers.options]
            fileSystemPath = "/var/lib/thumbvault"
            imageFormat = "png"
            sendBlankImage = true

            [[providers]]
            name = "scratch"
            kind = "memory"
            "#,
        )
        .unwrap();
        assert_eq!(c.default_provider, "images");
        assert_eq!(c.providers.len(), 2);
        assert_eq!(c.providers[0].kind, ProviderKind::CachedFileSystem);
        assert_eq!(c.providers[0].options.get("sendBlankImage"), Some("true"));
        assert_eq!(c.providers[1].kind, ProviderKind::Memory);
        assert!(c.providers[1].options.is_empty());
    }

    #[test]
    fn kind_defaults_to_file_system() {
        let c = ServiceConfig::from_toml_str(
            r#"
            [[providers]]
            name = "FileSystemImageProvider"
            options = { fileSystemPath = "/data" }
            "#,
        )
        .unwrap();
        assert_eq!(c.default_provider, DEFAULT_PROVIDER_NAME);
        assert_eq!(c.providers[0].kind, ProviderKind::FileSystem);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = ServiceConfig::from_toml_str(
            r#"
            [[providers]]
            name = "x"
            kind = "database"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, crate::ServiceError::Toml(_)));
    }

    #[test]
    fn file_system_shortcut() {
        let c = ServiceConfig::file_system("/data", true);
        assert_eq!(c.providers.len(), 1);
        assert_eq!(c.providers[0].name, DEFAULT_PROVIDER_NAME);
        assert_eq!(c.providers[0].kind, ProviderKind::CachedFileSystem);
        assert_eq!(c.providers[0].options.get(FILE_SYSTEM_PATH), Some("/data"));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServiceConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, crate::ServiceError::Io(_)));
    }
}
