//! Provider option map.
//!
//! Providers are configured from a flat string-to-string map. Each provider
//! takes the keys it understands during initialization and then asks the map
//! to confirm nothing is left over, so a misspelled option is an error rather
//! than a silent default.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thumbvault_types::ImageFormat;

use crate::error::{ProviderError, Result};

/// Root directory of a file-system provider.
pub const FILE_SYSTEM_PATH: &str = "fileSystemPath";
/// Encoding used for originals and thumbnails.
pub const IMAGE_FORMAT: &str = "imageFormat";
/// Whether missing images are answered with a blank placeholder.
pub const SEND_BLANK_IMAGE: &str = "sendBlankImage";

/// Key/value options handed to a provider at initialization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, OptionValue>",
    into = "BTreeMap<String, String>"
)]
pub struct ProviderConfig {
    options: BTreeMap<String, String>,
}

/// A single option as written in a config file.
///
/// TOML tables may spell `sendBlankImage = true` or `"true"`; both end up as
/// the same string.
#[derive(Deserialize)]
#[serde(untagged)]
enum OptionValue {
    Text(String),
    Flag(bool),
    Integer(i64),
}

impl From<OptionValue> for String {
    fn from(value: OptionValue) -> Self {
        match value {
            OptionValue::Text(s) => s,
            OptionValue::Flag(b) => b.to_string(),
            OptionValue::Integer(i) => i.to_string(),
        }
    }
}

impl From<BTreeMap<String, OptionValue>> for ProviderConfig {
    fn from(raw: BTreeMap<String, OptionValue>) -> Self {
        Self {
            options: raw.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }
}

impl From<ProviderConfig> for BTreeMap<String, String> {
    fn from(config: ProviderConfig) -> Self {
        config.options
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ProviderConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            options: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Remove and return a raw option.
    pub fn take_string(&mut self, key: &str) -> Option<String> {
        self.options.remove(key)
    }

    /// Remove and parse a boolean option (`true`/`false`, any case).
    pub fn take_bool(&mut self, key: &str) -> Result<Option<bool>> {
        let Some(raw) = self.take_string(key) else {
            return Ok(None);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(ProviderError::Configuration(format!(
                "{key} must be true or false, got {raw:?}"
            ))),
        }
    }

    /// Remove and parse an image format option.
    pub fn take_format(&mut self, key: &str) -> Result<Option<ImageFormat>> {
        self.take_string(key)
            .map(|raw| ImageFormat::from_name(&raw).map_err(ProviderError::from))
            .transpose()
    }

    /// Fail if any option was not taken by the provider.
    pub fn ensure_consumed(&self) -> Result<()> {
        match self.options.keys().next() {
            Some(key) => Err(ProviderError::Configuration(format!(
                "unrecognized configuration property: {key}"
            ))),
            None => Ok(()),
        }
    }
}

/// Validated-shape options for a file-system provider.
///
/// `root` may still be empty here; the provider rejects that when it opens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSystemOptions {
    pub root: PathBuf,
    pub image_format: ImageFormat,
    pub send_blank_image: bool,
}

impl FileSystemOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            image_format: ImageFormat::default(),
            send_blank_image: false,
        }
    }

    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.image_format = format;
        self
    }

    pub fn with_blank_image(mut self, send: bool) -> Self {
        self.send_blank_image = send;
        self
    }

    /// Take the file-system keys out of `config`.
    pub fn from_config(config: &mut ProviderConfig) -> Result<Self> {
        let root = config
            .take_string(FILE_SYSTEM_PATH)
            .map(|raw| PathBuf::from(raw.trim()))
            .unwrap_or_default();
        let image_format = config.take_format(IMAGE_FORMAT)?.unwrap_or_default();
        let send_blank_image = config.take_bool(SEND_BLANK_IMAGE)?.unwrap_or(false);
        Ok(Self {
            root,
            image_format,
            send_blank_image,
        })
    }
}
