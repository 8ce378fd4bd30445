//! Image provider backed by a sharded directory tree.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tempfile::NamedTempFile;
use thumbvault_imaging::DynamicImage;
use thumbvault_types::{ImageFormat, ImageId};
use tracing::{debug, info};

use crate::config::{FileSystemOptions, ProviderConfig, FILE_SYSTEM_PATH};
use crate::error::{ProviderError, Result};
use crate::layout::{Inventory, StorageLayout};
use crate::placeholder::Placeholder;
use crate::traits::ImageProvider;

/// Stores each image as one file under `root/<c[0..1]>/<c[0..4]>/`.
///
/// A provider only exists in its initialized state: [`initialize`] and
/// [`open`] validate the root before returning. [`dispose`] (or dropping the
/// provider) releases the placeholder, after which every operation fails
/// with [`ProviderError::Disposed`].
///
/// [`initialize`]: FileSystemImageProvider::initialize
/// [`open`]: FileSystemImageProvider::open
/// [`dispose`]: FileSystemImageProvider::dispose
#[derive(Debug)]
pub struct FileSystemImageProvider {
    name: String,
    layout: StorageLayout,
    image_format: ImageFormat,
    send_blank_image: bool,
    placeholder: Mutex<Option<Placeholder>>,
    disposed: AtomicBool,
}

impl FileSystemImageProvider {
    /// Build a provider from an option map, rejecting unknown options.
    pub fn initialize(name: impl Into<String>, mut config: ProviderConfig) -> Result<Self> {
        let options = FileSystemOptions::from_config(&mut config)?;
        config.ensure_consumed()?;
        Self::open(name, options)
    }

    /// Build a provider from typed options.
    pub fn open(name: impl Into<String>, options: FileSystemOptions) -> Result<Self> {
        let name = name.into();
        validate_root(&options.root)?;
        info!(
            provider = %name,
            root = %options.root.display(),
            format = %options.image_format,
            send_blank_image = options.send_blank_image,
            "initialized file-system image provider"
        );
        Ok(Self {
            name,
            layout: StorageLayout::new(options.root),
            image_format: options.image_format,
            send_blank_image: options.send_blank_image,
            placeholder: Mutex::new(None),
            disposed: AtomicBool::new(false),
        })
    }

    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn send_blank_image(&self) -> bool {
        self.send_blank_image
    }

    /// Where the original of `id` lives.
    pub fn path_for(&self, id: &ImageId) -> PathBuf {
        self.layout.filename_for(id, self.image_format)
    }

    /// Count what is stored under the root.
    pub fn inventory(&self) -> Result<Inventory> {
        self.ensure_open()?;
        self.layout.inventory()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Release the placeholder and refuse further requests. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let released = self
            .placeholder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        debug!(
            provider = %self.name,
            released_placeholder = released,
            "disposed image provider"
        );
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(ProviderError::Disposed(self.name.clone()));
        }
        Ok(())
    }

    /// A copy of the placeholder, loading it on first use.
    fn placeholder_image(&self) -> Result<DynamicImage> {
        let mut slot = self
            .placeholder
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Re-check under the lock so a concurrent dispose cannot be undone.
        self.ensure_open()?;
        if let Some(placeholder) = slot.as_ref() {
            return Ok(placeholder.image());
        }
        let placeholder = Placeholder::for_format(self.image_format)?;
        debug!(provider = %self.name, "loaded placeholder image");
        let image = placeholder.image();
        *slot = Some(placeholder);
        Ok(image)
    }
}

impl ImageProvider for FileSystemImageProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn image_format(&self) -> ImageFormat {
        self.image_format
    }

    fn check_open(&self) -> Result<()> {
        self.ensure_open()
    }

    fn save_image_with_id(&self, id: &ImageId, image: &DynamicImage) -> Result<()> {
        self.ensure_open()?;
        let path = self.path_for(id);
        self.layout.write_image(&path, image, self.image_format)?;
        debug!(provider = %self.name, id = %id, "saved image");
        Ok(())
    }

    fn get_image(&self, id: &ImageId) -> Result<Option<DynamicImage>> {
        self.ensure_open()?;
        if let Some(image) = self.layout.read_image(&self.path_for(id))? {
            return Ok(Some(image));
        }
        debug!(provider = %self.name, id = %id, "image not found");
        if self.send_blank_image {
            return self.placeholder_image().map(Some);
        }
        Ok(None)
    }

    fn delete_image(&self, id: &ImageId) -> Result<()> {
        self.ensure_open()?;
        let removed = self.layout.remove_file(&self.path_for(id))?;
        debug!(provider = %self.name, id = %id, removed, "deleted image");
        Ok(())
    }
}

impl Drop for FileSystemImageProvider {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn validate_root(root: &Path) -> Result<()> {
    if root.as_os_str().is_empty() {
        return Err(ProviderError::Configuration(format!(
            "{FILE_SYSTEM_PATH} is required for the file-system image provider"
        )));
    }
    if !root.is_dir() {
        return Err(ProviderError::storage_message(format!(
            "configured path does not exist: {}",
            root.display()
        )));
    }

    let check_failed = |err| {
        ProviderError::storage(
            format!("configured path is not writable: {}", root.display()),
            err,
        )
    };
    let mut scratch = NamedTempFile::new_in(root).map_err(check_failed)?;
    scratch.write_all(b"thumbvault").map_err(check_failed)?;
    scratch.close().map_err(check_failed)?;
    Ok(())
}
