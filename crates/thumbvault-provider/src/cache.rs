//! Disk-backed thumbnail cache.
//!
//! [`ThumbnailCache`] wraps any provider and keeps each thumbnail it hands
//! out as a file next to the original. Entries are keyed by id, requested
//! bounds and format, and are never invalidated: a re-saved original keeps
//! serving its old thumbnails until [`ThumbnailCache::purge`] removes them.
//! The same holds for placeholders: when the inner provider answers a
//! missing id with a blank image, that blank is cached under the id and is
//! still served after a real image is saved with it, until purged.
//!
//! Writers do not coordinate. Each entry is written to a temporary file and
//! renamed into place, so concurrent misses on one key both compute the
//! thumbnail, the last rename wins, and no reader sees a partial file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use thumbvault_imaging::DynamicImage;
use thumbvault_types::{ImageFormat, ImageId};
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use crate::filesystem::FileSystemImageProvider;
use crate::layout::StorageLayout;
use crate::traits::ImageProvider;

/// File-system provider with its thumbnails cached under its own root.
pub type CachedFileSystemImageProvider = ThumbnailCache<FileSystemImageProvider>;

/// Counters for cache activity.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
}

impl CacheStats {
    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }
}

/// Caches thumbnails of an inner provider on disk.
#[derive(Debug)]
pub struct ThumbnailCache<P> {
    inner: P,
    layout: StorageLayout,
    stats: CacheStats,
}

impl<P: ImageProvider> ThumbnailCache<P> {
    /// Cache `inner`'s thumbnails under `layout`'s root.
    pub fn new(inner: P, layout: StorageLayout) -> Self {
        Self {
            inner,
            layout,
            stats: CacheStats::default(),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn into_inner(self) -> P {
        self.inner
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn stats(&self) -> CacheSnapshot {
        self.stats.snapshot()
    }

    /// Cache file for a thumbnail request.
    pub fn entry_path(&self, id: &ImageId, max_width: i32, max_height: i32) -> PathBuf {
        self.layout
            .thumbnail_filename_for(id, max_width, max_height, self.inner.image_format())
    }

    /// Remove every cached thumbnail of `id`. Returns how many were removed.
    pub fn purge(&self, id: &ImageId) -> Result<usize> {
        let mut removed = 0;
        for path in self.layout.thumbnails_of(id)? {
            if self.layout.remove_file(&path)? {
                removed += 1;
            }
        }
        debug!(provider = %self.inner.name(), id = %id, removed, "purged cached thumbnails");
        Ok(removed)
    }

    fn read_back(&self, path: &Path) -> Result<DynamicImage> {
        self.layout.read_image(path)?.ok_or_else(|| {
            ProviderError::storage_message(format!(
                "cached thumbnail disappeared after writing: {}",
                path.display()
            ))
        })
    }
}

impl ThumbnailCache<FileSystemImageProvider> {
    /// Initialize a file-system provider and cache under its root.
    pub fn initialize(name: impl Into<String>, config: ProviderConfig) -> Result<Self> {
        let inner = FileSystemImageProvider::initialize(name, config)?;
        Ok(Self::over_file_system(inner))
    }

    pub fn over_file_system(inner: FileSystemImageProvider) -> Self {
        let layout = inner.layout().clone();
        Self::new(inner, layout)
    }
}

impl<P: ImageProvider> ImageProvider for ThumbnailCache<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn image_format(&self) -> ImageFormat {
        self.inner.image_format()
    }

    fn check_open(&self) -> Result<()> {
        self.inner.check_open()
    }

    fn save_image(&self, image: &DynamicImage) -> Result<ImageId> {
        self.inner.save_image(image)
    }

    fn save_image_with_id(&self, id: &ImageId, image: &DynamicImage) -> Result<()> {
        self.inner.save_image_with_id(id, image)
    }

    fn get_image(&self, id: &ImageId) -> Result<Option<DynamicImage>> {
        self.inner.get_image(id)
    }

    fn get_thumbnail_image(
        &self,
        id: &ImageId,
        max_width: i32,
        max_height: i32,
    ) -> Result<Option<DynamicImage>> {
        self.inner.check_open()?;
        let path = self.entry_path(id, max_width, max_height);
        if let Some(image) = self.layout.read_image(&path)? {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            debug!(id = %id, path = %path.display(), "thumbnail cache hit");
            return Ok(Some(image));
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);

        let Some(thumbnail) = self.inner.get_thumbnail_image(id, max_width, max_height)? else {
            return Ok(None);
        };
        self.layout
            .write_image(&path, &thumbnail, self.inner.image_format())?;
        drop(thumbnail);
        self.stats.writes.fetch_add(1, Ordering::Relaxed);
        debug!(id = %id, path = %path.display(), "thumbnail cache write");

        // Misses return the decoded cache file, same as hits.
        self.read_back(&path).map(Some)
    }

    fn delete_image(&self, id: &ImageId) -> Result<()> {
        self.inner.delete_image(id)
    }
}
