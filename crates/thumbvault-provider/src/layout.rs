//! Deterministic on-disk layout.
//!
//! An id's canonical token `c` (32 lowercase hex digits) places every file of
//! that id under `root/c[0..1]/c[0..4]/`:
//!
//! ```text
//! root/a/a3f9/a3f9c2e41b2d4c5e8f90123456789abc.png          original
//! root/a/a3f9/a3f9c2e41b2d4c5e8f90123456789abc-200x200.png  thumbnail
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use thumbvault_imaging::{codec, DynamicImage};
use thumbvault_types::{ImageFormat, ImageId, Size};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{ProviderError, Result};

/// What a file under the root holds, judged by its name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Original,
    Thumbnail(Size),
}

/// A recognised file name, split into its parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryName {
    pub canonical: String,
    pub kind: EntryKind,
    pub format: ImageFormat,
}

/// Totals from walking a storage root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub originals: u64,
    pub thumbnails: u64,
    /// Files that match neither naming pattern (stray temp files and the like).
    pub other: u64,
    pub bytes: u64,
}

/// Maps ids to paths under a root directory.
#[derive(Clone, Debug)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `root/<c[0..1]>/<c[0..4]>`.
    pub fn directory_for(&self, id: &ImageId) -> PathBuf {
        let key = id.canonical();
        self.root.join(&key[..1]).join(&key[..4])
    }

    /// Path of the original image.
    pub fn filename_for(&self, id: &ImageId, format: ImageFormat) -> PathBuf {
        let key = id.canonical();
        self.directory_for(id)
            .join(format!("{key}{}", format.extension()))
    }

    /// Path of the thumbnail bounded by `width` x `height`.
    ///
    /// The bounds are the requested ones, not the resulting pixel size, so
    /// the same request always maps to the same file.
    pub fn thumbnail_filename_for(
        &self,
        id: &ImageId,
        width: i32,
        height: i32,
        format: ImageFormat,
    ) -> PathBuf {
        let key = id.canonical();
        self.directory_for(id)
            .join(format!("{key}-{width}x{height}{}", format.extension()))
    }

    /// Create `dir` and any missing ancestors below the root, one level at a
    /// time.
    ///
    /// `dir` must be the root or lexically inside it, with only plain
    /// components after the root.
    pub fn ensure_directory(&self, dir: &Path) -> Result<()> {
        let relative = self.relative(dir)?;
        let mut current = self.root.clone();
        for component in relative.components() {
            current.push(component);
            match fs::create_dir(&current) {
                Ok(()) => debug!(path = %current.display(), "created directory"),
                // Another writer may have created it first.
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    if !current.is_dir() {
                        return Err(ProviderError::storage_message(format!(
                            "{} exists and is not a directory",
                            current.display()
                        )));
                    }
                }
                Err(err) => {
                    return Err(ProviderError::storage(
                        format!("failed to create directory {}", current.display()),
                        err,
                    ))
                }
            }
        }
        Ok(())
    }

    fn relative<'a>(&self, dir: &'a Path) -> Result<&'a Path> {
        let escape = || ProviderError::PathEscape {
            path: dir.to_path_buf(),
            root: self.root.clone(),
        };
        let relative = dir.strip_prefix(&self.root).map_err(|_| escape())?;
        if relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            Ok(relative)
        } else {
            Err(escape())
        }
    }

    /// Encode `image` and atomically place it at `path`.
    ///
    /// The bytes go to a temporary file in the target directory which is then
    /// renamed over `path`, so readers see either the old file or the new one.
    pub fn write_image(
        &self,
        path: &Path,
        image: &DynamicImage,
        format: ImageFormat,
    ) -> Result<()> {
        let bytes = codec::encode(image, format)?;
        let dir = path
            .parent()
            .ok_or_else(|| ProviderError::PathEscape {
                path: path.to_path_buf(),
                root: self.root.clone(),
            })?;
        self.ensure_directory(dir)?;

        let write_failed = |err: io::Error| {
            ProviderError::storage(format!("failed to write {}", path.display()), err)
        };
        let mut temp = NamedTempFile::new_in(dir).map_err(write_failed)?;
        temp.write_all(&bytes).map_err(write_failed)?;
        temp.as_file().sync_all().map_err(write_failed)?;
        temp.persist(path).map_err(|err| write_failed(err.error))?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote image");
        Ok(())
    }

    /// Read and decode the image at `path`, or `None` if there is no file.
    pub fn read_image(&self, path: &Path) -> Result<Option<DynamicImage>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(ProviderError::storage(
                    format!("failed to read {}", path.display()),
                    err,
                ))
            }
        };
        Ok(Some(codec::decode(&bytes)?))
    }

    /// Remove a file; a missing file is not an error. Returns whether a file
    /// was removed.
    pub fn remove_file(&self, path: &Path) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(ProviderError::storage(
                format!("failed to delete {}", path.display()),
                err,
            )),
        }
    }

    /// Paths of every cached thumbnail of `id`, in any format.
    pub fn thumbnails_of(&self, id: &ImageId) -> Result<Vec<PathBuf>> {
        let dir = self.directory_for(id);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(ProviderError::storage(
                    format!("failed to list {}", dir.display()),
                    err,
                ))
            }
        };

        let key = id.canonical();
        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| {
                ProviderError::storage(format!("failed to list {}", dir.display()), err)
            })?;
            let name = entry.file_name();
            let Some(parsed) = name.to_str().and_then(parse_entry_name) else {
                continue;
            };
            if parsed.canonical == key && matches!(parsed.kind, EntryKind::Thumbnail(_)) {
                found.push(entry.path());
            }
        }
        found.sort();
        Ok(found)
    }

    /// Walk the whole root and count what is stored.
    pub fn inventory(&self) -> Result<Inventory> {
        let mut inventory = Inventory::default();
        for entry in WalkDir::new(&self.root).min_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            match parse_entry_name(&name).map(|parsed| parsed.kind) {
                Some(EntryKind::Original) => inventory.originals += 1,
                Some(EntryKind::Thumbnail(_)) => inventory.thumbnails += 1,
                None => inventory.other += 1,
            }
            match entry.metadata() {
                Ok(meta) => inventory.bytes += meta.len(),
                Err(err) => warn!(path = %entry.path().display(), error = %err, "no metadata"),
            }
        }
        Ok(inventory)
    }
}

/// Recognise `<canonical><ext>` and `<canonical>-<w>x<h><ext>`.
pub fn parse_entry_name(name: &str) -> Option<EntryName> {
    let (stem, ext) = name.rsplit_once('.')?;
    let format = ImageFormat::from_name(ext).ok()?;

    if is_canonical(stem) {
        return Some(EntryName {
            canonical: stem.to_string(),
            kind: EntryKind::Original,
            format,
        });
    }

    let (key, bounds) = stem.split_once('-')?;
    if !is_canonical(key) {
        return None;
    }
    let (width, height) = bounds.split_once('x')?;
    let size = Size::new(width.parse().ok()?, height.parse().ok()?);
    Some(EntryName {
        canonical: key.to_string(),
        kind: EntryKind::Thumbnail(size),
        format,
    })
}

fn is_canonical(s: &str) -> bool {
    s.len() == 32 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "a3f9c2e4-1b2d-4c5e-8f90-123456789abc";
    const CANONICAL: &str = "a3f9c2e41b2d4c5e8f90123456789abc";

    fn sample_id() -> ImageId {
        ImageId::parse(SAMPLE).unwrap()
    }

    #[test]
    fn directory_is_sharded_by_prefix() {
        let layout = StorageLayout::new("/data");
        assert_eq!(
            layout.directory_for(&sample_id()),
            PathBuf::from("/data/a/a3f9")
        );
    }

    #[test]
    fn original_and_thumbnail_names() {
        let layout = StorageLayout::new("/data");
        let id = sample_id();
        assert_eq!(
            layout.filename_for(&id, ImageFormat::Png),
            PathBuf::from(format!("/data/a/a3f9/{CANONICAL}.png"))
        );
        assert_eq!(
            layout.thumbnail_filename_for(&id, 200, 150, ImageFormat::Jpeg),
            PathBuf::from(format!("/data/a/a3f9/{CANONICAL}-200x150.jpg"))
        );
    }

    #[test]
    fn distinct_bounds_never_collide() {
        let layout = StorageLayout::new("/data");
        let id = sample_id();
        let a = layout.thumbnail_filename_for(&id, 20, 100, ImageFormat::Png);
        let b = layout.thumbnail_filename_for(&id, 201, 0, ImageFormat::Png);
        let c = layout.thumbnail_filename_for(&id, 20, 100, ImageFormat::Png);
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn ensure_directory_creates_each_level() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path());
        let target = layout.directory_for(&sample_id());
        layout.ensure_directory(&target).unwrap();
        assert!(target.is_dir());
        // Second call is a no-op.
        layout.ensure_directory(&target).unwrap();
    }

    #[test]
    fn ensure_directory_rejects_escapes() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path());
        let outside = dir.path().join("a").join("..").join("..").join("etc");
        assert!(matches!(
            layout.ensure_directory(&outside),
            Err(ProviderError::PathEscape { .. })
        ));
        assert!(matches!(
            layout.ensure_directory(Path::new("/somewhere/else")),
            Err(ProviderError::PathEscape { .. })
        ));
    }

    #[test]
    fn ensure_directory_fails_over_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path());
        fs::write(dir.path().join("a"), b"not a dir").unwrap();
        let err = layout
            .ensure_directory(&dir.path().join("a").join("a3f9"))
            .unwrap_err();
        assert!(matches!(err, ProviderError::Storage { .. }));
    }

    #[test]
    fn write_then_read_image() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path());
        let path = layout.filename_for(&sample_id(), ImageFormat::Png);
        layout
            .write_image(&path, &DynamicImage::new_rgb8(12, 7), ImageFormat::Png)
            .unwrap();
        let image = layout.read_image(&path).unwrap().unwrap();
        assert_eq!((image.width(), image.height()), (12, 7));
    }

    #[test]
    fn read_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path());
        let path = layout.filename_for(&sample_id(), ImageFormat::Png);
        assert!(layout.read_image(&path).unwrap().is_none());
    }

    #[test]
    fn remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path());
        assert!(!layout.remove_file(&dir.path().join("nothing.png")).unwrap());
    }

    #[test]
    fn parse_names() {
        let original = parse_entry_name(&format!("{CANONICAL}.png")).unwrap();
        assert_eq!(original.kind, EntryKind::Original);
        assert_eq!(original.format, ImageFormat::Png);

        let thumb = parse_entry_name(&format!("{CANONICAL}-200x0.gif")).unwrap();
        assert_eq!(thumb.kind, EntryKind::Thumbnail(Size::new(200, 0)));
        assert_eq!(thumb.canonical, CANONICAL);

        assert!(parse_entry_name(".tmpAbC123").is_none());
        assert!(parse_entry_name(&format!("{CANONICAL}.txt")).is_none());
        assert!(parse_entry_name("short-10x10.png").is_none());
    }

    #[test]
    fn thumbnails_of_lists_only_that_id() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path());
        let id = sample_id();
        let image = DynamicImage::new_rgb8(4, 4);
        for (w, h) in [(10, 10), (20, 0)] {
            let path = layout.thumbnail_filename_for(&id, w, h, ImageFormat::Png);
            layout.write_image(&path, &image, ImageFormat::Png).unwrap();
        }
        let original = layout.filename_for(&id, ImageFormat::Png);
        layout.write_image(&original, &image, ImageFormat::Png).unwrap();

        let found = layout.thumbnails_of(&id).unwrap();
        assert_eq!(found.len(), 2);
        assert!(!found.contains(&original));
        assert!(layout.thumbnails_of(&ImageId::new()).unwrap().is_empty());
    }

    #[test]
    fn inventory_counts_files() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path());
        let id = sample_id();
        let image = DynamicImage::new_rgb8(4, 4);
        layout
            .write_image(&layout.filename_for(&id, ImageFormat::Png), &image, ImageFormat::Png)
            .unwrap();
        layout
            .write_image(
                &layout.thumbnail_filename_for(&id, 2, 2, ImageFormat::Png),
                &image,
                ImageFormat::Png,
            )
            .unwrap();
        fs::write(dir.path().join("notes.txt"), b"hello").unwrap();

        let inventory = layout.inventory().unwrap();
        assert_eq!(inventory.originals, 1);
        assert_eq!(inventory.thumbnails, 1);
        assert_eq!(inventory.other, 1);
        assert!(inventory.bytes > 5);
    }
}
