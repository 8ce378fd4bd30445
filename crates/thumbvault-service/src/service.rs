//! The provider registry.
//!
//! [`ImageService`] owns every configured provider, built once from a
//! [`ServiceConfig`]. [`SharedImageService`] adds lazy, exactly-once
//! construction for callers that want a process-wide instance.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use serde::Serialize;
use thumbvault_provider::{
    CacheSnapshot, CachedFileSystemImageProvider, DynamicImage, FileSystemImageProvider,
    ImageProvider, InMemoryImageProvider, Inventory,
};
use thumbvault_types::{ImageFormat, ImageId};
use tracing::{debug, info};

use crate::config::{ProviderKind, ProviderSettings, ServiceConfig};
use crate::error::{ServiceError, ServiceResult};

/// Concrete provider behind a registration.
enum Backend {
    FileSystem(Arc<FileSystemImageProvider>),
    CachedFileSystem(Arc<CachedFileSystemImageProvider>),
    Memory(Arc<InMemoryImageProvider>),
}

struct Registration {
    kind: ProviderKind,
    provider: Arc<dyn ImageProvider>,
    backend: Backend,
}

impl Registration {
    fn build(settings: ProviderSettings) -> ServiceResult<Self> {
        let name = settings.name.trim().to_string();
        let options = settings.options;
        let backend = match settings.kind {
            ProviderKind::FileSystem => {
                Backend::FileSystem(Arc::new(FileSystemImageProvider::initialize(name, options)?))
            }
            ProviderKind::CachedFileSystem => Backend::CachedFileSystem(Arc::new(
                CachedFileSystemImageProvider::initialize(name, options)?,
            )),
            ProviderKind::Memory => {
                Backend::Memory(Arc::new(InMemoryImageProvider::initialize(name, options)?))
            }
        };
        let provider: Arc<dyn ImageProvider> = match &backend {
            Backend::FileSystem(p) => p.clone(),
            Backend::CachedFileSystem(p) => p.clone(),
            Backend::Memory(p) => p.clone(),
        };
        Ok(Self {
            kind: settings.kind,
            provider,
            backend,
        })
    }
}

/// Operator-facing summary of one provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProviderStats {
    pub name: String,
    pub kind: ProviderKind,
    pub image_format: ImageFormat,
    /// Files under the storage root, for file-system kinds.
    pub inventory: Option<Inventory>,
    /// Cache counters since startup, for caching kinds.
    pub cache: Option<CacheSnapshot>,
    /// Images held, for the in-memory kind.
    pub images_in_memory: Option<usize>,
}

/// Named image providers with one designated default.
pub struct ImageService {
    default_provider: String,
    providers: BTreeMap<String, Registration>,
}

impl std::fmt::Debug for ImageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageService")
            .field("default_provider", &self.default_provider)
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ImageService {
    /// Initialize every configured provider.
    ///
    /// Fails if the list is empty, a name is blank or repeated, the default
    /// names no configured provider, or any provider fails to initialize.
    pub fn from_config(config: ServiceConfig) -> ServiceResult<Self> {
        if config.providers.is_empty() {
            return Err(ServiceError::Config("no image providers configured".into()));
        }
        let default_provider = config.default_provider.trim().to_string();
        if !config
            .providers
            .iter()
            .any(|p| p.name.trim() == default_provider)
        {
            return Err(ServiceError::Config(format!(
                "default provider '{default_provider}' is not configured"
            )));
        }

        let mut providers = BTreeMap::new();
        for settings in config.providers {
            let name = settings.name.trim().to_string();
            if name.is_empty() {
                return Err(ServiceError::Config("provider name must not be blank".into()));
            }
            if providers.contains_key(&name) {
                return Err(ServiceError::Config(format!("duplicate provider name: {name}")));
            }
            let registration = Registration::build(settings)?;
            debug!(provider = %name, kind = %registration.kind, "registered image provider");
            providers.insert(name, registration);
        }

        info!(
            default = %default_provider,
            count = providers.len(),
            "image service ready"
        );
        Ok(Self {
            default_provider,
            providers,
        })
    }

    /// Read a TOML config file and initialize from it.
    pub fn load(path: &Path) -> ServiceResult<Self> {
        Self::from_config(ServiceConfig::load(path)?)
    }

    pub fn default_provider_name(&self) -> &str {
        &self.default_provider
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    /// Look up a provider. A blank name selects the default.
    ///
    /// Repeated lookups of one name return the same instance.
    pub fn provider(&self, name: &str) -> ServiceResult<Arc<dyn ImageProvider>> {
        Ok(self.registration(name)?.provider.clone())
    }

    pub fn default_provider(&self) -> ServiceResult<Arc<dyn ImageProvider>> {
        self.provider("")
    }

    pub fn provider_kind(&self, name: &str) -> ServiceResult<ProviderKind> {
        Ok(self.registration(name)?.kind)
    }

    fn registration(&self, name: &str) -> ServiceResult<&Registration> {
        let name = name.trim();
        let key = if name.is_empty() {
            self.default_provider.as_str()
        } else {
            name
        };
        self.providers
            .get(key)
            .ok_or_else(|| ServiceError::UnknownProvider(key.to_string()))
    }

    pub fn save_image(&self, provider: &str, image: &DynamicImage) -> ServiceResult<ImageId> {
        Ok(self.provider(provider)?.save_image(image)?)
    }

    pub fn save_image_with_id(
        &self,
        provider: &str,
        id: &ImageId,
        image: &DynamicImage,
    ) -> ServiceResult<()> {
        Ok(self.provider(provider)?.save_image_with_id(id, image)?)
    }

    pub fn save_image_file(&self, provider: &str, path: &Path) -> ServiceResult<ImageId> {
        Ok(self.provider(provider)?.save_image_file(path)?)
    }

    pub fn save_image_file_with_id(
        &self,
        provider: &str,
        id: &ImageId,
        path: &Path,
    ) -> ServiceResult<()> {
        Ok(self.provider(provider)?.save_image_file_with_id(id, path)?)
    }

    pub fn get_image(&self, provider: &str, id: &ImageId) -> ServiceResult<Option<DynamicImage>> {
        Ok(self.provider(provider)?.get_image(id)?)
    }

    pub fn get_thumbnail_image(
        &self,
        provider: &str,
        id: &ImageId,
        max_width: i32,
        max_height: i32,
    ) -> ServiceResult<Option<DynamicImage>> {
        Ok(self
            .provider(provider)?
            .get_thumbnail_image(id, max_width, max_height)?)
    }

    pub fn delete_image(&self, provider: &str, id: &ImageId) -> ServiceResult<()> {
        Ok(self.provider(provider)?.delete_image(id)?)
    }

    /// Remove cached thumbnails of `id`.
    ///
    /// `None` when the provider does not cache thumbnails.
    pub fn purge_thumbnails(&self, provider: &str, id: &ImageId) -> ServiceResult<Option<usize>> {
        match &self.registration(provider)?.backend {
            Backend::CachedFileSystem(cache) => Ok(Some(cache.purge(id)?)),
            Backend::FileSystem(_) | Backend::Memory(_) => Ok(None),
        }
    }

    pub fn stats(&self, provider: &str) -> ServiceResult<ProviderStats> {
        let registration = self.registration(provider)?;
        let mut stats = ProviderStats {
            name: registration.provider.name().to_string(),
            kind: registration.kind,
            image_format: registration.provider.image_format(),
            inventory: None,
            cache: None,
            images_in_memory: None,
        };
        match &registration.backend {
            Backend::FileSystem(fs) => stats.inventory = Some(fs.inventory()?),
            Backend::CachedFileSystem(cache) => {
                stats.inventory = Some(cache.inner().inventory()?);
                stats.cache = Some(cache.stats());
            }
            Backend::Memory(memory) => stats.images_in_memory = Some(memory.len()),
        }
        Ok(stats)
    }

    /// Dispose every file-system provider. Later calls on them fail.
    pub fn shutdown(&self) {
        for registration in self.providers.values() {
            match &registration.backend {
                Backend::FileSystem(fs) => fs.dispose(),
                Backend::CachedFileSystem(cache) => cache.inner().dispose(),
                Backend::Memory(_) => {}
            }
        }
        debug!("image service shut down");
    }
}

/// Lazily built [`ImageService`] shared by every caller.
///
/// The first successful [`get_or_init`](Self::get_or_init) builds the
/// service; concurrent first callers wait and then observe that same
/// instance. A failed build leaves the holder empty so a later call can
/// retry.
///
/// ```
/// use thumbvault_service::SharedImageService;
///
/// static SERVICE: SharedImageService = SharedImageService::new();
/// assert!(SERVICE.get().is_none());
/// ```
#[derive(Debug, Default)]
pub struct SharedImageService {
    cell: OnceLock<Arc<ImageService>>,
    init: Mutex<()>,
}

impl SharedImageService {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// The service, if it has been built.
    pub fn get(&self) -> Option<Arc<ImageService>> {
        self.cell.get().cloned()
    }

    /// Return the service, building it with `init` on first use.
    pub fn get_or_init<F>(&self, init: F) -> ServiceResult<Arc<ImageService>>
    where
        F: FnOnce() -> ServiceResult<ImageService>,
    {
        if let Some(service) = self.cell.get() {
            return Ok(service.clone());
        }
        let _guard = self.init.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(service) = self.cell.get() {
            return Ok(service.clone());
        }
        let service = Arc::new(init()?);
        let _ = self.cell.set(service.clone());
        Ok(service)
    }

    /// [`get_or_init`](Self::get_or_init) from a TOML config file.
    pub fn get_or_load(&self, path: &Path) -> ServiceResult<Arc<ImageService>> {
        self.get_or_init(|| ImageService::load(path))
    }
}
