use std::collections::HashMap;
use std::sync::RwLock;

use thumbvault_imaging::{codec, DynamicImage};
use thumbvault_types::{ImageFormat, ImageId};
use tracing::debug;

use crate::config::{ProviderConfig, IMAGE_FORMAT};
use crate::error::Result;
use crate::traits::ImageProvider;

/// Provider that keeps encoded images in memory.
///
/// Images are stored encoded in the configured format, so what comes back
/// has been through the same codec as on disk. Useful for tests and for
/// embedding without a storage root.
#[derive(Debug)]
pub struct InMemoryImageProvider {
    name: String,
    image_format: ImageFormat,
    images: RwLock<HashMap<ImageId, Vec<u8>>>,
}

impl InMemoryImageProvider {
    pub fn new(name: impl Into<String>, image_format: ImageFormat) -> Self {
        Self {
            name: name.into(),
            image_format,
            images: RwLock::new(HashMap::new()),
        }
    }

    /// Build from an option map. Only `imageFormat` is understood.
    pub fn initialize(name: impl Into<String>, mut config: ProviderConfig) -> Result<Self> {
        let image_format = config.take_format(IMAGE_FORMAT)?.unwrap_or_default();
        config.ensure_consumed()?;
        Ok(Self::new(name, image_format))
    }

    pub fn len(&self) -> usize {
        self.images.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &ImageId) -> bool {
        self.images.read().expect("lock poisoned").contains_key(id)
    }

    pub fn clear(&self) {
        self.images.write().expect("lock poisoned").clear();
    }
}

impl ImageProvider for InMemoryImageProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn image_format(&self) -> ImageFormat {
        self.image_format
    }

    fn save_image_with_id(&self, id: &ImageId, image: &DynamicImage) -> Result<()> {
        let bytes = codec::encode(image, self.image_format)?;
        debug!(provider = %self.name, id = %id, bytes = bytes.len(), "saved image");
        self.images
            .write()
            .expect("lock poisoned")
            .insert(*id, bytes);
        Ok(())
    }

    fn get_image(&self, id: &ImageId) -> Result<Option<DynamicImage>> {
        let images = self.images.read().expect("lock poisoned");
        match images.get(id) {
            Some(bytes) => Ok(Some(codec::decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn delete_image(&self, id: &ImageId) -> Result<()> {
        self.images.write().expect("lock poisoned").remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;

    #[test]
    fn save_get_delete() {
        let provider = InMemoryImageProvider::new("mem", ImageFormat::Png);
        let id = provider.save_image(&DynamicImage::new_rgb8(40, 30)).unwrap();
        assert!(provider.contains(&id));
        let image = provider.get_image(&id).unwrap().unwrap();
        assert_eq!((image.width(), image.height()), (40, 30));

        provider.delete_image(&id).unwrap();
        provider.delete_image(&id).unwrap();
        assert!(provider.get_image(&id).unwrap().is_none());
        assert!(provider.is_empty());
    }

    #[test]
    fn default_thumbnail_path() {
        let provider = InMemoryImageProvider::new("mem", ImageFormat::Gif);
        let id = provider.save_image(&DynamicImage::new_rgb8(800, 1000)).unwrap();
        let thumb = provider.get_thumbnail_image(&id, 200, 200).unwrap().unwrap();
        assert_eq!((thumb.width(), thumb.height()), (160, 200));
        assert!(provider
            .get_thumbnail_image(&ImageId::new(), 200, 200)
            .unwrap()
            .is_none());
    }

    #[test]
    fn initialize_reads_format_and_rejects_extras() {
        let config = ProviderConfig::new().with(IMAGE_FORMAT, "bmp");
        let provider = InMemoryImageProvider::initialize("mem", config).unwrap();
        assert_eq!(provider.image_format(), ImageFormat::Bmp);

        let config = ProviderConfig::new().with("fileSystemPath", "/tmp");
        let err = InMemoryImageProvider::initialize("mem", config).unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[test]
    fn shared_through_arc() {
        let provider = std::sync::Arc::new(InMemoryImageProvider::new("mem", ImageFormat::Png));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let provider = provider.clone();
                std::thread::spawn(move || {
                    provider
                        .save_image(&DynamicImage::new_rgb8(i + 1, 1))
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(provider.len(), 4);
        assert_eq!(provider.name(), "mem");
    }
}
