use std::path::Path;
use std::sync::Arc;

use thumbvault_imaging::{codec, resize, DynamicImage};
use thumbvault_types::{ImageFormat, ImageId};

use crate::error::Result;

/// An image repository.
///
/// Implementations store encoded images keyed by [`ImageId`] and serve
/// aspect-preserving thumbnails of them. Every operation is blocking and may
/// be called from any thread.
///
/// A missing image is `Ok(None)`, never an error. Images handed out are owned
/// copies; dropping them releases them.
pub trait ImageProvider: Send + Sync {
    /// Name the provider was registered under.
    fn name(&self) -> &str;

    /// Encoding used for everything this provider writes.
    fn image_format(&self) -> ImageFormat;

    /// Fail if the provider can no longer serve requests.
    ///
    /// Decorators that answer from their own storage call this before doing
    /// so. The default is always open.
    fn check_open(&self) -> Result<()> {
        Ok(())
    }

    /// Store `image` under a fresh identifier.
    fn save_image(&self, image: &DynamicImage) -> Result<ImageId> {
        let id = ImageId::new();
        self.save_image_with_id(&id, image)?;
        Ok(id)
    }

    /// Store `image` under `id`, replacing any previous image.
    fn save_image_with_id(&self, id: &ImageId, image: &DynamicImage) -> Result<()>;

    /// Decode the file at `path` and store it under a fresh identifier.
    fn save_image_file(&self, path: &Path) -> Result<ImageId> {
        let image = codec::decode_file(path)?;
        self.save_image(&image)
    }

    /// Decode the file at `path` and store it under `id`.
    fn save_image_file_with_id(&self, id: &ImageId, path: &Path) -> Result<()> {
        let image = codec::decode_file(path)?;
        self.save_image_with_id(id, &image)
    }

    /// Fetch the original image.
    fn get_image(&self, id: &ImageId) -> Result<Option<DynamicImage>>;

    /// Fetch a thumbnail that fits inside `max_width` x `max_height`.
    ///
    /// A bound of zero leaves that axis unconstrained. The default computes
    /// the thumbnail from [`get_image`](Self::get_image) on every call.
    fn get_thumbnail_image(
        &self,
        id: &ImageId,
        max_width: i32,
        max_height: i32,
    ) -> Result<Option<DynamicImage>> {
        match self.get_image(id)? {
            Some(image) => Ok(Some(resize::create_thumbnail(&image, max_width, max_height)?)),
            None => Ok(None),
        }
    }

    /// Remove the original image. Deleting an absent image succeeds.
    fn delete_image(&self, id: &ImageId) -> Result<()>;
}

macro_rules! forward_image_provider {
    ($wrapper:ty) => {
        impl<P: ImageProvider + ?Sized> ImageProvider for $wrapper {
            fn name(&self) -> &str {
                (**self).name()
            }

            fn image_format(&self) -> ImageFormat {
                (**self).image_format()
            }

            fn check_open(&self) -> Result<()> {
                (**self).check_open()
            }

            fn save_image(&self, image: &DynamicImage) -> Result<ImageId> {
                (**self).save_image(image)
            }

            fn save_image_with_id(&self, id: &ImageId, image: &DynamicImage) -> Result<()> {
                (**self).save_image_with_id(id, image)
            }

            fn save_image_file(&self, path: &Path) -> Result<ImageId> {
                (**self).save_image_file(path)
            }

            fn save_image_file_with_id(&self, id: &ImageId, path: &Path) -> Result<()> {
                (**self).save_image_file_with_id(id, path)
            }

            fn get_image(&self, id: &ImageId) -> Result<Option<DynamicImage>> {
                (**self).get_image(id)
            }

            fn get_thumbnail_image(
                &self,
                id: &ImageId,
                max_width: i32,
                max_height: i32,
            ) -> Result<Option<DynamicImage>> {
                (**self).get_thumbnail_image(id, max_width, max_height)
            }

            fn delete_image(&self, id: &ImageId) -> Result<()> {
                (**self).delete_image(id)
            }
        }
    };
}

forward_image_provider!(Arc<P>);
forward_image_provider!(Box<P>);
