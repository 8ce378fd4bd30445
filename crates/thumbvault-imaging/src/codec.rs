//! Decode and encode images in the supported formats.
//!
//! Decoding sniffs the format from the bytes, so a repository can read back
//! anything the `image` crate recognises. Encoding is restricted to
//! [`ImageFormat`].

use std::io::Cursor;
use std::path::Path;

use image::DynamicImage;
use thumbvault_types::ImageFormat;
use tracing::debug;

use crate::error::{ImagingError, Result};

/// Decode an image from encoded bytes.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(ImagingError::Decode)
}

/// Read and decode an image file.
pub fn decode_file(path: &Path) -> Result<DynamicImage> {
    let bytes = std::fs::read(path)?;
    let image = decode(&bytes)?;
    debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "decoded image file"
    );
    Ok(image)
}

/// Encode an image in the given format.
///
/// JPEG has no alpha channel and the GIF/BMP encoders only take 8-bit
/// layouts, so the pixels are converted first where needed.
pub fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let converted;
    let source = match format {
        ImageFormat::Jpeg
            if !matches!(image, DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_)) =>
        {
            converted = DynamicImage::ImageRgb8(image.to_rgb8());
            &converted
        }
        ImageFormat::Gif | ImageFormat::Bmp
            if !matches!(image, DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_)) =>
        {
            converted = DynamicImage::ImageRgba8(image.to_rgba8());
            &converted
        }
        _ => image,
    };

    let mut cursor = Cursor::new(Vec::new());
    source
        .write_to(&mut cursor, to_image_format(format))
        .map_err(|source| ImagingError::Encode { format, source })?;
    Ok(cursor.into_inner())
}

/// File extension (with dot) for a format.
pub fn extension_for(format: ImageFormat) -> &'static str {
    format.extension()
}

fn to_image_format(format: ImageFormat) -> image::ImageFormat {
    match format {
        ImageFormat::Bmp => image::ImageFormat::Bmp,
        ImageFormat::Gif => image::ImageFormat::Gif,
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Png => image::ImageFormat::Png,
    }
}
