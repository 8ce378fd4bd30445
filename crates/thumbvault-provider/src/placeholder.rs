//! Blank stand-in for missing images.

use std::borrow::Cow;

use thumbvault_imaging::{codec, DynamicImage};
use thumbvault_types::ImageFormat;

use crate::error::Result;

const BLANK_PNG: &[u8] = include_bytes!("../assets/blank.png");
const BLANK_GIF: &[u8] = include_bytes!("../assets/blank.gif");

/// A decoded placeholder kept alongside the bytes it was decoded from.
#[derive(Clone, Debug)]
pub struct Placeholder {
    bytes: Cow<'static, [u8]>,
    image: DynamicImage,
}

impl Placeholder {
    /// The bundled blank image matching `format`: PNG for PNG providers, GIF
    /// for everything else.
    pub fn for_format(format: ImageFormat) -> Result<Self> {
        let bytes = match format {
            ImageFormat::Png => BLANK_PNG,
            _ => BLANK_GIF,
        };
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: impl Into<Cow<'static, [u8]>>) -> Result<Self> {
        let bytes = bytes.into();
        let image = codec::decode(&bytes)?;
        Ok(Self { bytes, image })
    }

    /// Encoded source of the placeholder.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// A fresh copy for a caller to own.
    pub fn image(&self) -> DynamicImage {
        self.image.clone()
    }
}
