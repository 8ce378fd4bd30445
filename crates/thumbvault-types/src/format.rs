//! The fixed set of image encodings a repository can store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Content type reported for extensions with no known mapping.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Encoding used to persist originals and thumbnails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ImageFormat {
    Bmp,
    Gif,
    Jpeg,
    #[default]
    Png,
}

impl ImageFormat {
    /// Every supported format.
    pub const ALL: [ImageFormat; 4] = [Self::Bmp, Self::Gif, Self::Jpeg, Self::Png];

    /// File extension, including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Bmp => ".bmp",
            Self::Gif => ".gif",
            Self::Jpeg => ".jpg",
            Self::Png => ".png",
        }
    }

    /// MIME type of the encoded bytes.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Bmp => "image/bmp",
            Self::Gif => "image/gif",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Lowercase name without the dot.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bmp => "bmp",
            Self::Gif => "gif",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }

    /// Resolve a format from a name or file extension.
    ///
    /// Case-insensitive; a single leading dot is optional.
    ///
    /// ```
    /// use thumbvault_types::ImageFormat;
    ///
    /// assert_eq!(ImageFormat::from_name(".PNG").unwrap(), ImageFormat::Png);
    /// assert_eq!(ImageFormat::from_name("jpg").unwrap(), ImageFormat::Jpeg);
    /// assert!(ImageFormat::from_name("tiff").is_err());
    /// ```
    pub fn from_name(name: &str) -> Result<Self, TypeError> {
        let lowered = name.trim().to_ascii_lowercase();
        let bare = lowered.strip_prefix('.').unwrap_or(&lowered);
        match bare {
            "bmp" => Ok(Self::Bmp),
            "gif" => Ok(Self::Gif),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            _ => Err(TypeError::UnsupportedFormat(name.to_string())),
        }
    }
}

impl FromStr for ImageFormat {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl TryFrom<String> for ImageFormat {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_name(&value)
    }
}

impl From<ImageFormat> for String {
    fn from(format: ImageFormat) -> Self {
        format.as_str().to_string()
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best-effort MIME type for a file extension.
///
/// Accepts the extension with or without its dot, in any case. Unknown
/// extensions map to [`DEFAULT_CONTENT_TYPE`].
pub fn content_type_hint(extension: &str) -> &'static str {
    let lowered = extension.trim().to_ascii_lowercase();
    let bare = lowered.strip_prefix('.').unwrap_or(&lowered);
    match bare {
        "jpe" => "image/jpeg",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        _ => ImageFormat::from_name(bare)
            .map(|f| f.content_type())
            .unwrap_or(DEFAULT_CONTENT_TYPE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_and_without_dot() {
        for (name, expected) in [
            ("bmp", ImageFormat::Bmp),
            (".bmp", ImageFormat::Bmp),
            ("gif", ImageFormat::Gif),
            (".gif", ImageFormat::Gif),
            ("jpg", ImageFormat::Jpeg),
            (".jpeg", ImageFormat::Jpeg),
            ("png", ImageFormat::Png),
            (".png", ImageFormat::Png),
        ] {
            assert_eq!(ImageFormat::from_name(name).unwrap(), expected, "{name}");
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(ImageFormat::from_name("PNG").unwrap(), ImageFormat::Png);
        assert_eq!(ImageFormat::from_name(".JpEg").unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn reject_unknown() {
        let err = ImageFormat::from_name("tiff").unwrap_err();
        assert_eq!(err, TypeError::UnsupportedFormat("tiff".into()));
        assert!(ImageFormat::from_name("").is_err());
        assert!(ImageFormat::from_name("..png").is_err());
    }

    #[test]
    fn extensions() {
        assert_eq!(ImageFormat::Bmp.extension(), ".bmp");
        assert_eq!(ImageFormat::Gif.extension(), ".gif");
        assert_eq!(ImageFormat::Jpeg.extension(), ".jpg");
        assert_eq!(ImageFormat::Png.extension(), ".png");
    }

    #[test]
    fn extension_parses_back() {
        for format in ImageFormat::ALL {
            assert_eq!(ImageFormat::from_name(format.extension()).unwrap(), format);
        }
    }

    #[test]
    fn default_is_png() {
        assert_eq!(ImageFormat::default(), ImageFormat::Png);
    }

    #[test]
    fn content_type_hints() {
        assert_eq!(content_type_hint(".png"), "image/png");
        assert_eq!(content_type_hint("JPG"), "image/jpeg");
        assert_eq!(content_type_hint(".gif"), "image/gif");
        assert_eq!(content_type_hint(".webp"), "image/webp");
        assert_eq!(content_type_hint(".txt"), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_hint(""), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn serde_uses_names() {
        let json = serde_json::to_string(&ImageFormat::Jpeg).unwrap();
        assert_eq!(json, "\"jpeg\"");
        let parsed: ImageFormat = serde_json::from_str("\".PNG\"").unwrap();
        assert_eq!(parsed, ImageFormat::Png);
        assert!(serde_json::from_str::<ImageFormat>("\"tga\"").is_err());
    }
}
