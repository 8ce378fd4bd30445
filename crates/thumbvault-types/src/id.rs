use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

/// Unique identifier for one logical image.
///
/// An `ImageId` names an original and every thumbnail derived from it. It
/// wraps a UUID and is always non-nil: the nil UUID is the conventional
/// "no image" value and is rejected at every entry point, so holding an
/// `ImageId` means holding a validated identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageId(Uuid);

impl ImageId {
    /// Generate a fresh random identifier (UUID v4).
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID. Fails for the nil UUID.
    pub fn from_uuid(uuid: Uuid) -> Result<Self, TypeError> {
        if uuid.is_nil() {
            return Err(TypeError::InvalidIdentifier(uuid.to_string()));
        }
        Ok(Self(uuid))
    }

    /// Parse an identifier from text.
    ///
    /// Accepts the hyphenated, simple (32 hex digits), braced (`{...}`) and
    /// URN renderings in any letter case.
    ///
    /// # Examples
    ///
    /// ```
    /// use thumbvault_types::ImageId;
    ///
    /// let a = ImageId::parse("A3F9C2E4-1B2D-4C5E-8F90-123456789ABC").unwrap();
    /// let b = ImageId::parse("{a3f9c2e4-1b2d-4c5e-8f90-123456789abc}").unwrap();
    /// assert_eq!(a, b);
    /// assert!(ImageId::parse("").is_err());
    /// assert!(ImageId::parse("not-a-uuid").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let uuid = Uuid::parse_str(s.trim())
            .map_err(|_| TypeError::InvalidIdentifier(s.to_string()))?;
        Self::from_uuid(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Canonical token used for path derivation.
    ///
    /// Lowercase hex with braces and hyphens stripped; always 32 characters.
    pub fn canonical(&self) -> String {
        self.0.simple().to_string()
    }

    /// Short representation (first 8 characters of the canonical token).
    pub fn short_id(&self) -> String {
        self.canonical()[..8].to_string()
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ImageId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ImageId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<Uuid> for ImageId {
    type Error = TypeError;

    fn try_from(value: Uuid) -> Result<Self, Self::Error> {
        Self::from_uuid(value)
    }
}

impl From<ImageId> for String {
    fn from(id: ImageId) -> Self {
        id.to_string()
    }
}

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({})", self.short_id())
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "a3f9c2e4-1b2d-4c5e-8f90-123456789abc";

    #[test]
    fn fresh_ids_are_unique() {
        assert_ne!(ImageId::new(), ImageId::new());
    }

    #[test]
    fn canonical_strips_separators_and_lowercases() {
        let id = ImageId::parse("{A3F9C2E4-1B2D-4C5E-8F90-123456789ABC}").unwrap();
        assert_eq!(id.canonical(), "a3f9c2e41b2d4c5e8f90123456789abc");
        assert_eq!(id.canonical().len(), 32);
    }

    #[test]
    fn all_renderings_parse_to_the_same_id() {
        let hyphenated = ImageId::parse(SAMPLE).unwrap();
        let simple = ImageId::parse("a3f9c2e41b2d4c5e8f90123456789abc").unwrap();
        let braced = ImageId::parse(&format!("{{{SAMPLE}}}")).unwrap();
        let urn = ImageId::parse(&format!("urn:uuid:{SAMPLE}")).unwrap();
        assert_eq!(hyphenated, simple);
        assert_eq!(hyphenated, braced);
        assert_eq!(hyphenated, urn);
    }

    #[test]
    fn canonical_is_stable() {
        let id = ImageId::parse(SAMPLE).unwrap();
        assert_eq!(id.canonical(), id.canonical());
        let reparsed = ImageId::parse(&id.canonical()).unwrap();
        assert_eq!(reparsed, id);
    }

    #[test]
    fn reject_malformed() {
        for bad in ["", "   ", "not-a-uuid", "a3f9c2e4", "g3f9c2e4-1b2d-4c5e-8f90-123456789abc"] {
            assert!(
                matches!(ImageId::parse(bad), Err(TypeError::InvalidIdentifier(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn reject_nil() {
        assert!(ImageId::parse("00000000-0000-0000-0000-000000000000").is_err());
        assert!(ImageId::from_uuid(Uuid::nil()).is_err());
    }

    #[test]
    fn display_is_hyphenated() {
        let id = ImageId::parse("A3F9C2E41B2D4C5E8F90123456789ABC").unwrap();
        assert_eq!(id.to_string(), SAMPLE);
    }

    #[test]
    fn short_id_is_8_chars() {
        assert_eq!(ImageId::new().short_id().len(), 8);
    }

    #[test]
    fn serde_roundtrip() {
        let id = ImageId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let parsed: ImageId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn serde_rejects_nil() {
        let result: Result<ImageId, _> =
            serde_json::from_str("\"00000000-0000-0000-0000-000000000000\"");
        assert!(result.is_err());
    }
}
