use std::fmt;

use serde::{Deserialize, Serialize};

/// Width and height in pixels.
///
/// Signed so that a zero or negative bound can express "unconstrained" when a
/// `Size` is used as a thumbnail bound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// `true` when both sides are strictly positive.
    pub fn is_positive(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl From<(i32, i32)> for Size {
    fn from((width, height): (i32, i32)) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_thumbnail_suffix() {
        assert_eq!(Size::new(200, 150).to_string(), "200x150");
    }

    #[test]
    fn positivity() {
        assert!(Size::new(1, 1).is_positive());
        assert!(!Size::new(0, 10).is_positive());
        assert!(!Size::new(10, -1).is_positive());
    }
}
