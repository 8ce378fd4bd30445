//! Foundation types for thumbvault.
//!
//! Every other thumbvault crate depends on `thumbvault-types`. Nothing here
//! touches the file system or pixel data.
//!
//! # Key Types
//!
//! - [`ImageId`]: UUID naming one logical image and all its derived thumbnails
//! - [`ImageFormat`]: The fixed set of encodings a repository can store
//! - [`Size`]: Signed width/height pair used for bounds and target sizes

pub mod error;
pub mod format;
pub mod id;
pub mod size;

pub use error::TypeError;
pub use format::{content_type_hint, ImageFormat, DEFAULT_CONTENT_TYPE};
pub use id::ImageId;
pub use size::Size;
