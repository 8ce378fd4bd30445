//! Aspect-preserving thumbnail sizing and resampling.
//!
//! The sizing policy is "fit inside the bounding box, keep the aspect ratio,
//! never enlarge". A bound of zero (or less) leaves that axis unconstrained.
//! The arithmetic runs in `f32` and the boundary predicates are deliberately
//! asymmetric; see [`compute_target_size`].

use std::path::Path;

use image::imageops::FilterType;
use image::DynamicImage;
use thumbvault_types::Size;
use tracing::debug;

use crate::codec;
use crate::error::{ImagingError, Result};

/// Bicubic-equivalent filter used for every resample.
const RESAMPLE_FILTER: FilterType = FilterType::CatmullRom;

/// Compute the size a thumbnail should have.
///
/// 1. If the source already fits both bounds, or `max_width <= 0` and the
///    source height is strictly below `max_height`, or `max_height <= 0` and
///    the source width is strictly below `max_width`, the source size is
///    returned unchanged.
/// 2. Otherwise, if `max_width > 0` and scaling to `max_width` keeps the
///    height within `max_height` (or `max_height <= 0`), the result is
///    `max_width` by the scaled height.
/// 3. Otherwise the result is the scaled width by `max_height`.
///
/// Scaled sides are rounded half-to-even.
///
/// ```
/// use thumbvault_imaging::compute_target_size;
/// use thumbvault_types::Size;
///
/// assert_eq!(compute_target_size(200, 200, 800, 1000), Size::new(160, 200));
/// assert_eq!(compute_target_size(50, 0, 200, 100), Size::new(50, 25));
/// assert_eq!(compute_target_size(100, 100, 50, 40), Size::new(50, 40));
/// ```
pub fn compute_target_size(
    max_width: i32,
    max_height: i32,
    actual_width: i32,
    actual_height: i32,
) -> Size {
    let width = actual_width as f32;
    let height = actual_height as f32;
    let max_width_f = max_width as f32;
    let max_height_f = max_height as f32;

    if (width <= max_width_f && height <= max_height_f)
        || (max_width <= 0 && actual_height < max_height)
        || (max_height <= 0 && actual_width < max_width)
    {
        return Size::new(actual_width, actual_height);
    }

    // Width first, unless width is unconstrained.
    let scale = max_width_f / width;
    if max_width > 0 && (height * scale <= max_height_f || max_height <= 0) {
        return Size::new(max_width, round_to_i32(height * scale));
    }

    let scale = max_height_f / height;
    Size::new(round_to_i32(width * scale), max_height)
}

/// [`compute_target_size`] for a decoded image.
pub fn thumbnail_size(max_width: i32, max_height: i32, image: &DynamicImage) -> Size {
    compute_target_size(
        max_width,
        max_height,
        clamp_dimension(image.width()),
        clamp_dimension(image.height()),
    )
}

/// Resample an image to exactly `width` x `height`.
///
/// Both sides must be strictly positive.
pub fn resample(image: &DynamicImage, width: i32, height: i32) -> Result<DynamicImage> {
    if width <= 0 || height <= 0 {
        return Err(ImagingError::InvalidDimensions { width, height });
    }
    debug!(
        from_width = image.width(),
        from_height = image.height(),
        width,
        height,
        "resampling image"
    );
    Ok(image.resize_exact(width as u32, height as u32, RESAMPLE_FILTER))
}

/// Produce a thumbnail bounded by `max_width` x `max_height`.
///
/// Images that already fit come back as an unmodified copy.
pub fn create_thumbnail(
    image: &DynamicImage,
    max_width: i32,
    max_height: i32,
) -> Result<DynamicImage> {
    let target = thumbnail_size(max_width, max_height, image);
    let source = Size::new(clamp_dimension(image.width()), clamp_dimension(image.height()));
    if target == source && target.is_positive() {
        return Ok(image.clone());
    }
    resample(image, target.width, target.height)
}

/// Decode a file and produce a thumbnail of it.
pub fn create_thumbnail_from_file(
    path: &Path,
    max_width: i32,
    max_height: i32,
) -> Result<DynamicImage> {
    let image = codec::decode_file(path)?;
    create_thumbnail(&image, max_width, max_height)
}

fn round_to_i32(value: f32) -> i32 {
    value.round_ties_even() as i32
}

fn clamp_dimension(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
