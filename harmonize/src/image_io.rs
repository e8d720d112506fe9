//! 8-bit RGB image reading and writing.

use std::path::Path;

use image::RgbImage;

use crate::error::{Error, Result};

/// Decodes an image and converts it to 8-bit RGB.
///
/// When `expected` is given, the decoded size must match it.
pub(crate) fn load_rgb(path: &Path, expected: Option<(u32, u32)>) -> Result<RgbImage> {
    let image = image::open(path)
        .map_err(|source| Error::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?
        .into_rgb8();

    if let Some(expected) = expected {
        if image.dimensions() != expected {
            return Err(Error::ImageSizeMismatch {
                path: path.to_path_buf(),
                expected,
                actual: image.dimensions(),
            });
        }
    }

    Ok(image)
}

/// Encodes an RGB image; the format follows the file extension.
pub(crate) fn save_rgb(path: &Path, image: &RgbImage) -> Result<()> {
    image.save(path).map_err(|source| Error::ImageSave {
        path: path.to_path_buf(),
        source,
    })
}
