// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Cheap checks run before a file reaches the caption oracle

use image::ImageReader;
use std::path::Path;
use tracing::debug;

/// Extensions a batch job will pick up
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff"];

/// Check if a path carries a recognized image extension
pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Check that a file decodes as an image.
///
/// Only the header is decoded. Unreadable or malformed files yield
/// `false`; the file is opened read-only.
pub fn is_valid_image(path: &Path) -> bool {
    let result = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(image::ImageError::from)
        .and_then(|reader| reader.into_dimensions());

    match result {
        Ok((width, height)) => {
            debug!("Valid image {:?} ({}x{})", path, width, height);
            true
        }
        Err(e) => {
            debug!("Invalid image {:?}: {}", path, e);
            false
        }
    }
}
