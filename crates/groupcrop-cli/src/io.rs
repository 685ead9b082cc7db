//! The image codec / filesystem collaborator.
//!
//! Reads source pixels by path, hands them to the core as packed RGB
//! buffers, and writes finished crops into the output tree, creating
//! directories as needed.

use std::fs;
use std::path::Path;

use groupcrop_core::raster::{flip_horizontal, zoom_nearest};
use groupcrop_core::RgbBuffer;
use log::debug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read image '{path}': {source}")]
    Decode {
        path: String,
        source: image::ImageError,
    },

    #[error("failed to write image '{path}': {source}")]
    Encode {
        path: String,
        source: image::ImageError,
    },

    #[error("refusing to encode an empty crop")]
    EmptyCrop,

    #[error("failed to create output directory: {0}")]
    CreateDir(#[from] std::io::Error),
}

/// Load the raw source image, applying the horizontal flip when
/// requested. The result is what all crop geometry is computed against.
pub fn load_source(path: &Path, flip: bool) -> Result<RgbBuffer, IoError> {
    let decoded = image::open(path)
        .map_err(|source| IoError::Decode {
            path: path.display().to_string(),
            source,
        })?
        .into_rgb8();
    let buffer = RgbBuffer::new(decoded.width(), decoded.height(), decoded.into_raw());
    debug!(
        "loaded {} ({}x{}, flip={})",
        path.display(),
        buffer.width,
        buffer.height,
        flip
    );
    Ok(if flip { flip_horizontal(&buffer) } else { buffer })
}

/// The preview the operator draws on: the raw image scaled by the display
/// zoom. Stored resolution never changes.
pub fn prepare_display(raw: &RgbBuffer, zoom: f64) -> RgbBuffer {
    zoom_nearest(raw, zoom)
}

/// Write a finished crop, creating parent directories as needed.
///
/// Refuses a zero-area buffer: the crop record is still valid output, but
/// there is nothing to encode.
pub fn save_crop(path: &Path, buffer: &RgbBuffer) -> Result<(), IoError> {
    if buffer.is_empty() {
        return Err(IoError::EmptyCrop);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    image::save_buffer(
        path,
        &buffer.pixels,
        buffer.width,
        buffer.height,
        image::ColorType::Rgb8,
    )
    .map_err(|source| IoError::Encode {
        path: path.display().to_string(),
        source,
    })
}
