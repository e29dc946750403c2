//! Preview encoding: [`RasterImage`] → PNG bytes, base64 data-URI, or file.
//!
//! The decoded or rendered image has no behavioural role after OCR; it is
//! kept only so a display surface can show the user what was read. PNG is
//! used because it is lossless, so the preview shows exactly the pixels the
//! OCR engine saw (before grayscale conversion).

use crate::document::RasterImage;
use crate::error::FigqaError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Encode the image as PNG bytes.
pub fn encode_png(image: &RasterImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    image
        .as_dynamic()
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

/// Encode the image as a `data:image/png;base64,…` URI.
pub fn encode_preview(image: &RasterImage) -> Result<String, image::ImageError> {
    let png = encode_png(image)?;
    let b64 = STANDARD.encode(&png);
    debug!("Encoded preview → {} bytes base64", b64.len());
    Ok(format!("data:image/png;base64,{b64}"))
}

/// Write the image to `path` as PNG.
pub fn save_preview(image: &RasterImage, path: &Path) -> Result<(), FigqaError> {
    image
        .as_dynamic()
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| FigqaError::Internal(format!("Failed to save preview to {:?}: {e}", path)))
}
