//! Raster decoding: uploaded PNG/JPEG bytes → [`RasterImage`].

use crate::document::{ImageOrigin, RasterImage};
use crate::error::FigqaError;
use tracing::debug;

/// Decode an uploaded image.
///
/// The format is sniffed from the bytes, not taken from the declared MIME
/// type. Only PNG and JPEG decoders are compiled in; anything else, and any
/// truncated or corrupt stream, is [`FigqaError::Decode`].
pub fn decode(bytes: &[u8]) -> Result<RasterImage, FigqaError> {
    let image = image::load_from_memory(bytes).map_err(|e| FigqaError::Decode {
        detail: e.to_string(),
    })?;

    debug!(
        "Decoded image → {}x{} px ({:?})",
        image.width(),
        image.height(),
        image.color()
    );

    Ok(RasterImage::new(image, ImageOrigin::Upload))
}
