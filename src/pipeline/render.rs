//! PDF rasterisation: render the first page of an uploaded PDF via pdfium.
//!
//! Only page 0 is ever rendered. A figure upload is normally one figure per
//! document; later pages are counted, logged, and dropped. Text from
//! several pages is never aggregated.
//!
//! Every failure, including failing to load the pdfium library itself, is
//! reported as [`FigqaError::PdfDecode`] with the underlying cause, or
//! [`FigqaError::NoPagesFound`] for a document without pages. Both are
//! ordinary `Err` values; nothing here panics on bad input.

use crate::config::{AnalyzerConfig, MAX_RENDERED_PIXELS, MIN_RENDERED_PIXELS};
use crate::document::{ImageOrigin, RasterImage};
use crate::error::FigqaError;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Bind to a pdfium shared library.
///
/// Resolution order: the explicit `library` (a file, or a directory holding
/// the platform library), then `./`, then the system library search path.
pub fn bind_pdfium(library: Option<&Path>) -> Result<Pdfium, FigqaError> {
    let bindings = match library {
        Some(path) if path.is_dir() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(path))
        }
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
            Path::new("./"),
        ))
        .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| FigqaError::PdfDecode {
        cause: format!(
            "failed to bind to pdfium library: {:?}\n\
             Set PDFIUM_LIB_PATH or pass --pdfium-lib <PATH>.",
            e
        ),
    })?;

    Ok(Pdfium::new(bindings))
}

/// Render the first page of a PDF held in memory.
///
/// Blocking; callers on an async runtime should wrap this in
/// `spawn_blocking`.
pub fn extract_first_page(bytes: &[u8], config: &AnalyzerConfig) -> Result<RasterImage, FigqaError> {
    let pdfium = bind_pdfium(config.pdfium_library.as_deref())?;
    extract_first_page_with(&pdfium, bytes, config)
}

/// Same as [`extract_first_page`] but with an already-bound pdfium.
pub fn extract_first_page_with(
    pdfium: &Pdfium,
    bytes: &[u8],
    config: &AnalyzerConfig,
) -> Result<RasterImage, FigqaError> {
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| FigqaError::PdfDecode {
            cause: format!("{:?}", e),
        })?;

    let pages = document.pages();
    let page_count = pages.len() as usize;
    info!("PDF loaded: {} pages", page_count);

    if page_count == 0 {
        return Err(FigqaError::NoPagesFound);
    }
    if page_count > 1 {
        debug!("Using page 1 only; discarding {} later pages", page_count - 1);
    }

    let page = pages.get(0).map_err(|e| FigqaError::PdfDecode {
        cause: format!("page 1: {:?}", e),
    })?;

    let max_pixels = pixel_cap(config);
    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(config.dpi as f32 / 72.0)
        .set_maximum_width(max_pixels)
        .set_maximum_height(max_pixels);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| FigqaError::PdfDecode {
            cause: format!("rasterisation of page 1 failed: {:?}", e),
        })?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page 1 → {}x{} px at {} DPI",
        image.width(),
        image.height(),
        config.dpi
    );

    Ok(RasterImage::new(
        image,
        ImageOrigin::PdfPage {
            index: 0,
            page_count,
        },
    ))
}

/// Longest rendered edge, bounded so it always fits pdfium's `i32`.
fn pixel_cap(config: &AnalyzerConfig) -> i32 {
    config
        .max_rendered_pixels
        .clamp(MIN_RENDERED_PIXELS, MAX_RENDERED_PIXELS) as i32
}
