//! Uploaded documents and the raster images they decode to.

use crate::error::FigqaError;
use image::{ColorType, DynamicImage};
use serde::Serialize;

/// MIME type accepted for PDF uploads.
pub const PDF_MIME: &str = "application/pdf";

/// An uploaded document, tagged by the kind its declared MIME type names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputDocument {
    /// Any `image/*` upload; only PNG and JPEG actually decode.
    Image(Vec<u8>),
    /// An `application/pdf` upload.
    Pdf(Vec<u8>),
}

impl InputDocument {
    /// Dispatch on the declared MIME type.
    ///
    /// Parameters (`; charset=…`) and case are ignored. Anything that is
    /// neither `image/*` nor `application/pdf` is [`FigqaError::UnsupportedType`].
    pub fn from_upload(mime: &str, bytes: Vec<u8>) -> Result<Self, FigqaError> {
        let essence = mime_essence(mime);
        if essence.starts_with("image/") {
            Ok(InputDocument::Image(bytes))
        } else if essence == PDF_MIME {
            Ok(InputDocument::Pdf(bytes))
        } else {
            Err(FigqaError::UnsupportedType {
                mime: mime.trim().to_string(),
            })
        }
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            InputDocument::Image(_) => DocumentKind::Image,
            InputDocument::Pdf(_) => DocumentKind::Pdf,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            InputDocument::Image(b) | InputDocument::Pdf(b) => b,
        }
    }
}

/// Strip MIME parameters and lowercase the `type/subtype` part.
pub(crate) fn mime_essence(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Image,
    Pdf,
}

/// Where a [`RasterImage`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "source")]
pub enum ImageOrigin {
    /// Decoded directly from an uploaded image.
    Upload,
    /// Rendered from a PDF page (0-indexed) out of `page_count` pages.
    PdfPage { index: usize, page_count: usize },
}

/// An in-memory raster produced by decoding or rendering; request-local.
#[derive(Debug, Clone)]
pub struct RasterImage {
    image: DynamicImage,
    origin: ImageOrigin,
}

impl RasterImage {
    pub fn new(image: DynamicImage, origin: ImageOrigin) -> Self {
        Self { image, origin }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Colour layout of the pixels, e.g. `Rgb8` or `L8` for grayscale.
    pub fn color_mode(&self) -> ColorType {
        self.image.color()
    }

    pub fn origin(&self) -> ImageOrigin {
        self.origin
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Serialisable description used in reports.
    pub fn summary(&self) -> ImageSummary {
        ImageSummary {
            width: self.width(),
            height: self.height(),
            color_mode: format!("{:?}", self.color_mode()),
            origin: self.origin,
        }
    }
}

/// Dimensions and provenance of a [`RasterImage`], without the pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSummary {
    pub width: u32,
    pub height: u32,
    pub color_mode: String,
    pub origin: ImageOrigin,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn dispatches_images_and_pdfs() {
        let doc = InputDocument::from_upload("image/png", vec![1, 2]).unwrap();
        assert_eq!(doc.kind(), DocumentKind::Image);
        assert_eq!(doc.bytes(), &[1, 2]);

        let doc = InputDocument::from_upload("image/jpeg", vec![]).unwrap();
        assert_eq!(doc.kind(), DocumentKind::Image);

        let doc = InputDocument::from_upload("application/pdf", vec![]).unwrap();
        assert_eq!(doc.kind(), DocumentKind::Pdf);
    }

    #[test]
    fn generic_image_types_are_images() {
        let doc = InputDocument::from_upload("image/webp", vec![]).unwrap();
        assert_eq!(doc.kind(), DocumentKind::Image);
    }

    #[test]
    fn mime_parameters_and_case_ignored() {
        let doc = InputDocument::from_upload("Application/PDF; name=x.pdf", vec![]).unwrap();
        assert_eq!(doc.kind(), DocumentKind::Pdf);
    }

    #[test]
    fn other_types_unsupported() {
        for mime in ["text/plain", "application/octet-stream", "", "imagepng"] {
            let err = InputDocument::from_upload(mime, vec![]).unwrap_err();
            assert!(
                matches!(err, FigqaError::UnsupportedType { .. }),
                "{mime:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn raster_image_reports_dimensions() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(7, 3, Rgb([0, 0, 0])));
        let raster = RasterImage::new(img, ImageOrigin::Upload);
        assert_eq!(raster.width(), 7);
        assert_eq!(raster.height(), 3);
        assert_eq!(raster.color_mode(), ColorType::Rgb8);

        let summary = raster.summary();
        assert_eq!(summary.color_mode, "Rgb8");
        assert_eq!(summary.origin, ImageOrigin::Upload);
    }
}
