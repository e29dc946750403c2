//! Result types produced by ingestion.

use crate::document::{DocumentKind, RasterImage};
use crate::error::FigqaError;
use serde::Serialize;

/// Raw OCR transcription of one upload. Possibly empty; never filtered.
pub type ExtractedText = String;

/// What one upload produced.
///
/// Always returned, even when a stage failed: in that case `error` is set,
/// `text` is empty, and `image` is present only if decoding or rendering
/// got that far.
#[derive(Debug, Clone, Serialize)]
pub struct Ingestion {
    /// Display name of the upload (file name or URL tail).
    pub source: String,
    /// Declared MIME type the upload was dispatched on.
    pub mime: String,
    /// Document kind, if the MIME type was accepted.
    pub kind: Option<DocumentKind>,
    /// Decoded or rendered image; kept for display only.
    #[serde(serialize_with = "serialize_image")]
    pub image: Option<RasterImage>,
    /// OCR output, verbatim.
    pub text: ExtractedText,
    /// Pages in the PDF, for PDF uploads that parsed.
    pub page_count: Option<usize>,
    /// PDF pages beyond the first, which are never read.
    pub discarded_pages: usize,
    pub stats: IngestStats,
    pub error: Option<FigqaError>,
}

impl Ingestion {
    /// An ingestion that stopped before any stage ran.
    pub(crate) fn failed(source: impl Into<String>, mime: impl Into<String>, error: FigqaError) -> Self {
        Self {
            source: source.into(),
            mime: mime.into(),
            kind: None,
            image: None,
            text: ExtractedText::new(),
            page_count: None,
            discarded_pages: 0,
            stats: IngestStats::default(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// True when OCR ran (or was attempted) but yielded no non-whitespace text.
    pub fn text_is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// User-facing description of the failure, naming the step that failed.
    pub fn error_message(&self) -> Option<String> {
        self.error
            .as_ref()
            .map(|e| format!("{} failed: {}", e.stage(), e))
    }
}

fn serialize_image<S>(image: &Option<RasterImage>, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    image.as_ref().map(RasterImage::summary).serialize(s)
}

/// Wall-clock timings of one ingestion, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub decode_duration_ms: u64,
    pub render_duration_ms: u64,
    pub ocr_duration_ms: u64,
    pub total_duration_ms: u64,
}
