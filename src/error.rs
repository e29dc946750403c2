//! Error types for the edgequake-figqa library.
//!
//! Every failure this crate can produce is **request-scoped**: a bad upload,
//! a broken PDF or a missing OCR engine spoils one ingestion, never the
//! process. [`FigqaError`] is therefore returned by the individual pipeline
//! stages, but the top-level `ingest*` functions catch it and store it in
//! [`crate::output::Ingestion::error`] so query answering keeps working.
//!
//! All variants carry owned strings or paths only, which keeps the type
//! `Clone` and lets it be serialised straight into `--json` output.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-figqa library.
#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum FigqaError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// Declared MIME type is neither an image nor a PDF.
    #[error("Unsupported file type '{mime}'. Please upload a PNG, JPG, JPEG, or PDF file.")]
    UnsupportedType { mime: String },

    // ── Decode errors ─────────────────────────────────────────────────────
    /// Image bytes are not a valid PNG/JPEG encoding.
    #[error("Could not decode image: {detail}")]
    Decode { detail: String },

    /// PDF bytes could not be parsed or the first page could not be rendered.
    #[error("Error processing PDF: {cause}")]
    PdfDecode { cause: String },

    /// The PDF parsed fine but has no pages to render.
    #[error("No images found in the PDF.")]
    NoPagesFound,

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The recognition engine is missing, misconfigured, or crashed.
    #[error("OCR engine error: {detail}\nInstall tesseract-ocr or pass --tesseract-cmd <PATH>.")]
    OcrEngine { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FigqaError {
    /// Human-readable name of the step that failed, for user-facing messages.
    pub fn stage(&self) -> &'static str {
        match self {
            FigqaError::FileNotFound { .. }
            | FigqaError::PermissionDenied { .. }
            | FigqaError::InvalidInput { .. }
            | FigqaError::DownloadFailed { .. }
            | FigqaError::DownloadTimeout { .. } => "input",
            FigqaError::UnsupportedType { .. } => "upload",
            FigqaError::Decode { .. } => "image decoding",
            FigqaError::PdfDecode { .. } | FigqaError::NoPagesFound => "PDF processing",
            FigqaError::OcrEngine { .. } => "OCR",
            FigqaError::InvalidConfig(_) => "configuration",
            FigqaError::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_display() {
        let e = FigqaError::UnsupportedType {
            mime: "text/plain".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("text/plain"), "got: {msg}");
        assert!(msg.contains("PDF"));
        assert_eq!(e.stage(), "upload");
    }

    #[test]
    fn pdf_errors_share_stage() {
        let decode = FigqaError::PdfDecode {
            cause: "bad xref".into(),
        };
        assert!(decode.to_string().contains("bad xref"));
        assert_eq!(decode.stage(), "PDF processing");
        assert_eq!(FigqaError::NoPagesFound.stage(), "PDF processing");
    }

    #[test]
    fn ocr_engine_display_has_hint() {
        let e = FigqaError::OcrEngine {
            detail: "tesseract not found".into(),
        };
        assert!(e.to_string().contains("tesseract not found"));
        assert!(e.to_string().contains("--tesseract-cmd"));
    }

    #[test]
    fn serialises_with_kind_tag() {
        let e = FigqaError::Decode {
            detail: "truncated".into(),
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["kind"], "decode");
        assert_eq!(json["data"]["detail"], "truncated");

        let json = serde_json::to_value(FigqaError::NoPagesFound).unwrap();
        assert_eq!(json["kind"], "no_pages_found");
    }
}
