//! Progress-callback trait for stage-level ingestion events.
//!
//! Inject an [`Arc<dyn IngestProgressCallback>`] via
//! [`crate::config::AnalyzerConfigBuilder::progress_callback`] to be told
//! when decoding, PDF rendering and OCR start and finish. OCR on a large
//! scan can take several seconds, so an interactive front-end wants
//! something to show in the meantime.
//!
//! # Example
//!
//! ```rust
//! use edgequake_figqa::{AnalyzerConfig, IngestProgressCallback, IngestStage};
//! use std::sync::Arc;
//!
//! struct StageLogger;
//!
//! impl IngestProgressCallback for StageLogger {
//!     fn on_stage_complete(&self, stage: IngestStage, elapsed_ms: u64) {
//!         eprintln!("{stage} finished in {elapsed_ms}ms");
//!     }
//! }
//!
//! let config = AnalyzerConfig::builder()
//!     .progress_callback(Arc::new(StageLogger) as Arc<dyn IngestProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// The blocking steps an ingestion goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStage {
    /// Decoding PNG/JPEG bytes.
    Decode,
    /// Rasterising the first PDF page.
    Render,
    /// Grayscale conversion plus text recognition.
    Ocr,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestStage::Decode => "decode",
            IngestStage::Render => "render",
            IngestStage::Ocr => "ocr",
        };
        f.write_str(name)
    }
}

/// Called by the ingestion pipeline as it moves through each stage.
///
/// Implementations must be `Send + Sync`: the stages run on a blocking
/// worker thread, not on the caller's thread. All methods have default
/// no-op implementations so callers only override what they care about.
pub trait IngestProgressCallback: Send + Sync {
    /// Called once, after the upload has been resolved to bytes.
    fn on_ingest_start(&self, name: &str, mime: &str) {
        let _ = (name, mime);
    }

    /// Called just before a stage begins.
    fn on_stage_start(&self, stage: IngestStage) {
        let _ = stage;
    }

    /// Called when a stage finishes without error.
    fn on_stage_complete(&self, stage: IngestStage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called when ingestion stops because of a request-scoped error.
    ///
    /// `stage` is the human-readable step name from [`crate::FigqaError::stage`].
    fn on_ingest_error(&self, stage: &str, message: &str) {
        let _ = (stage, message);
    }

    /// Called once when text has been extracted.
    ///
    /// # Arguments
    /// * `text_len`: byte length of the raw transcription (may be 0)
    fn on_ingest_complete(&self, text_len: usize) {
        let _ = text_len;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl IngestProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalyzerConfig`].
pub type ProgressCallback = Arc<dyn IngestProgressCallback>;
