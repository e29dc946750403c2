//! # edgequake-figqa
//!
//! Read the text out of a figure (a confusion matrix, a formula sheet) and
//! answer questions about it from a fixed knowledge table.
//!
//! The crate has two independent halves. Ingestion turns an uploaded PNG,
//! JPEG or PDF into raw OCR text. Question answering maps a free-text
//! question to one of a handful of canned answers by ordered keyword rules.
//! The extracted text is shown next to every answer, but never influences
//! which answer is chosen.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (path / URL / bytes)
//!  │
//!  ├─ 1. Input     resolve bytes + declared MIME type
//!  ├─ 2. Dispatch  image/* → decode, application/pdf → render
//!  ├─ 3. Raster    decode PNG/JPEG, or render PDF page 1 via pdfium
//!  ├─ 4. OCR       grayscale, then tesseract (spawn_blocking)
//!  └─ 5. Output    Ingestion { image, text, stats, error }
//!
//! question ──▶ QueryMatcher (first matching rule wins) ──▶ canned answer
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_figqa::{AnalyzerConfig, Session};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut session = Session::new(AnalyzerConfig::default());
//!     println!("{}", session.confusion_matrix_report());
//!
//!     let ingestion = session.upload("confusion_matrix.png", None).await;
//!     if let Some(msg) = ingestion.error_message() {
//!         eprintln!("{msg}");
//!     }
//!
//!     println!("{}", session.ask("What is accuracy in a confusion matrix?"));
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `figqa` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## Runtime requirements
//!
//! OCR shells out to `tesseract`, which must be on `PATH` (or configured via
//! [`AnalyzerConfig::tesseract_cmd`]). PDF uploads need the pdfium shared
//! library; see [`pipeline::render::bind_pdfium`] for the lookup order.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod document;
pub mod error;
pub mod knowledge;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod query;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{ingest, ingest_blocking, ingest_bytes, ingest_sync, ingest_upload};
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder};
pub use document::{DocumentKind, ImageOrigin, ImageSummary, InputDocument, RasterImage};
pub use error::FigqaError;
pub use knowledge::{confusion_matrix_facts, formula_facts, KnowledgeReport};
pub use output::{ExtractedText, IngestStats, Ingestion};
pub use pipeline::input::Upload;
pub use pipeline::ocr::{OcrExtractor, TesseractRecognizer, TextRecognizer};
pub use progress::{IngestProgressCallback, IngestStage, NoopProgressCallback, ProgressCallback};
pub use query::{Predicate, QueryMatcher, QueryResult, QueryRule};
pub use session::{Interaction, Session, SessionReport};
