//! Pipeline stages for figure ingestion.
//!
//! Each submodule implements exactly one transformation step, so each is
//! independently testable and a backend (pdfium, tesseract) can be swapped
//! without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//!              ┌──▶ decode ───────────┐
//! input ──▶ dispatch                  ├──▶ ocr ──▶ ExtractedText
//! (path/URL)   └──▶ render (page 0) ──┘
//!                    (pdfium)
//! ```
//!
//! 1. [`input`]: resolve a path or URL to bytes plus a declared MIME type
//! 2. [`decode`]: PNG/JPEG bytes → [`crate::RasterImage`]
//! 3. [`render`]: PDF bytes → first page as a [`crate::RasterImage`]
//! 4. [`ocr`]: grayscale + text recognition; the only stage that spawns
//!    an external process
//! 5. [`encode`]: PNG/base64 preview of the image for display surfaces

pub mod decode;
pub mod encode;
pub mod input;
pub mod ocr;
pub mod render;
