//! Configuration types for figure ingestion.
//!
//! All ingestion behaviour is controlled through [`AnalyzerConfig`], built via
//! its [`AnalyzerConfigBuilder`]. The config is an explicit value handed to
//! every entry point; nothing is read from or written to process-wide state
//! after construction, so one config can be shared by any number of requests.
//!
//! The OCR engine is *not* probed here. A wrong `tesseract_cmd` is only
//! discovered the first time an image is recognised, and then surfaces as
//! [`FigqaError::OcrEngine`] for that request alone.

use crate::error::FigqaError;
use crate::pipeline::ocr::TextRecognizer;
use crate::progress::IngestProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Bounds for [`AnalyzerConfig::max_rendered_pixels`].
pub const MIN_RENDERED_PIXELS: u32 = 100;
pub const MAX_RENDERED_PIXELS: u32 = 20_000;

/// Configuration for ingesting an uploaded figure.
///
/// Built via [`AnalyzerConfig::builder()`] or using
/// [`AnalyzerConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_figqa::AnalyzerConfig;
///
/// let config = AnalyzerConfig::builder()
///     .tesseract_cmd("/usr/bin/tesseract")
///     .dpi(300)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 300);
/// ```
#[derive(Clone)]
pub struct AnalyzerConfig {
    /// Path (or bare name looked up in `PATH`) of the tesseract executable.
    /// Default: `"tesseract"`.
    pub tesseract_cmd: PathBuf,

    /// Tesseract language pack passed as `-l`. Default: `"eng"`.
    pub ocr_language: String,

    /// Pre-constructed recognition engine. Takes precedence over `tesseract_cmd`.
    pub recognizer: Option<Arc<dyn TextRecognizer>>,

    /// Explicit pdfium shared library (file, or directory containing it).
    /// If None, `./` and then the system library search path are tried.
    pub pdfium_library: Option<PathBuf>,

    /// Rendering DPI for PDF pages. Range: 72–600. Default: 200.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 4000.
    ///
    /// Caps oversized pages (posters, A0 sheets) independently of DPI.
    pub max_rendered_pixels: u32,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional progress callback for stage-level events.
    pub progress_callback: Option<Arc<dyn IngestProgressCallback>>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: PathBuf::from("tesseract"),
            ocr_language: "eng".to_string(),
            recognizer: None,
            pdfium_library: None,
            dpi: 200,
            max_rendered_pixels: 4000,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field("ocr_language", &self.ocr_language)
            .field(
                "recognizer",
                &self.recognizer.as_ref().map(|_| "<dyn TextRecognizer>"),
            )
            .field("pdfium_library", &self.pdfium_library)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn IngestProgressCallback>"),
            )
            .finish()
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalyzerConfig`].
#[derive(Debug)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    pub fn tesseract_cmd(mut self, cmd: impl Into<PathBuf>) -> Self {
        self.config.tesseract_cmd = cmd.into();
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.config.recognizer = Some(recognizer);
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    /// Clamped to 100–20000.
    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.clamp(MIN_RENDERED_PIXELS, MAX_RENDERED_PIXELS);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn IngestProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalyzerConfig, FigqaError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(FigqaError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if !(MIN_RENDERED_PIXELS..=MAX_RENDERED_PIXELS).contains(&c.max_rendered_pixels) {
            return Err(FigqaError::InvalidConfig(format!(
                "max rendered pixels must be {}–{}, got {}",
                MIN_RENDERED_PIXELS, MAX_RENDERED_PIXELS, c.max_rendered_pixels
            )));
        }
        if c.tesseract_cmd.as_os_str().is_empty() && c.recognizer.is_none() {
            return Err(FigqaError::InvalidConfig(
                "tesseract command must not be empty".into(),
            ));
        }
        if c.ocr_language.trim().is_empty() {
            return Err(FigqaError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
