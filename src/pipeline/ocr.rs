//! Text recognition: [`RasterImage`] → grayscale → raw transcription.
//!
//! Grayscale conversion is a fixed preprocessing step, always applied,
//! whatever the colour mode of the input. The transcription is returned
//! exactly as the engine printed it: no trimming, no token filtering, no
//! plausibility check. An unreadable figure yields empty or garbled text,
//! which is a valid result, not an error.
//!
//! The engine sits behind [`TextRecognizer`] so callers (and tests) can plug
//! in something other than the tesseract command line.

use crate::config::AnalyzerConfig;
use crate::document::RasterImage;
use crate::error::FigqaError;
use image::{GrayImage, ImageFormat};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tracing::debug;

/// A text recognition engine operating on single-channel images.
pub trait TextRecognizer: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Recognise text in a grayscale image.
    ///
    /// Returns [`FigqaError::OcrEngine`] only when the engine itself cannot
    /// run; poor recognition is still `Ok`.
    fn recognize(&self, image: &GrayImage) -> Result<String, FigqaError>;
}

/// Tesseract OCR via its command-line interface.
///
/// The image is written to a scratch PNG and `tesseract <png> stdout -l <lang>`
/// is run on it.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    cmd: PathBuf,
    language: String,
}

impl TesseractRecognizer {
    pub fn new(cmd: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            language: language.into(),
        }
    }

    pub fn cmd(&self) -> &Path {
        &self.cmd
    }

    fn run_tesseract(&self, image_path: &Path) -> Result<String, FigqaError> {
        let output = Command::new(&self.cmd)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .output();

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(FigqaError::OcrEngine {
                    detail: format!(
                        "'{}' exited with {}: {}",
                        self.cmd.display(),
                        output.status,
                        stderr.trim()
                    ),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FigqaError::OcrEngine {
                detail: format!("tesseract not found at '{}'", self.cmd.display()),
            }),
            Err(e) => Err(FigqaError::OcrEngine {
                detail: format!("failed to run '{}': {}", self.cmd.display(), e),
            }),
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &GrayImage) -> Result<String, FigqaError> {
        let scratch = tempfile::Builder::new()
            .prefix("figqa-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| FigqaError::Internal(format!("tempfile: {e}")))?;

        image
            .save_with_format(scratch.path(), ImageFormat::Png)
            .map_err(|e| FigqaError::Internal(format!("Failed to write OCR input: {e}")))?;

        // `scratch` is deleted when it drops, after tesseract has exited.
        self.run_tesseract(scratch.path())
    }
}

/// Grayscale-then-recognise front end over a [`TextRecognizer`].
#[derive(Clone)]
pub struct OcrExtractor {
    recognizer: Arc<dyn TextRecognizer>,
}

impl OcrExtractor {
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self { recognizer }
    }

    /// Build from config: the injected recognizer if any, else tesseract.
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        let recognizer = match config.recognizer {
            Some(ref r) => Arc::clone(r),
            None => Arc::new(TesseractRecognizer::new(
                config.tesseract_cmd.clone(),
                config.ocr_language.clone(),
            )),
        };
        Self { recognizer }
    }

    /// Convert to grayscale and return the engine's raw transcription.
    pub fn extract(&self, image: &RasterImage) -> Result<String, FigqaError> {
        let gray = image.as_dynamic().to_luma8();
        debug!(
            "OCR ({}) on {}x{} grayscale image",
            self.recognizer.name(),
            gray.width(),
            gray.height()
        );
        let text = self.recognizer.recognize(&gray)?;
        debug!("OCR produced {} bytes", text.len());
        Ok(text)
    }
}
