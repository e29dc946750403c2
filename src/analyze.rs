//! Ingestion entry points: upload → image → text.
//!
//! Every function here returns an [`Ingestion`], never a `Result`. A failed
//! stage is logged, reported through the progress callback, and stored in
//! [`Ingestion::error`] with the text left empty. The caller can show the
//! message and carry on; answering questions does not depend on ingestion.
//!
//! Decoding, rendering and OCR block (pdfium and the tesseract subprocess),
//! so the async entry points run them on `spawn_blocking`.

use crate::config::AnalyzerConfig;
use crate::document::{ImageOrigin, InputDocument};
use crate::error::FigqaError;
use crate::output::{ExtractedText, IngestStats, Ingestion};
use crate::pipeline::input::{self, Upload};
use crate::pipeline::ocr::OcrExtractor;
use crate::pipeline::{decode, render};
use crate::progress::IngestStage;
use std::time::Instant;
use tracing::{info, warn};

/// Ingest a local file path or HTTP/HTTPS URL.
///
/// `declared_mime` overrides the type guessed from the file name or sent by
/// the server.
///
/// # Example
/// ```rust,no_run
/// use edgequake_figqa::{ingest, AnalyzerConfig};
///
/// # #[tokio::main]
/// # async fn main() {
/// let ingestion = ingest("confusion_matrix.png", None, &AnalyzerConfig::default()).await;
/// match ingestion.error_message() {
///     Some(msg) => eprintln!("{msg}"),
///     None => println!("{}", ingestion.text),
/// }
/// # }
/// ```
pub async fn ingest(
    input_str: impl AsRef<str>,
    declared_mime: Option<&str>,
    config: &AnalyzerConfig,
) -> Ingestion {
    let input_str = input_str.as_ref();
    info!("Starting ingestion: {}", input_str);

    match input::resolve_upload(input_str, declared_mime, config.download_timeout_secs).await {
        Ok(upload) => ingest_upload(upload, config).await,
        Err(e) => {
            warn!("Input resolution failed for '{}': {}", input_str, e);
            report_error(config, &e);
            Ingestion::failed(input_str, declared_mime.unwrap_or_default(), e)
        }
    }
}

/// Ingest bytes already in memory, dispatched on `mime`.
pub async fn ingest_bytes(
    name: impl Into<String>,
    bytes: Vec<u8>,
    mime: impl Into<String>,
    config: &AnalyzerConfig,
) -> Ingestion {
    let upload = Upload {
        name: name.into(),
        mime: mime.into(),
        bytes,
    };
    ingest_upload(upload, config).await
}

/// Ingest a resolved [`Upload`] on the blocking thread pool.
pub async fn ingest_upload(upload: Upload, config: &AnalyzerConfig) -> Ingestion {
    let name = upload.name.clone();
    let mime = upload.mime.clone();
    let config = config.clone();

    tokio::task::spawn_blocking(move || ingest_blocking(upload, &config))
        .await
        .unwrap_or_else(|e| {
            let err = FigqaError::Internal(format!("Ingestion task panicked: {}", e));
            warn!("{}", err);
            Ingestion::failed(name, mime, err)
        })
}

/// Synchronous wrapper around [`ingest`].
///
/// Creates a temporary tokio runtime internally.
pub fn ingest_sync(
    input_str: impl AsRef<str>,
    declared_mime: Option<&str>,
    config: &AnalyzerConfig,
) -> Ingestion {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(ingest(input_str, declared_mime, config)),
        Err(e) => Ingestion::failed(
            input_str.as_ref(),
            declared_mime.unwrap_or_default(),
            FigqaError::Internal(format!("Failed to create tokio runtime: {}", e)),
        ),
    }
}

/// Run dispatch, decode/render and OCR on the current thread.
pub fn ingest_blocking(upload: Upload, config: &AnalyzerConfig) -> Ingestion {
    let total_start = Instant::now();
    let Upload { name, mime, bytes } = upload;

    if let Some(ref cb) = config.progress_callback {
        cb.on_ingest_start(&name, &mime);
    }

    // ── Step 1: Dispatch on declared type ────────────────────────────────
    let document = match InputDocument::from_upload(&mime, bytes) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Rejected upload '{}': {}", name, e);
            report_error(config, &e);
            return Ingestion::failed(name, mime, e);
        }
    };
    let kind = document.kind();

    let mut ingestion = Ingestion {
        source: name,
        mime,
        kind: Some(kind),
        image: None,
        text: ExtractedText::new(),
        page_count: None,
        discarded_pages: 0,
        stats: IngestStats::default(),
        error: None,
    };

    // ── Step 2: Obtain a raster image ────────────────────────────────────
    let (image, elapsed_ms) = match document {
        InputDocument::Image(bytes) => {
            let (res, ms) = timed(config, IngestStage::Decode, || decode::decode(&bytes));
            ingestion.stats.decode_duration_ms = ms;
            (res, ms)
        }
        InputDocument::Pdf(bytes) => {
            let (res, ms) = timed(config, IngestStage::Render, || {
                render::extract_first_page(&bytes, config)
            });
            ingestion.stats.render_duration_ms = ms;
            (res, ms)
        }
    };

    let image = match image {
        Ok(image) => image,
        Err(e) => {
            warn!("Could not obtain an image from '{}': {}", ingestion.source, e);
            return finish_with_error(ingestion, config, e, total_start);
        }
    };
    info!(
        "Obtained {}x{} image in {}ms",
        image.width(),
        image.height(),
        elapsed_ms
    );

    if let ImageOrigin::PdfPage { page_count, .. } = image.origin() {
        ingestion.page_count = Some(page_count);
        ingestion.discarded_pages = page_count.saturating_sub(1);
    }

    // ── Step 3: OCR ──────────────────────────────────────────────────────
    let ocr = OcrExtractor::from_config(config);
    let (text, ocr_ms) = timed(config, IngestStage::Ocr, || ocr.extract(&image));
    ingestion.stats.ocr_duration_ms = ocr_ms;
    ingestion.image = Some(image);

    match text {
        Ok(text) => {
            ingestion.text = text;
        }
        Err(e) => {
            warn!("OCR failed for '{}': {}", ingestion.source, e);
            return finish_with_error(ingestion, config, e, total_start);
        }
    }

    ingestion.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "Ingestion complete: {} bytes of text, {}ms total",
        ingestion.text.len(),
        ingestion.stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_ingest_complete(ingestion.text.len());
    }

    ingestion
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Run one stage, firing start/complete callbacks and timing it.
fn timed<T>(
    config: &AnalyzerConfig,
    stage: IngestStage,
    f: impl FnOnce() -> Result<T, FigqaError>,
) -> (Result<T, FigqaError>, u64) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
    let start = Instant::now();
    let result = f();
    let elapsed_ms = start.elapsed().as_millis() as u64;
    if result.is_ok() {
        if let Some(ref cb) = config.progress_callback {
            cb.on_stage_complete(stage, elapsed_ms);
        }
    }
    (result, elapsed_ms)
}

fn report_error(config: &AnalyzerConfig, error: &FigqaError) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_ingest_error(error.stage(), &error.to_string());
    }
}

fn finish_with_error(
    mut ingestion: Ingestion,
    config: &AnalyzerConfig,
    error: FigqaError,
    total_start: Instant,
) -> Ingestion {
    report_error(config, &error);
    ingestion.text.clear();
    ingestion.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    ingestion.error = Some(error);
    ingestion
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ocr::TextRecognizer;
    use crate::progress::IngestProgressCallback;
    use image::{DynamicImage, GrayImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    struct Canned(&'static str);

    impl TextRecognizer for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        fn recognize(&self, _image: &GrayImage) -> Result<String, FigqaError> {
            Ok(self.0.to_string())
        }
    }

    #[derive(Default)]
    struct Events(Mutex<Vec<String>>);

    impl IngestProgressCallback for Events {
        fn on_stage_start(&self, stage: IngestStage) {
            self.0.lock().unwrap().push(format!("start:{stage}"));
        }
        fn on_stage_complete(&self, stage: IngestStage, _ms: u64) {
            self.0.lock().unwrap().push(format!("done:{stage}"));
        }
        fn on_ingest_error(&self, stage: &str, _msg: &str) {
            self.0.lock().unwrap().push(format!("error:{stage}"));
        }
        fn on_ingest_complete(&self, len: usize) {
            self.0.lock().unwrap().push(format!("complete:{len}"));
        }
    }

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 255, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    fn upload(mime: &str, bytes: Vec<u8>) -> Upload {
        Upload {
            name: "figure".into(),
            mime: mime.into(),
            bytes,
        }
    }

    fn config_with(text: &'static str, events: Option<Arc<Events>>) -> AnalyzerConfig {
        let mut builder = AnalyzerConfig::builder().recognizer(Arc::new(Canned(text)));
        if let Some(ev) = events {
            builder = builder.progress_callback(ev);
        }
        builder.build().unwrap()
    }

    #[test]
    fn image_upload_runs_decode_then_ocr() {
        let events = Arc::new(Events::default());
        let config = config_with("TP FP\nFN TN", Some(events.clone()));

        let ing = ingest_blocking(upload("image/png", png_bytes()), &config);
        assert!(ing.is_ok(), "{:?}", ing.error);
        assert_eq!(ing.text, "TP FP\nFN TN");
        assert_eq!(ing.kind, Some(crate::DocumentKind::Image));
        assert!(ing.image.is_some());
        assert_eq!(ing.page_count, None);

        let events = events.0.lock().unwrap();
        assert_eq!(
            *events,
            vec!["start:decode", "done:decode", "start:ocr", "done:ocr", "complete:11"]
        );
    }

    #[test]
    fn unsupported_type_short_circuits() {
        let events = Arc::new(Events::default());
        let config = config_with("never", Some(events.clone()));

        let ing = ingest_blocking(upload("text/plain", b"hello".to_vec()), &config);
        assert!(matches!(ing.error, Some(FigqaError::UnsupportedType { .. })));
        assert!(ing.text.is_empty());
        assert!(ing.kind.is_none());
        assert_eq!(*events.0.lock().unwrap(), vec!["error:upload"]);
    }

    #[test]
    fn malformed_png_is_decode_error_without_ocr() {
        let events = Arc::new(Events::default());
        let config = config_with("never", Some(events.clone()));

        let ing = ingest_blocking(upload("image/png", b"garbage".to_vec()), &config);
        assert!(matches!(ing.error, Some(FigqaError::Decode { .. })));
        assert!(ing.image.is_none());
        assert!(ing.text.is_empty());
        assert_eq!(
            *events.0.lock().unwrap(),
            vec!["start:decode", "error:image decoding"]
        );
    }

    #[test]
    fn ocr_engine_failure_keeps_image_but_no_text() {
        let config = AnalyzerConfig::builder()
            .tesseract_cmd("/definitely/not/a/tesseract")
            .build()
            .unwrap();
        let ing = ingest_blocking(upload("image/png", png_bytes()), &config);
        assert!(matches!(ing.error, Some(FigqaError::OcrEngine { .. })));
        assert!(ing.image.is_some());
        assert!(ing.text.is_empty());
    }

    #[test]
    fn empty_transcription_is_not_an_error() {
        let config = config_with("", None);
        let ing = ingest_blocking(upload("image/png", png_bytes()), &config);
        assert!(ing.is_ok());
        assert!(ing.text_is_empty());
    }

    #[tokio::test]
    async fn async_entry_points_agree_with_blocking() {
        let config = config_with("Accuracy", None);
        let ing = ingest_bytes("cm.png", png_bytes(), "image/png", &config).await;
        assert_eq!(ing.text, "Accuracy");
        assert_eq!(ing.source, "cm.png");
    }

    #[tokio::test]
    async fn missing_path_is_reported_not_raised() {
        let config = config_with("never", None);
        let ing = ingest("/definitely/not/here.png", None, &config).await;
        assert!(matches!(ing.error, Some(FigqaError::FileNotFound { .. })));
        assert!(ing.text.is_empty());
    }

    #[test]
    fn sync_wrapper_reads_a_local_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cm.png");
        std::fs::write(&path, png_bytes()).unwrap();

        let config = config_with("TP 3 FN 1", None);
        let ing = ingest_sync(path.to_str().unwrap(), None, &config);
        assert!(ing.is_ok(), "{:?}", ing.error);
        assert_eq!(ing.mime, "image/png");
        assert_eq!(ing.text, "TP 3 FN 1");
    }
}
