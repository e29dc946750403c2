//! CLI binary for edgequake-figqa.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `AnalyzerConfig`, drives a `Session`, and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_figqa::pipeline::encode::save_preview;
use edgequake_figqa::{
    AnalyzerConfig, ImageOrigin, IngestProgressCallback, IngestStage, Ingestion, Interaction,
    ProgressCallback, Session,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one spinner per upload, with a log line per
/// finished stage. A new spinner is created on every `on_ingest_start`, so
/// the same callback serves repeated `:upload` commands.
struct CliProgressCallback {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
        })
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(ref bar) = *guard {
                f(bar);
            }
        }
    }

    fn take_bar(&self) -> Option<ProgressBar> {
        self.bar.lock().ok().and_then(|mut guard| guard.take())
    }
}

fn stage_label(stage: IngestStage) -> &'static str {
    match stage {
        IngestStage::Decode => "Decoding",
        IngestStage::Render => "Rendering",
        IngestStage::Ocr => "Recognising",
    }
}

impl IngestProgressCallback for CliProgressCallback {
    fn on_ingest_start(&self, name: &str, mime: &str) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Reading");
        bar.set_message(format!("{name} {}", dim(&format!("({mime})"))));
        bar.enable_steady_tick(Duration::from_millis(80));

        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(bar) {
                old.finish_and_clear();
            }
        }
    }

    fn on_stage_start(&self, stage: IngestStage) {
        self.with_bar(|bar| bar.set_prefix(stage_label(stage)));
    }

    fn on_stage_complete(&self, stage: IngestStage, elapsed_ms: u64) {
        self.with_bar(|bar| {
            bar.println(format!(
                "  {} {:<8}  {}",
                green("✓"),
                stage.to_string(),
                dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
            ))
        });
    }

    fn on_ingest_error(&self, stage: &str, message: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg: String = if message.chars().count() > 80 {
            let mut s: String = message.chars().take(79).collect();
            s.push('\u{2026}');
            s
        } else {
            message.to_string()
        };
        let line = format!("  {} {} failed  {}", red("✗"), stage, red(&msg));

        match self.take_bar() {
            Some(bar) => {
                bar.println(line);
                bar.finish_and_clear();
            }
            None => eprintln!("{line}"),
        }
    }

    fn on_ingest_complete(&self, _text_len: usize) {
        // The summary line is printed by `upload`, from the finished ingestion.
        if let Some(bar) = self.take_bar() {
            bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Show the knowledge reports and read a figure
  figqa confusion_matrix.png

  # Ask questions about an uploaded figure
  figqa cm.png -a "What is accuracy in a confusion matrix?" -a "f1 score?"

  # PDF upload (only the first page is read)
  figqa exam.pdf --ask "is the formula syntax correct"

  # Interactive session; type :upload PATH [MIME] to switch figures, :quit to exit
  figqa --interactive cm.png

  # From a URL, forcing the MIME type
  figqa https://example.com/figure --mime image/png -a "recall of the confusion matrix"

  # JSON output for scripting
  figqa --json cm.png -a "precision in this confusion matrix" > answer.json

  # Keep the image that was fed to OCR
  figqa exam.pdf --save-image page1.png

ENVIRONMENT VARIABLES:
  FIGQA_MIME              Declared MIME type of INPUT (same as --mime)
  FIGQA_JSON              Output a JSON report (same as --json)
  FIGQA_TESSERACT_CMD     Path to the tesseract executable
  FIGQA_LANG              Tesseract language pack (default: eng)
  FIGQA_DPI               PDF rendering DPI, 72–600 (default: 200)
  FIGQA_DOWNLOAD_TIMEOUT  HTTP download timeout in seconds (default: 120)
  FIGQA_NO_PROGRESS       Disable the progress spinner
  FIGQA_VERBOSE           Enable DEBUG-level logs
  FIGQA_QUIET             Suppress all output except errors
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Override the log filter

SETUP:
  1. Install tesseract:   apt install tesseract-ocr  /  brew install tesseract
  2. For PDF uploads, put libpdfium next to the binary, in the working
     directory, on the system library path, or point PDFIUM_LIB_PATH at it.
"#;

/// Read figures with OCR and answer questions about confusion matrices and formulas.
#[derive(Parser, Debug)]
#[command(
    name = "figqa",
    version,
    about = "Read figures with OCR and answer questions about confusion matrices and formulas",
    long_about = "Upload a PNG, JPEG or PDF figure (local file or URL), extract its text with \
tesseract, and ask questions answered from a built-in knowledge table. The extracted text is \
shown alongside each answer for context.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PNG/JPEG/PDF path or HTTP/HTTPS URL.
    input: Option<String>,

    /// Declared MIME type of the input (overrides extension and Content-Type).
    #[arg(long, env = "FIGQA_MIME")]
    mime: Option<String>,

    /// Question to answer; may be repeated.
    #[arg(short = 'a', long = "ask")]
    ask: Vec<String>,

    /// Read further questions from stdin, one per line.
    #[arg(short, long)]
    interactive: bool,

    /// Output a structured JSON report instead of text.
    #[arg(long, env = "FIGQA_JSON")]
    json: bool,

    /// Save the decoded or rendered image as PNG.
    #[arg(long)]
    save_image: Option<PathBuf>,

    /// Tesseract executable.
    #[arg(long, env = "FIGQA_TESSERACT_CMD", default_value = "tesseract")]
    tesseract_cmd: PathBuf,

    /// Tesseract language pack.
    #[arg(long, env = "FIGQA_LANG", default_value = "eng")]
    lang: String,

    /// Path to the pdfium shared library, or a directory containing it.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// PDF rendering DPI (72–600).
    #[arg(long, env = "FIGQA_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "FIGQA_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable the progress spinner.
    #[arg(long, env = "FIGQA_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FIGQA_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FIGQA_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO-level library logs while it is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn IngestProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let mut session = Session::new(config);
    let mut interactions = Vec::new();

    // ── Knowledge reports ────────────────────────────────────────────────
    if !cli.json {
        emit(&format!(
            "{}\n\n{}\n\n",
            session.confusion_matrix_report(),
            session.formula_report()
        ))?;
    }

    // ── Upload ───────────────────────────────────────────────────────────
    if let Some(ref input) = cli.input {
        upload(&mut session, input, cli.mime.as_deref(), &cli, show_progress).await?;
    }

    // ── Questions ────────────────────────────────────────────────────────
    for query in &cli.ask {
        let interaction = session.ask(query);
        if !cli.json {
            print_interaction(&interaction)?;
        }
        interactions.push(interaction);
    }

    if cli.interactive {
        run_interactive(&mut session, &cli, show_progress, &mut interactions).await?;
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&session.report(interactions))
            .context("Failed to serialise output")?;
        emit(&format!("{json}\n"))?;
    }

    Ok(())
}

/// Map CLI args to `AnalyzerConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnalyzerConfig> {
    let mut builder = AnalyzerConfig::builder()
        .tesseract_cmd(cli.tesseract_cmd.clone())
        .ocr_language(cli.lang.clone())
        .dpi(cli.dpi)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library(lib.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Replace the session's document and report the outcome.
///
/// Ingestion failures are printed and swallowed: the session stays usable.
async fn upload(
    session: &mut Session,
    input: &str,
    declared_mime: Option<&str>,
    cli: &Cli,
    show_progress: bool,
) -> Result<()> {
    let ingestion = session.upload(input, declared_mime).await;

    if let (Some(path), Some(image)) = (cli.save_image.as_ref(), ingestion.image.as_ref()) {
        match save_preview(image, path) {
            Ok(()) if !cli.quiet => {
                eprintln!("{} image saved to {}", dim("·"), bold(&path.display().to_string()))
            }
            Ok(()) => {}
            Err(e) => eprintln!("{} {}", red("✗"), e),
        }
    }

    match ingestion.error_message() {
        // The spinner already printed the failing stage.
        Some(msg) if !show_progress => eprintln!("{} {}", red("✗"), msg),
        Some(_) => {}
        None => {
            if !cli.quiet && !cli.json {
                eprintln!("{}", extraction_summary(ingestion));
            }
            if !cli.json {
                emit(&describe_ingestion(ingestion))?;
            }
        }
    }
    Ok(())
}

/// One-line stderr summary of a successful ingestion.
fn extraction_summary(ingestion: &Ingestion) -> String {
    if ingestion.text_is_empty() {
        format!("{} no text recognised", cyan("⚠"))
    } else {
        format!(
            "{} {} characters extracted",
            green("✔"),
            bold(&ingestion.text.trim().chars().count().to_string())
        )
    }
}

fn describe_ingestion(ingestion: &Ingestion) -> String {
    let mut out = format!("**Uploaded:** {} ({})\n", ingestion.source, ingestion.mime);
    if let Some(ref image) = ingestion.image {
        let caption = match image.origin() {
            ImageOrigin::Upload => "Uploaded Image.".to_string(),
            ImageOrigin::PdfPage { page_count, .. } if page_count > 1 => format!(
                "Image from PDF. (page 1 of {page_count}, {} not read)",
                ingestion.discarded_pages
            ),
            ImageOrigin::PdfPage { .. } => "Image from PDF.".to_string(),
        };
        let summary = image.summary();
        out.push_str(&format!(
            "{caption} {}x{} {}\n\n",
            summary.width, summary.height, summary.color_mode
        ));
    }
    out
}

fn print_interaction(interaction: &Interaction) -> Result<()> {
    emit(&format!("{interaction}\n\n"))
}

/// Read questions from stdin until EOF or `:quit`.
async fn run_interactive(
    session: &mut Session,
    cli: &Cli,
    show_progress: bool,
    interactions: &mut Vec<Interaction>,
) -> Result<()> {
    let prompt = io::stdin().is_terminal() && !cli.json;
    if prompt && !cli.quiet {
        eprintln!(
            "{} {}",
            cyan("◆"),
            dim("Ask a question, :upload PATH [MIME] to change figure, :quit to exit")
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if prompt {
            eprint!("{} ", bold(">"));
            io::stderr().flush().ok();
        }
        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };

        // `--mime` applies to the positional input only.
        match parse_command(&line) {
            Command::Quit => break,
            Command::UploadUsage => eprintln!("{} usage: :upload PATH [MIME]", red("✗")),
            Command::Upload { path, mime } => {
                upload(session, path, mime, cli, show_progress).await?;
            }
            Command::Ask(query) => {
                let interaction = session.ask(query);
                if !cli.json {
                    print_interaction(&interaction)?;
                }
                interactions.push(interaction);
            }
        }
    }
    Ok(())
}

/// One line of interactive input.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Quit,
    UploadUsage,
    Upload { path: &'a str, mime: Option<&'a str> },
    Ask(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    if line == ":quit" || line == ":q" {
        return Command::Quit;
    }

    let Some(rest) = line.strip_prefix(":upload") else {
        return Command::Ask(line);
    };
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return Command::Ask(line);
    }
    let rest = rest.trim();
    if rest.is_empty() {
        return Command::UploadUsage;
    }

    // A trailing `type/subtype` token is the declared MIME type.
    if let Some((path, last)) = rest.rsplit_once(char::is_whitespace) {
        let path = path.trim();
        if !path.is_empty() && looks_like_mime(last) {
            return Command::Upload {
                path,
                mime: Some(last),
            };
        }
    }
    Command::Upload {
        path: rest,
        mime: None,
    }
}

fn looks_like_mime(token: &str) -> bool {
    match token.split_once('/') {
        Some((ty, sub)) => {
            !ty.is_empty()
                && ty.chars().all(|c| c.is_ascii_alphabetic())
                && !sub.is_empty()
                && !sub.contains('/')
        }
        None => false,
    }
}

fn emit(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .and_then(|_| handle.flush())
        .context("Failed to write to stdout")
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgequake_figqa::{ingest_blocking, TextRecognizer, Upload};
    use edgequake_figqa::FigqaError;
    use image::GrayImage;

    #[test]
    fn upload_command_without_mime() {
        assert_eq!(
            parse_command(":upload exam.pdf"),
            Command::Upload {
                path: "exam.pdf",
                mime: None
            }
        );
        assert_eq!(
            parse_command("  :upload  /tmp/dir/fig.png  "),
            Command::Upload {
                path: "/tmp/dir/fig.png",
                mime: None
            }
        );
    }

    #[test]
    fn upload_command_with_mime() {
        assert_eq!(
            parse_command(":upload figure.dat image/png"),
            Command::Upload {
                path: "figure.dat",
                mime: Some("image/png")
            }
        );
        // A path with a space is not mistaken for a MIME type.
        assert_eq!(
            parse_command(":upload my figs/cm.png"),
            Command::Upload {
                path: "my figs/cm.png",
                mime: None
            }
        );
    }

    #[test]
    fn other_commands() {
        assert_eq!(parse_command(":quit"), Command::Quit);
        assert_eq!(parse_command(":q"), Command::Quit);
        assert_eq!(parse_command(":upload   "), Command::UploadUsage);
        assert_eq!(parse_command(":uploaded?"), Command::Ask(":uploaded?"));
        assert_eq!(
            parse_command(" What is the f1 score? "),
            Command::Ask("What is the f1 score?")
        );
    }

    #[test]
    fn cli_mime_is_not_reused_for_later_uploads() {
        let cli = Cli::parse_from(["figqa", "fig.dat", "--mime", "image/png", "-i"]);
        assert_eq!(cli.mime.as_deref(), Some("image/png"));
        let Command::Upload { mime, .. } = parse_command(":upload exam.pdf") else {
            panic!("expected an upload command");
        };
        assert_eq!(mime, None);
    }

    struct FormFeed;

    impl TextRecognizer for FormFeed {
        fn name(&self) -> &str {
            "form-feed"
        }

        fn recognize(&self, _image: &GrayImage) -> Result<String, FigqaError> {
            Ok("\x0c".to_string())
        }
    }

    #[test]
    fn whitespace_only_text_is_reported_as_empty() {
        let config = AnalyzerConfig::builder()
            .recognizer(Arc::new(FormFeed))
            .build()
            .unwrap();
        let mut png = Vec::new();
        image::DynamicImage::ImageLuma8(GrayImage::new(4, 4))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let ingestion = ingest_blocking(
            Upload {
                name: "blank.png".into(),
                mime: "image/png".into(),
                bytes: png,
            },
            &config,
        );
        assert_eq!(ingestion.text, "\x0c");
        assert!(extraction_summary(&ingestion).contains("no text recognised"));
    }
}
