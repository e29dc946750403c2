//! Input resolution: turn a user-supplied path or URL into an [`Upload`].
//!
//! An upload is bytes plus a *declared* MIME type, exactly what a browser
//! file widget hands over. The declared type decides dispatch; the bytes are
//! not sniffed here. Resolution order for the type:
//!
//! 1. an explicit override (`--mime`)
//! 2. the `Content-Type` response header, for URLs
//! 3. a guess from the file name extension
//! 4. `application/octet-stream`, which later becomes `UnsupportedType`

use crate::error::FigqaError;
use std::path::Path;
use tracing::{debug, info};

const OCTET_STREAM: &str = "application/octet-stream";

/// Bytes plus the declared MIME type and a display name.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Guess a MIME type from a file name.
pub fn guess_mime(name: &str) -> String {
    mime_guess::from_path(name)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

/// Resolve the input string to an [`Upload`].
pub async fn resolve_upload(
    input: &str,
    declared_mime: Option<&str>,
    timeout_secs: u64,
) -> Result<Upload, FigqaError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(FigqaError::InvalidInput {
            input: input.to_string(),
        });
    }

    let mut upload = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(Path::new(input)).await?
    };

    if let Some(mime) = declared_mime {
        upload.mime = mime.to_string();
    }
    debug!("Resolved upload '{}' as {}", upload.name, upload.mime);
    Ok(upload)
}

/// Read a local file; the MIME type is guessed from its extension.
async fn read_local(path: &Path) -> Result<Upload, FigqaError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => FigqaError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => FigqaError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(Upload {
        mime: guess_mime(&name),
        name,
        bytes,
    })
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<Upload, FigqaError> {
    info!("Downloading upload from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| FigqaError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            FigqaError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            FigqaError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(FigqaError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let name = extract_filename(url);
    let header_mime = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or_default().trim().to_string())
        .filter(|v| !v.is_empty() && v != OCTET_STREAM);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| FigqaError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());

    Ok(Upload {
        mime: header_mime.unwrap_or_else(|| guess_mime(&name)),
        name,
        bytes: bytes.to_vec(),
    })
}

/// Extract a reasonable filename from the URL path.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "download".to_string()
}
