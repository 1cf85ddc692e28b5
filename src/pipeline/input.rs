//! Input resolution: turn a path, URL, or byte buffer into a local PDF file.
//!
//! pdfium opens documents from a file-system path, so every input shape is
//! normalised to one. URL downloads and in-memory buffers are written into a
//! `TempDir` owned by [`ResolvedInput`]; the directory is removed when the
//! value is dropped. The `%PDF` magic is checked up front so callers get
//! [`DeckError::NotAPdf`] instead of an opaque pdfium load failure.

use crate::error::DeckError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A PDF that is available on the local file system.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was downloaded or handed over as bytes; lives in `_temp_dir`.
    Staged { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Path of the PDF regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Staged { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a user-supplied path or URL.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, DeckError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DeckError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(trimmed) {
        download_url(trimmed, timeout_secs).await
    } else {
        resolve_local(Path::new(trimmed))
    }
}

/// Stage an in-memory PDF in a temp directory.
pub fn stage_bytes(bytes: &[u8]) -> Result<ResolvedInput, DeckError> {
    let path = PathBuf::from("report.pdf");
    check_magic(bytes, &path)?;
    stage(bytes, "report.pdf")
}

fn resolve_local(path: &Path) -> Result<ResolvedInput, DeckError> {
    let path = path.to_path_buf();
    if !path.is_file() {
        return Err(DeckError::FileNotFound { path });
    }

    let mut head = Vec::with_capacity(4);
    match std::fs::File::open(&path) {
        Ok(f) => {
            f.take(4)
                .read_to_end(&mut head)
                .map_err(|e| DeckError::Internal(format!("read {}: {e}", path.display())))?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DeckError::PermissionDenied { path });
        }
        Err(_) => return Err(DeckError::FileNotFound { path }),
    }
    check_magic(&head, &path)?;

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, DeckError> {
    info!("Downloading PDF from: {}", url);
    let failed = |reason: String| DeckError::DownloadFailed {
        url: url.to_string(),
        reason,
    };
    let timed_out_or = |e: reqwest::Error| {
        if e.is_timeout() {
            DeckError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(timed_out_or)?;
    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().await.map_err(timed_out_or)?;
    let filename = filename_from_url(url);
    check_magic(&bytes, Path::new(&filename))?;

    let staged = stage(&bytes, &filename)?;
    info!("Downloaded {} bytes to: {}", bytes.len(), staged.path().display());
    Ok(staged)
}

fn stage(bytes: &[u8], filename: &str) -> Result<ResolvedInput, DeckError> {
    let temp_dir = TempDir::new().map_err(|e| DeckError::Internal(format!("tempdir: {e}")))?;
    let path = temp_dir.path().join(filename);
    std::fs::write(&path, bytes)
        .map_err(|e| DeckError::Internal(format!("Failed to write temp file: {e}")))?;
    Ok(ResolvedInput::Staged {
        path,
        _temp_dir: temp_dir,
    })
}

/// Reject anything that does not start with `%PDF`.
///
/// Inputs shorter than four bytes are reported with zero-padded magic.
pub fn check_magic(head: &[u8], path: &Path) -> Result<(), DeckError> {
    if head.starts_with(PDF_MAGIC) {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = head.len().min(4);
    magic[..n].copy_from_slice(&head[..n]);
    Err(DeckError::NotAPdf {
        path: path.to_path_buf(),
        magic,
    })
}

/// Last path segment of the URL when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut s| s.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty() && last.contains('.'))
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/ar.pdf"));
        assert!(is_url("http://example.com/ar.pdf"));
        assert!(!is_url("/tmp/ar.pdf"));
        assert!(!is_url("ar.pdf"));
    }

    #[test]
    fn filename_comes_from_last_segment() {
        assert_eq!(
            filename_from_url("https://ir.example.com/reports/AR_2024.pdf?x=1"),
            "AR_2024.pdf"
        );
        assert_eq!(filename_from_url("https://example.com/download"), "downloaded.pdf");
        assert_eq!(filename_from_url("https://example.com/"), "downloaded.pdf");
    }

    #[test]
    fn magic_check_reports_short_inputs() {
        let err = check_magic(b"PK", Path::new("x.pptx")).unwrap_err();
        match err {
            DeckError::NotAPdf { magic, .. } => assert_eq!(magic, [b'P', b'K', 0, 0]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(check_magic(b"%PDF-1.7", Path::new("ok.pdf")).is_ok());
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let err = resolve_local(Path::new("/definitely/not/here.pdf")).err().unwrap();
        assert!(matches!(err, DeckError::FileNotFound { .. }));
    }

    #[test]
    fn local_non_pdf_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello world").unwrap();
        let err = resolve_local(f.path()).err().unwrap();
        assert!(matches!(err, DeckError::NotAPdf { .. }));
    }

    #[test]
    fn staged_bytes_live_until_drop() {
        let staged = stage_bytes(b"%PDF-1.4\n%%EOF").unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn blank_input_is_invalid() {
        let err = resolve_input("   ", 5).await.err().unwrap();
        assert!(matches!(err, DeckError::InvalidInput { .. }));
    }
}
