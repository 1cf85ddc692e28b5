//! Text ingestion: read the leading pages of a PDF via pdfium.
//!
//! pdfium keeps thread-local state and blocks, so all document work runs on
//! Tokio's blocking pool through `spawn_blocking`.
//!
//! Extraction is best effort per page. A page whose text layer cannot be
//! read contributes an empty string and a [`PageError`]; only failures to
//! open the document at all are fatal.

use crate::config::DeckConfig;
use crate::error::{DeckError, PageError};
use crate::output::{DocumentMetadata, IngestReport};
use crate::progress::ProgressCallback;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Number of pages read from a document with `total_pages` pages.
pub fn pages_to_read(total_pages: usize, max_pages: usize) -> usize {
    total_pages.min(max_pages)
}

/// Concatenate per-page extraction results in page order.
///
/// `pages` yields `(page_index_0based, result)`; failed pages add nothing
/// to the text and are recorded in the report.
pub fn assemble_text<I>(
    pages: I,
    total_pages: usize,
    pages_read: usize,
    progress: Option<&ProgressCallback>,
) -> IngestReport
where
    I: IntoIterator<Item = (usize, Result<String, PageError>)>,
{
    let mut text = String::new();
    let mut page_errors = Vec::new();

    for (idx, result) in pages {
        let page_num = idx + 1;
        match result {
            Ok(page_text) => {
                if let Some(cb) = progress {
                    cb.on_page_extracted(page_num, pages_read, page_text.chars().count());
                }
                text.push_str(&page_text);
            }
            Err(e) => {
                warn!("{}", e);
                if let Some(cb) = progress {
                    cb.on_page_error(page_num, pages_read, e.to_string());
                }
                page_errors.push(e);
            }
        }
    }

    IngestReport {
        char_count: text.chars().count(),
        text,
        total_pages,
        pages_read,
        page_errors,
    }
}

/// Extract the text of the first `config.max_pages` pages of `pdf_path`.
pub async fn extract_text(pdf_path: &Path, config: &DeckConfig) -> Result<IngestReport, DeckError> {
    let path = pdf_path.to_path_buf();
    let password = config.password.clone();
    let lib_path = config.pdfium_lib_path.clone();
    let max_pages = config.max_pages;
    let progress = config.progress_callback.clone();

    tokio::task::spawn_blocking(move || {
        extract_text_blocking(
            &path,
            password.as_deref(),
            lib_path.as_deref(),
            max_pages,
            progress.as_ref(),
        )
    })
    .await
    .map_err(|e| DeckError::Internal(format!("Ingest task panicked: {}", e)))?
}

fn extract_text_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    lib_path: Option<&Path>,
    max_pages: usize,
    progress: Option<&ProgressCallback>,
) -> Result<IngestReport, DeckError> {
    let pdfium = bind_pdfium(lib_path)?;
    let document = open_document(&pdfium, pdf_path, password)?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    let pages_read = pages_to_read(total_pages, max_pages);
    info!("PDF loaded: {} pages, reading {}", total_pages, pages_read);

    let per_page = (0..pages_read).map(|idx| {
        let result = pages
            .get(idx as u16)
            .map_err(|e| PageError::LoadFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })
            .and_then(|page| {
                page.text()
                    .map(|t| t.all())
                    .map_err(|e| PageError::TextExtractionFailed {
                        page: idx + 1,
                        detail: format!("{:?}", e),
                    })
            });
        (idx, result)
    });

    let report = assemble_text(per_page, total_pages, pages_read, progress);
    debug!(
        "Extracted {} chars from {} pages ({} failed)",
        report.char_count,
        pages_read,
        report.page_errors.len()
    );
    Ok(report)
}

/// Read document metadata without extracting any text.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
    lib_path: Option<&Path>,
) -> Result<DocumentMetadata, DeckError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(str::to_string);
    let lib = lib_path.map(Path::to_path_buf);

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium(lib.as_deref())?;
        let document = open_document(&pdfium, &path, pwd.as_deref())?;
        Ok(read_metadata(&document))
    })
    .await
    .map_err(|e| DeckError::Internal(format!("Metadata task panicked: {}", e)))?
}

fn read_metadata(document: &PdfDocument<'_>) -> DocumentMetadata {
    let metadata = document.metadata();
    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata
            .get(tag)
            .map(|t| t.value().to_string())
            .filter(|v| !v.is_empty())
    };

    DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    }
}

fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, DeckError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let detail = format!("{:?}", e);
        if detail.to_lowercase().contains("password") {
            if password.is_some() {
                DeckError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                DeckError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            DeckError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail,
            }
        }
    })
}

/// Where to look for the pdfium shared library: the configured path, then
/// `PDFIUM_LIB_PATH`, then the system search path (`None`).
fn pdfium_location(configured: Option<&Path>) -> Option<PathBuf> {
    configured.map(Path::to_path_buf).or_else(|| {
        std::env::var_os("PDFIUM_LIB_PATH")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    })
}

fn bind_pdfium(configured: Option<&Path>) -> Result<Pdfium, DeckError> {
    let bindings = match pdfium_location(configured) {
        Some(p) if p.is_dir() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&p))
        }
        Some(p) => Pdfium::bind_to_library(&p),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| DeckError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::DeckProgressCallback;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn page_cap_is_min_of_count_and_limit() {
        assert_eq!(pages_to_read(120, 50), 50);
        assert_eq!(pages_to_read(12, 50), 12);
        assert_eq!(pages_to_read(0, 50), 0);
    }

    #[test]
    fn pages_concatenate_in_order_without_separator() {
        let pages = vec![
            (0, Ok("Chairman's letter. ".to_string())),
            (1, Ok("Revenue rose.".to_string())),
        ];
        let report = assemble_text(pages, 2, 2, None);
        assert_eq!(report.text, "Chairman's letter. Revenue rose.");
        assert_eq!(report.char_count, report.text.chars().count());
        assert!(report.page_errors.is_empty());
    }

    #[test]
    fn failed_page_contributes_nothing_and_is_recorded() {
        let pages = vec![
            (0, Ok("A".to_string())),
            (
                1,
                Err(PageError::TextExtractionFailed {
                    page: 2,
                    detail: "no text layer".into(),
                }),
            ),
            (2, Ok("C".to_string())),
        ];
        let report = assemble_text(pages, 80, 3, None);
        assert_eq!(report.text, "AC");
        assert_eq!(report.pages_read, 3);
        assert_eq!(report.total_pages, 80);
        assert_eq!(report.page_errors.len(), 1);
    }

    #[test]
    fn progress_sees_every_page() {
        struct Count(AtomicUsize, AtomicUsize);
        impl DeckProgressCallback for Count {
            fn on_page_extracted(&self, _p: usize, _t: usize, _c: usize) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
            fn on_page_error(&self, _p: usize, _t: usize, _e: String) {
                self.1.fetch_add(1, Ordering::SeqCst);
            }
        }

        let count = Arc::new(Count(AtomicUsize::new(0), AtomicUsize::new(0)));
        let cb: ProgressCallback = Arc::clone(&count) as Arc<dyn DeckProgressCallback>;
        let pages = vec![
            (0, Ok(String::new())),
            (1, Err(PageError::LoadFailed { page: 2, detail: "x".into() })),
        ];
        assemble_text(pages, 2, 2, Some(&cb));
        assert_eq!(count.0.load(Ordering::SeqCst), 1);
        assert_eq!(count.1.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn configured_pdfium_path_wins() {
        let p = pdfium_location(Some(Path::new("/opt/pdfium/lib")));
        assert_eq!(p, Some(PathBuf::from("/opt/pdfium/lib")));
    }
}
