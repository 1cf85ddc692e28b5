//! Error types for the edgequake-deckgen library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`DeckError`] — **Fatal**: the deck cannot be produced at all (bad
//!   input file, PDF engine missing, model reply unusable). Returned as
//!   `Err(DeckError)` from every `generate*` entry point.
//!
//! * [`AnalysisError`] — the single category for everything that can go
//!   wrong around the model call. It always reaches callers wrapped in
//!   [`DeckError::Analysis`], so a UI can show one "AI error" message while
//!   logs still carry the precise cause.
//!
//! * [`PageError`] — **Non-fatal**: text extraction failed for one page.
//!   The page contributes no text and ingestion carries on; the error is
//!   kept in [`crate::output::IngestReport`] for inspection.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-deckgen library.
#[derive(Debug, Error)]
pub enum DeckError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium for your platform (https://github.com/bblanchon/pdfium-binaries)\n\
and either put it on the system library path or point to it with\n\
PDFIUM_LIB_PATH=/path/to/libpdfium (or --pdfium-lib).\n"
    )]
    PdfiumBindingFailed(String),

    // ── Model errors ──────────────────────────────────────────────────────
    /// The model call failed or its reply could not be used.
    #[error("AI analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    // ── Rendering errors ──────────────────────────────────────────────────
    /// The financial chart could not be encoded.
    #[error("Chart rendering failed: {0}")]
    ChartRenderFailed(String),

    /// The presentation package could not be assembled.
    #[error("Deck assembly failed: {0}")]
    DeckWriteFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why the insight extraction round-trip failed.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    /// No model provider could be created (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The provider returned an error (network, quota, auth, 5xx…).
    #[error("LLM service error from '{provider}': {message}")]
    Service { provider: String, message: String },

    /// The call did not finish within the configured timeout.
    #[error("LLM call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The reply was not the JSON object the prompt asked for.
    #[error("model reply is not valid JSON ({detail}). Reply starts with: {excerpt:?}")]
    MalformedReply { detail: String, excerpt: String },
}

/// A non-fatal error for a single page during text ingestion.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The page could not be loaded from the document.
    #[error("Page {page}: could not be loaded: {detail}")]
    LoadFailed { page: usize, detail: String },

    /// The page loaded but its text layer could not be read.
    #[error("Page {page}: text extraction failed: {detail}")]
    TextExtractionFailed { page: usize, detail: String },
}
