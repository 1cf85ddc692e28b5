//! Deck generation entry points.
//!
//! Every entry point runs some suffix of the same pipeline:
//!
//! ```text
//! resolve input ─▶ ingest text ─▶ analyse ─▶ chart ─▶ slides ─▶ .pptx bytes
//!   (path/URL)      (pdfium)      (LLM)     (PNG)    (XML)      (zip)
//! ```
//!
//! [`generate_deck`] runs all of it, [`analyse_text`] stops after the model
//! call, and [`render_analysis`] starts from an existing analysis without any
//! network access.

use crate::config::DeckConfig;
use crate::deck;
use crate::error::DeckError;
use crate::model::AnalysisResult;
use crate::output::{DeckOutput, DeckStats, DocumentMetadata};
use crate::pipeline::llm::{self, Insights};
use crate::pipeline::{chart, ingest, input};
use crate::progress::Stage;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Turn a PDF annual report (path or URL) into a strategy deck.
///
/// # Errors
/// Returns `Err(DeckError)` when the input cannot be read as a PDF, when the
/// model call or its reply fails ([`DeckError::Analysis`]), or when the deck
/// cannot be assembled. Pages whose text cannot be read are skipped, not
/// fatal.
///
/// # Example
/// ```rust,no_run
/// use edgequake_deckgen::{generate_deck, DeckConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = DeckConfig::builder().provider_name("gemini").build()?;
/// let deck = generate_deck("annual_report_2024.pdf", &config).await?;
/// std::fs::write(&deck.file_name, &deck.bytes)?;
/// # Ok(())
/// # }
/// ```
pub async fn generate_deck(
    input_str: impl AsRef<str>,
    config: &DeckConfig,
) -> Result<DeckOutput, DeckError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Generating deck from: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    run_pipeline(resolved.path(), config, total_start).await
}

/// Same as [`generate_deck`] for a PDF held in memory.
///
/// The bytes are staged in a temp directory that is removed on return.
pub async fn generate_deck_from_bytes(
    bytes: &[u8],
    config: &DeckConfig,
) -> Result<DeckOutput, DeckError> {
    let total_start = Instant::now();
    let staged = input::stage_bytes(bytes)?;
    run_pipeline(staged.path(), config, total_start).await
}

/// Generate a deck and write it to `output_path`.
///
/// If `output_path` is an existing directory the suggested file name is
/// appended. Returns the path written and the full output.
pub async fn generate_deck_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &DeckConfig,
) -> Result<(PathBuf, DeckOutput), DeckError> {
    let output = generate_deck(input_str, config).await?;
    let path = write_deck(&output, output_path).await?;
    Ok((path, output))
}

/// Synchronous wrapper around [`generate_deck`].
///
/// Creates a temporary tokio runtime internally; do not call from inside an
/// async context.
pub fn generate_deck_sync(
    input_str: impl AsRef<str>,
    config: &DeckConfig,
) -> Result<DeckOutput, DeckError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DeckError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_deck(input_str, config))
}

/// Run only the model stage over already-extracted text.
pub async fn analyse_text(text: &str, config: &DeckConfig) -> Result<Insights, DeckError> {
    with_stage(config, Stage::Analyse, llm::extract_insights(text, config)).await
}

/// Render a deck from an existing analysis. No PDF engine or network needed.
pub fn render_analysis(analysis: &AnalysisResult) -> Result<DeckOutput, DeckError> {
    let start = Instant::now();
    let (chart_png, bytes) = render_stage(analysis)?;
    let render_ms = start.elapsed().as_millis() as u64;

    Ok(DeckOutput {
        file_name: analysis.deck_file_name(),
        stats: DeckStats {
            render_ms,
            total_ms: render_ms,
            deck_bytes: bytes.len(),
            ..Default::default()
        },
        analysis: analysis.clone(),
        chart_png,
        bytes,
    })
}

/// Read PDF metadata without extracting text. No API key required.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, DeckError> {
    inspect_with(input_str, &DeckConfig::default()).await
}

/// [`inspect`] honouring the password, pdfium path, and download timeout in
/// `config`.
pub async fn inspect_with(
    input_str: impl AsRef<str>,
    config: &DeckConfig,
) -> Result<DocumentMetadata, DeckError> {
    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    ingest::extract_metadata(
        resolved.path(),
        config.password.as_deref(),
        config.pdfium_lib_path.as_deref(),
    )
    .await
}

/// Write deck bytes atomically (temp file + rename).
///
/// A directory `path` gets [`DeckOutput::file_name`] appended, with path
/// separators in the name replaced by `_`.
pub async fn write_deck(output: &DeckOutput, path: impl AsRef<Path>) -> Result<PathBuf, DeckError> {
    let requested = path.as_ref();
    let target = if requested.is_dir() {
        requested.join(output.file_name.replace(['/', '\\'], "_"))
    } else {
        requested.to_path_buf()
    };
    let write_err = |e: std::io::Error| DeckError::OutputWriteFailed {
        path: target.clone(),
        source: e,
    };

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = target.with_extension("pptx.tmp");
    tokio::fs::write(&tmp_path, &output.bytes)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, &target)
        .await
        .map_err(write_err)?;

    info!("Deck written: {} ({} bytes)", target.display(), output.bytes.len());
    Ok(target)
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run_pipeline(
    pdf_path: &Path,
    config: &DeckConfig,
    total_start: Instant,
) -> Result<DeckOutput, DeckError> {
    // ── Stage 1: Ingest ──────────────────────────────────────────────────
    let ingest_start = Instant::now();
    let report = with_stage(config, Stage::Ingest, ingest::extract_text(pdf_path, config)).await?;
    let ingest_ms = ingest_start.elapsed().as_millis() as u64;
    if report.text.trim().is_empty() {
        warn!(
            "No text extracted from {} pages; the report may be scanned images",
            report.pages_read
        );
    }

    // ── Stage 2: Analyse ─────────────────────────────────────────────────
    let insights = analyse_text(&report.text, config).await?;

    // ── Stage 3: Render ──────────────────────────────────────────────────
    let render_start = Instant::now();
    let (chart_png, bytes) = with_stage(config, Stage::Render, async {
        render_stage(&insights.analysis)
    })
    .await?;
    let render_ms = render_start.elapsed().as_millis() as u64;

    let stats = DeckStats {
        total_pages: report.total_pages,
        pages_read: report.pages_read,
        failed_pages: report.page_errors.len(),
        text_chars: report.char_count,
        input_tokens: insights.input_tokens,
        output_tokens: insights.output_tokens,
        ingest_ms,
        analysis_ms: insights.duration_ms,
        render_ms,
        total_ms: total_start.elapsed().as_millis() as u64,
        deck_bytes: bytes.len(),
    };
    info!(
        "Deck complete: {} ({} pages read, {}ms total)",
        insights.analysis.deck_file_name(),
        stats.pages_read,
        stats.total_ms
    );

    Ok(DeckOutput {
        file_name: insights.analysis.deck_file_name(),
        analysis: insights.analysis,
        chart_png,
        bytes,
        stats,
    })
}

fn render_stage(analysis: &AnalysisResult) -> Result<(Vec<u8>, Vec<u8>), DeckError> {
    let chart_png = chart::render_financials_png(&analysis.financials)?;
    let bytes = deck::render_deck(analysis, &chart_png)?;
    Ok((chart_png, bytes))
}

/// Await `fut` between stage start/complete callbacks. Completion is only
/// reported on success.
async fn with_stage<T, F>(config: &DeckConfig, stage: Stage, fut: F) -> Result<T, DeckError>
where
    F: std::future::Future<Output = Result<T, DeckError>>,
{
    info!("{}", stage);
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
    let start = Instant::now();
    let value = fut.await?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(stage, start.elapsed().as_millis() as u64);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_analysis_names_file_after_company() {
        let analysis: AnalysisResult =
            serde_json::from_str(r#"{"company_name": "Tata Motors Ltd"}"#).unwrap();
        let out = render_analysis(&analysis).unwrap();
        assert_eq!(out.file_name, "Tata_Motors_Ltd_Strategy_Deck.pptx");
        assert_eq!(out.stats.deck_bytes, out.bytes.len());
        assert!(out.bytes.starts_with(b"PK"));
        assert!(out.chart_png.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[tokio::test]
    async fn write_deck_into_directory_uses_suggested_name() {
        let dir = tempfile::tempdir().unwrap();
        let out = render_analysis(&AnalysisResult::default()).unwrap();
        let path = write_deck(&out, dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join("Strategy_Strategy_Deck.pptx"));
        assert_eq!(std::fs::read(&path).unwrap(), out.bytes);
        assert!(!dir.path().join("Strategy_Strategy_Deck.pptx.tmp").exists());
    }

    #[tokio::test]
    async fn write_deck_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let out = render_analysis(&AnalysisResult::default()).unwrap();
        let target = dir.path().join("nested/decks/q4.pptx");
        let path = write_deck(&out, &target).await.unwrap();
        assert_eq!(path, target);
        assert!(target.exists());
    }

    #[tokio::test]
    async fn bytes_that_are_not_pdf_are_rejected_before_any_model_call() {
        let err = generate_deck_from_bytes(b"<html>", &DeckConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DeckError::NotAPdf { .. }));
    }
}
