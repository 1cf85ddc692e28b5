//! Result types returned by the deck pipeline.

use crate::error::PageError;
use crate::model::AnalysisResult;
use serde::{Deserialize, Serialize};

/// Text extracted from the leading pages of a report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    /// Concatenated page text, in page order, no separators.
    pub text: String,
    /// Characters in `text`.
    pub char_count: usize,
    /// Pages in the document.
    pub total_pages: usize,
    /// Pages actually read (after the page cap).
    pub pages_read: usize,
    /// Pages that contributed no text.
    pub page_errors: Vec<PageError>,
}

/// A generated deck plus everything that went into it.
#[derive(Debug, Clone)]
pub struct DeckOutput {
    /// The `.pptx` file contents.
    pub bytes: Vec<u8>,
    /// Suggested file name, e.g. `Tata_Motors_Strategy_Deck.pptx`.
    pub file_name: String,
    /// The analysis the deck was rendered from.
    pub analysis: AnalysisResult,
    /// The chart embedded in slide 3, as PNG.
    pub chart_png: Vec<u8>,
    pub stats: DeckStats,
}

/// Timing and size counters for one run.
///
/// Fields that belong to stages that did not run (e.g. ingestion when
/// rendering a saved analysis) stay zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckStats {
    pub total_pages: usize,
    pub pages_read: usize,
    pub failed_pages: usize,
    pub text_chars: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub ingest_ms: u64,
    pub analysis_ms: u64,
    pub render_ms: u64,
    pub total_ms: u64,
    pub deck_bytes: usize,
}

/// Document-level metadata, read without extracting text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}
