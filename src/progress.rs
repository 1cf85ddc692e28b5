//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn DeckProgressCallback>`] via
//! [`crate::config::DeckConfigBuilder::progress_callback`] to receive events
//! as the pipeline moves through ingestion, analysis, and rendering.
//!
//! Callers can forward events to a terminal spinner, a log, or a web socket
//! without the library knowing how the host application communicates.
//!
//! # Example
//!
//! ```rust
//! use edgequake_deckgen::{DeckConfig, DeckProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct StageLogger;
//!
//! impl DeckProgressCallback for StageLogger {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("{} …", stage.describe());
//!     }
//! }
//!
//! let config = DeckConfig::builder()
//!     .progress_callback(Arc::new(StageLogger) as Arc<dyn DeckProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The three sequential stages of deck generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Reading text out of the PDF.
    Ingest,
    /// Waiting on the model and parsing its reply.
    Analyse,
    /// Drawing the chart and assembling the slides.
    Render,
}

impl Stage {
    /// 1-based position in the pipeline.
    pub fn step(self) -> usize {
        match self {
            Stage::Ingest => 1,
            Stage::Analyse => 2,
            Stage::Render => 3,
        }
    }

    /// Human-readable status line.
    pub fn describe(self) -> &'static str {
        match self {
            Stage::Ingest => "Ingesting report pages",
            Stage::Analyse => "Extracting KPIs & insights",
            Stage::Render => "Rendering chart, tables & sidebar",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step {}: {}", self.step(), self.describe())
    }
}

/// Called by the pipeline as it progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync` because page
/// events are fired from the blocking thread that runs pdfium.
pub trait DeckProgressCallback: Send + Sync {
    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called after each page's text has been read.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — pages that will be read (after the page cap)
    /// * `chars`       — characters extracted from this page
    fn on_page_extracted(&self, page_num: usize, total_pages: usize, chars: usize) {
        let _ = (page_num, total_pages, chars);
    }

    /// Called when a page contributes no text because extraction failed.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: String) {
        let _ = (page_num, total_pages, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl DeckProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::DeckConfig`].
pub type ProgressCallback = Arc<dyn DeckProgressCallback>;
