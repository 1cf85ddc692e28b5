//! # edgequake-deckgen
//!
//! Turn a PDF annual report into a dense four-slide strategy deck (`.pptx`)
//! using a hosted LLM as the analyst.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Ingest   text of the first 50 pages via pdfium (spawn_blocking)
//!  ├─ 2. Analyse  one prompt → one JSON reply (gemini / gpt-4.1 / claude / …)
//!  ├─ 3. Chart    revenue & net profit per year → 800×500 PNG
//!  └─ 4. Render   title, executive summary + KPI sidebar,
//!                 financials (chart, table, commentary), risk matrix
//! ```
//!
//! Every field of the model's reply is optional. A missing company name,
//! KPI, or risk mitigation renders as a fixed placeholder, never as an
//! error.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_deckgen::{generate_deck_to_file, DeckConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / ANTHROPIC_API_KEY
//!     let config = DeckConfig::default();
//!     let (path, deck) = generate_deck_to_file("annual_report.pdf", ".", &config).await?;
//!     println!("{} ({} slides)", path.display(), edgequake_deckgen::deck::SLIDE_COUNT);
//!     eprintln!("tokens: {} in / {} out", deck.stats.input_tokens, deck.stats.output_tokens);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `deckgen` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-deckgen = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod deck;
pub mod error;
pub mod generate;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{DeckConfig, DeckConfigBuilder};
pub use deck::DECK_MIME;
pub use error::{AnalysisError, DeckError, PageError};
pub use generate::{
    analyse_text, generate_deck, generate_deck_from_bytes, generate_deck_sync,
    generate_deck_to_file, inspect, inspect_with, render_analysis, write_deck,
};
pub use model::{AnalysisResult, FinancialYear, Figure, Kpis, RiskEntry};
pub use output::{DeckOutput, DeckStats, DocumentMetadata, IngestReport};
pub use pipeline::chart::BarChart;
pub use pipeline::llm::{Completion, InsightBackend, Insights, ProviderBackend};
pub use progress::{DeckProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
