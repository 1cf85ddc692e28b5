//! Pipeline stages for report-to-deck generation.
//!
//! Each submodule implements one step. The deck layout itself lives in
//! [`crate::deck`]; everything here produces its inputs.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ ingest ──▶ llm ──▶ reply ──▶ chart
//! (URL/path) (pdfium)  (prompt) (JSON)    (PNG)
//! ```
//!
//! 1. [`input`]  — canonicalise the path, URL, or byte buffer to a local file
//! 2. [`ingest`] — read page text; runs in `spawn_blocking` because pdfium
//!    is not async-safe
//! 3. [`llm`]    — the single model call, behind [`llm::InsightBackend`]
//! 4. [`reply`]  — strip code fences and decode the JSON analysis
//! 5. [`chart`]  — grouped revenue / net-profit bars, drawn with [`glyphs`]

pub mod chart;
pub mod glyphs;
pub mod ingest;
pub mod input;
pub mod llm;
pub mod reply;
