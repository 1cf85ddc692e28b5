//! End-to-end integration tests for edgequake-deckgen.
//!
//! These tests read real PDF annual reports from `./test_cases/` through
//! pdfium, and the `live_` tests also make a real LLM API call. They are
//! gated behind the `E2E_ENABLED` environment variable so they do not run in
//! CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test e2e -- --nocapture
//!
//! Point `DECKGEN_E2E_PDF` at a different report to override the default
//! `test_cases/annual_report.pdf`.

use edgequake_deckgen::{
    generate_deck, generate_deck_from_bytes, inspect, write_deck, AnalysisError, Completion,
    DeckConfig, DeckError, DeckProgressCallback, InsightBackend, NoopProgressCallback, Stage,
};
use futures::future::BoxFuture;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

fn report_path() -> PathBuf {
    std::env::var("DECKGEN_E2E_PDF")
        .map(PathBuf::from)
        .unwrap_or_else(|_| test_cases_dir().join("annual_report.pdf"))
}

fn output_dir() -> PathBuf {
    let d = test_cases_dir().join("output");
    std::fs::create_dir_all(&d).ok();
    d
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            println!("       Set DECKGEN_E2E_PDF or copy a report to test_cases/");
            return;
        }
        p
    }};
}

/// Replies with a fixed analysis and records the prompt it was given.
struct RecordingBackend {
    reply: String,
    prompt: Mutex<String>,
}

impl RecordingBackend {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompt: Mutex::new(String::new()),
        })
    }
}

impl InsightBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<Completion, AnalysisError>> {
        *self.prompt.lock().unwrap() = prompt.to_string();
        let text = self.reply.clone();
        Box::pin(async move {
            Ok(Completion {
                text,
                input_tokens: 0,
                output_tokens: 0,
            })
        })
    }
}

const CANNED_REPLY: &str = r#"{
    "company_name": "E2E Holdings",
    "current_fy": "2024",
    "financials": [
        {"year": "2024", "revenue": 1200, "net_profit": 150},
        {"year": "2023", "revenue": 1000, "net_profit": 90}
    ],
    "risks": [{"type": "Market", "risk": "Demand slowdown", "mitigation": "Diversified portfolio"}]
}"#;

// ── Inspect tests (no LLM) ───────────────────────────────────────────────────

#[tokio::test]
async fn test_inspect_annual_report() {
    let path = e2e_skip_unless_ready!(report_path());

    let meta = inspect(path.to_str().unwrap())
        .await
        .expect("inspect() should succeed");

    assert!(meta.page_count > 0);
    assert!(!meta.pdf_version.is_empty());
    println!("Metadata: {:?}", meta);
}

#[tokio::test]
async fn test_inspect_nonexistent() {
    let err = inspect("/definitely/not/a/real/report.pdf")
        .await
        .unwrap_err();
    assert!(matches!(err, DeckError::FileNotFound { .. }), "got: {err}");
}

#[tokio::test]
async fn test_not_a_pdf_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let fake = dir.path().join("report.pdf");
    std::fs::write(&fake, b"PK\x03\x04 this is a zip").unwrap();

    let err = generate_deck(fake.to_str().unwrap(), &DeckConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DeckError::NotAPdf { .. }), "got: {err}");
}

// ── Full pipeline with a canned model (pdfium, no network) ───────────────────

#[tokio::test]
async fn test_generate_with_canned_model() {
    let path = e2e_skip_unless_ready!(report_path());

    let backend = RecordingBackend::new(CANNED_REPLY);
    let config = DeckConfig::builder()
        .backend(Arc::clone(&backend) as Arc<dyn InsightBackend>)
        .build()
        .unwrap();

    let deck = generate_deck(path.to_str().unwrap(), &config)
        .await
        .expect("generate_deck() should succeed");

    assert_eq!(deck.file_name, "E2E_Holdings_Strategy_Deck.pptx");
    assert!(deck.bytes.starts_with(b"PK"));
    assert!(deck.stats.pages_read >= 1 && deck.stats.pages_read <= 50);
    assert_eq!(deck.stats.deck_bytes, deck.bytes.len());

    let prompt = backend.prompt.lock().unwrap().clone();
    assert!(
        prompt.contains("company_name"),
        "prompt should carry the JSON schema"
    );

    let written = write_deck(&deck, output_dir()).await.unwrap();
    println!("Wrote {} ({:?})", written.display(), deck.stats);
}

#[tokio::test]
async fn test_page_cap_is_honoured() {
    let path = e2e_skip_unless_ready!(report_path());

    let config = DeckConfig::builder()
        .backend(RecordingBackend::new("{}") as Arc<dyn InsightBackend>)
        .max_pages(1)
        .build()
        .unwrap();

    let deck = generate_deck(path.to_str().unwrap(), &config).await.unwrap();
    assert_eq!(deck.stats.pages_read, 1);
    assert_eq!(deck.file_name, "Strategy_Strategy_Deck.pptx");
}

#[tokio::test]
async fn test_generate_from_bytes() {
    let path = e2e_skip_unless_ready!(report_path());
    let bytes = std::fs::read(&path).unwrap();

    let config = DeckConfig::builder()
        .backend(RecordingBackend::new(CANNED_REPLY) as Arc<dyn InsightBackend>)
        .max_pages(3)
        .build()
        .unwrap();

    let deck = generate_deck_from_bytes(&bytes, &config).await.unwrap();
    assert_eq!(deck.analysis.company_name(), "E2E Holdings");
    assert!(deck.stats.pages_read <= 3);
}

#[tokio::test]
async fn test_pipeline_progress_callbacks() {
    let path = e2e_skip_unless_ready!(report_path());

    #[derive(Default)]
    struct Tracker {
        stages: Mutex<Vec<Stage>>,
        pages: AtomicUsize,
    }

    impl DeckProgressCallback for Tracker {
        fn on_stage_complete(&self, stage: Stage, _elapsed_ms: u64) {
            self.stages.lock().unwrap().push(stage);
        }
        fn on_page_extracted(&self, _page: usize, _total: usize, _chars: usize) {
            self.pages.fetch_add(1, Ordering::SeqCst);
        }
        fn on_page_error(&self, _page: usize, _total: usize, _error: String) {
            self.pages.fetch_add(1, Ordering::SeqCst);
        }
    }

    let tracker = Arc::new(Tracker::default());
    let config = DeckConfig::builder()
        .backend(RecordingBackend::new(CANNED_REPLY) as Arc<dyn InsightBackend>)
        .max_pages(2)
        .progress_callback(Arc::clone(&tracker) as Arc<dyn DeckProgressCallback>)
        .build()
        .unwrap();

    let deck = generate_deck(path.to_str().unwrap(), &config).await.unwrap();

    assert_eq!(
        *tracker.stages.lock().unwrap(),
        vec![Stage::Ingest, Stage::Analyse, Stage::Render]
    );
    assert_eq!(tracker.pages.load(Ordering::SeqCst), deck.stats.pages_read);
}

// ── Live model call ──────────────────────────────────────────────────────────

#[tokio::test]
async fn live_generate_annual_report() {
    let path = e2e_skip_unless_ready!(report_path());
    if std::env::var("GEMINI_API_KEY").is_err()
        && std::env::var("GOOGLE_API_KEY").is_err()
        && std::env::var("OPENAI_API_KEY").is_err()
        && std::env::var("ANTHROPIC_API_KEY").is_err()
    {
        println!("SKIP — no LLM API key in the environment");
        return;
    }

    let deck = generate_deck(path.to_str().unwrap(), &DeckConfig::default())
        .await
        .expect("live generation should succeed");

    assert!(deck.file_name.ends_with("_Strategy_Deck.pptx"));
    assert!(deck.stats.output_tokens > 0);
    let written = write_deck(&deck, output_dir()).await.unwrap();
    println!(
        "Wrote {} — {} financial years, {} risks",
        written.display(),
        deck.analysis.financials.len(),
        deck.analysis.risks.len()
    );
}

// ── Callback plumbing ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_callback_send_in_tokio_spawn() {
    struct Counter(AtomicUsize);
    impl DeckProgressCallback for Counter {
        fn on_page_error(&self, _page: usize, _total: usize, _error: String) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let cb: Arc<dyn DeckProgressCallback> = Arc::new(Counter(AtomicUsize::new(0)));
    let cb2 = Arc::clone(&cb);
    tokio::spawn(async move { cb2.on_page_error(3, 10, "boom".into()) })
        .await
        .unwrap();
}

#[test]
fn test_noop_callback_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<NoopProgressCallback>();
    assert_send_sync::<Arc<dyn DeckProgressCallback>>();
}
