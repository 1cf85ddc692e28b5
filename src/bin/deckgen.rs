//! CLI binary for edgequake-deckgen.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `DeckConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_deckgen::{
    generate_deck, inspect_with, render_analysis, write_deck, AnalysisResult, DeckConfig,
    DeckOutput, DeckProgressCallback, ProgressCallback, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Terminal progress: one spinner whose prefix follows the pipeline stage,
/// with a log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
    page_errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_errors: AtomicUsize::new(0),
        })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl DeckProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_prefix(format!("Step {}/3", stage.step()));
        self.bar.set_message(format!("{}…", stage.describe()));
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let detail = match stage {
            Stage::Ingest => {
                let failed = self.page_errors.load(Ordering::SeqCst);
                if failed == 0 {
                    String::new()
                } else {
                    format!("  ({failed} pages without text)")
                }
            }
            _ => String::new(),
        };
        self.bar.println(format!(
            "  {} {:<36} {}{}",
            green("✓"),
            stage.describe(),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
            detail,
        ));
    }

    fn on_page_extracted(&self, page_num: usize, total_pages: usize, _chars: usize) {
        self.bar.set_message(format!("page {page_num}/{total_pages}"));
    }

    fn on_page_error(&self, page_num: usize, _total_pages: usize, error: String) {
        self.page_errors.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error
        };
        self.bar
            .println(format!("  {} Page {:>3}  {}", red("✗"), page_num, red(&msg)));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate <Company>_Strategy_Deck.pptx in the current directory
  deckgen annual_report_2024.pdf

  # Choose the output file and model
  deckgen --provider openai --model gpt-4.1 report.pdf -o decks/acme.pptx

  # Report straight from the investor-relations site
  deckgen https://example.com/ir/annual-report-2024.pdf

  # Keep the model's analysis, then re-render later without another API call
  deckgen report.pdf --save-analysis acme.json
  deckgen --from-analysis acme.json -o acme.pptx

  # Inspect PDF metadata (no API key needed)
  deckgen --inspect-only report.pdf

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Directory or file of the pdfium shared library

SETUP:
  1. Install libpdfium (https://github.com/bblanchon/pdfium-binaries)
  2. Set API key:     export GEMINI_API_KEY=...
  3. Generate:        deckgen annual_report.pdf
"#;

/// Turn PDF annual reports into four-slide strategy decks using LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "deckgen",
    version,
    about = "Turn PDF annual reports into four-slide strategy decks using LLMs",
    long_about = "Read the first pages of an annual report, have an LLM extract the company's \
KPIs, multi-year financials, highlights and risks, and render a dense PowerPoint deck: title, \
executive summary with KPI sidebar, financial chart and table, and a risk matrix.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    #[arg(required_unless_present = "from_analysis")]
    input: Option<String>,

    /// Output .pptx file, or a directory for the suggested file name.
    #[arg(short, long, env = "DECKGEN_OUTPUT", default_value = ".")]
    output: PathBuf,

    /// LLM model ID (e.g. gemini-flash-latest, gpt-4.1-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set \
          (Gemini first when GEMINI_API_KEY or GOOGLE_API_KEY is present)."
    )]
    provider: Option<String>,

    /// Number of leading pages whose text is analysed.
    #[arg(long, env = "DECKGEN_MAX_PAGES", default_value_t = 50)]
    max_pages: usize,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "DECKGEN_PASSWORD")]
    password: Option<String>,

    /// Text file with a custom analyst prompt; `{text}` marks where the
    /// report text goes.
    #[arg(long, env = "DECKGEN_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "DECKGEN_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "DECKGEN_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// LLM call timeout in seconds.
    #[arg(long, env = "DECKGEN_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "DECKGEN_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Directory or file of the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Also write the model's analysis as JSON to this file.
    #[arg(long)]
    save_analysis: Option<PathBuf>,

    /// Render from a saved analysis JSON instead of a PDF (no API call).
    #[arg(long, conflicts_with_all = ["inspect_only", "save_analysis"])]
    from_analysis: Option<PathBuf>,

    /// Print PDF metadata only, no deck.
    #[arg(long)]
    inspect_only: bool,

    /// Print analysis and stats as JSON on stdout.
    #[arg(long, env = "DECKGEN_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "DECKGEN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DECKGEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DECKGEN_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs are hidden while the spinner is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Re-render mode ───────────────────────────────────────────────────
    if let Some(ref path) = cli.from_analysis {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read analysis from {:?}", path))?;
        let analysis: AnalysisResult = serde_json::from_str(&raw)
            .with_context(|| format!("{:?} is not an analysis JSON object", path))?;
        let output = render_analysis(&analysis).context("Deck rendering failed")?;
        let written = write_deck(&output, &cli.output)
            .await
            .context("Failed to write deck")?;
        report(&cli, &output, &written)?;
        return Ok(());
    }

    let Some(ref input) = cli.input else {
        anyhow::bail!("An input PDF path or URL is required");
    };

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(&cli, None).await?;
        let meta = inspect_with(input, &config)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
            if let Some(ref d) = meta.creation_date {
                println!("Created:      {}", d);
            }
        }
        return Ok(());
    }

    // ── Generate ─────────────────────────────────────────────────────────
    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(
        &cli,
        progress
            .as_ref()
            .map(|p| Arc::clone(p) as Arc<dyn DeckProgressCallback>),
    )
    .await?;

    let result = generate_deck(input, &config).await;
    if let Some(ref p) = progress {
        p.finish();
    }
    let output = result.context("Deck generation failed")?;

    let written = write_deck(&output, &cli.output)
        .await
        .context("Failed to write deck")?;

    if let Some(ref path) = cli.save_analysis {
        let json = serde_json::to_string_pretty(&output.analysis)
            .context("Failed to serialise analysis")?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write analysis to {:?}", path))?;
    }

    report(&cli, &output, &written)
}

/// Print the result: JSON on stdout, or a short summary on stderr.
fn report(cli: &Cli, output: &DeckOutput, written: &Path) -> Result<()> {
    if cli.json {
        let doc = serde_json::json!({
            "file": written,
            "file_name": output.file_name,
            "analysis": output.analysis,
            "stats": output.stats,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&doc).context("Failed to serialise output")?
        );
        return Ok(());
    }
    if cli.quiet {
        return Ok(());
    }

    let stats = &output.stats;
    eprintln!(
        "{}  {}  →  {}",
        green("✔"),
        output.analysis.company_name(),
        bold(&written.display().to_string()),
    );
    if stats.pages_read > 0 {
        eprintln!(
            "   {}/{} pages read{}  ·  {} tokens in  /  {} tokens out  ·  {}ms total",
            stats.pages_read,
            stats.total_pages,
            if stats.failed_pages > 0 {
                cyan(&format!(" ({} without text)", stats.failed_pages))
            } else {
                String::new()
            },
            dim(&stats.input_tokens.to_string()),
            dim(&stats.output_tokens.to_string()),
            stats.total_ms,
        );
    }
    Ok(())
}

/// Map CLI args to `DeckConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<DeckConfig> {
    let mut builder = DeckConfig::builder()
        .max_pages(cli.max_pages)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref path) = cli.prompt_file {
        let template = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.prompt_template(template);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password);
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(lib);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
