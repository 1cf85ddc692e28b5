//! Configuration types for deck generation.
//!
//! Everything the pipeline needs is carried in one [`DeckConfig`] value,
//! built via [`DeckConfigBuilder`] and passed explicitly to every entry
//! point. Nothing is read from process-wide state except provider API keys,
//! which the LLM provider factory takes from the environment.

use crate::error::DeckError;
use crate::pipeline::llm::InsightBackend;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Model used when the Gemini provider is selected without an explicit model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-flash-latest";
/// Model used when the OpenAI provider is selected without an explicit model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1-mini";
/// Model used when the Anthropic provider is selected without an explicit model.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
/// Model used when the Ollama provider is selected without an explicit model.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";

/// Default model for a named provider.
pub fn default_model_for(provider: &str) -> &'static str {
    match provider {
        "openai" | "azure" => DEFAULT_OPENAI_MODEL,
        "anthropic" => DEFAULT_ANTHROPIC_MODEL,
        "ollama" | "lmstudio" => DEFAULT_OLLAMA_MODEL,
        _ => DEFAULT_GEMINI_MODEL,
    }
}

/// Configuration for one report-to-deck run.
///
/// Built via [`DeckConfig::builder()`] or using [`DeckConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_deckgen::DeckConfig;
///
/// let config = DeckConfig::builder()
///     .max_pages(30)
///     .provider_name("gemini")
///     .model("gemini-2.0-flash")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct DeckConfig {
    /// Maximum number of leading pages whose text is sent to the model. Default: 50.
    ///
    /// Annual reports put the letter to shareholders, highlights, and the
    /// five-year summary up front; the notes to accounts that follow add
    /// tokens without adding headline numbers.
    pub max_pages: usize,

    /// LLM model identifier, e.g. "gemini-flash-latest", "gpt-4.1-mini".
    /// If None, the provider's default from [`default_model_for`] is used.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed insight backend. Takes precedence over everything
    /// else; used to plug in a fake in tests or custom middleware.
    pub backend: Option<Arc<dyn InsightBackend>>,

    /// Sampling temperature for the analysis call. Default: 0.2.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 8192.
    ///
    /// The full schema with four highlights, three insights, and three risks
    /// runs to roughly 1 500 tokens; the headroom covers verbose models that
    /// ignore the word limits.
    pub max_tokens: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Custom prompt template. If None, uses [`crate::prompts::ANALYST_PROMPT`].
    pub prompt_template: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Timeout for the single model call in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Directory or file path of the pdfium shared library. If None, the
    /// `PDFIUM_LIB_PATH` environment variable and then the system library
    /// search path are tried.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Receives stage and page events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            max_pages: 50,
            model: None,
            provider_name: None,
            provider: None,
            backend: None,
            temperature: 0.2,
            max_tokens: 8192,
            password: None,
            prompt_template: None,
            download_timeout_secs: 120,
            api_timeout_secs: 120,
            pdfium_lib_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for DeckConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeckConfig")
            .field("max_pages", &self.max_pages)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("prompt_template", &self.prompt_template.as_ref().map(String::len))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .finish()
    }
}

impl DeckConfig {
    /// Create a new builder for `DeckConfig`.
    pub fn builder() -> DeckConfigBuilder {
        DeckConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`DeckConfig`].
pub struct DeckConfigBuilder {
    config: DeckConfig,
}

impl fmt::Debug for DeckConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeckConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl DeckConfigBuilder {
    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn InsightBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = Some(template.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DeckConfig, DeckError> {
        let c = &self.config;
        if c.max_pages == 0 {
            return Err(DeckError::InvalidConfig("max_pages must be ≥ 1".into()));
        }
        if c.max_tokens == 0 {
            return Err(DeckError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.api_timeout_secs == 0 {
            return Err(DeckError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if let Some(ref t) = c.prompt_template {
            if t.trim().is_empty() {
                return Err(DeckError::InvalidConfig(
                    "prompt template is empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}
