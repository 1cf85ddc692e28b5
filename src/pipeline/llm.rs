//! Insight extraction: one prompt, one model call, one JSON reply.
//!
//! The call goes through [`InsightBackend`] so the rest of the pipeline never
//! sees a concrete provider. Production uses [`ProviderBackend`], a thin
//! adapter over an `edgequake_llm` [`LLMProvider`]; tests plug in a backend
//! that returns a canned reply.
//!
//! There is no retry loop. A failed call, a timeout, or an
//! unparseable reply aborts the run with [`DeckError::Analysis`].

use crate::config::{default_model_for, DeckConfig};
use crate::error::{AnalysisError, DeckError};
use crate::model::AnalysisResult;
use crate::pipeline::reply;
use crate::prompts::build_analysis_prompt;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Raw text reply plus token accounting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// Anything that can answer a single text prompt.
pub trait InsightBackend: Send + Sync {
    /// Short label used in logs and error messages, e.g. `"gemini"`.
    fn name(&self) -> &str;

    /// Send `prompt` as a single user message and return the reply.
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<Completion, AnalysisError>>;
}

/// [`InsightBackend`] over an `edgequake_llm` provider.
pub struct ProviderBackend {
    label: String,
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl ProviderBackend {
    pub fn new(label: impl Into<String>, provider: Arc<dyn LLMProvider>, config: &DeckConfig) -> Self {
        Self {
            label: label.into(),
            provider,
            options: build_options(config),
        }
    }
}

impl InsightBackend for ProviderBackend {
    fn name(&self) -> &str {
        &self.label
    }

    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<Completion, AnalysisError>> {
        Box::pin(async move {
            let messages = vec![ChatMessage::user(prompt)];
            let response = self
                .provider
                .chat(&messages, Some(&self.options))
                .await
                .map_err(|e| AnalysisError::Service {
                    provider: self.label.clone(),
                    message: e.to_string(),
                })?;
            Ok(Completion {
                text: response.content,
                input_tokens: response.prompt_tokens as usize,
                output_tokens: response.completion_tokens as usize,
            })
        })
    }
}

/// Build `CompletionOptions` from the deck config.
fn build_options(config: &DeckConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Parsed analysis plus the accounting of the call that produced it.
#[derive(Debug, Clone)]
pub struct Insights {
    pub analysis: AnalysisResult,
    pub backend: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
}

/// Run the analyst prompt over `document_text`.
pub async fn extract_insights(document_text: &str, config: &DeckConfig) -> Result<Insights, DeckError> {
    let backend = resolve_backend(config)?;
    extract_with(backend.as_ref(), document_text, config).await
}

/// Same as [`extract_insights`] with an already-resolved backend.
pub async fn extract_with(
    backend: &dyn InsightBackend,
    document_text: &str,
    config: &DeckConfig,
) -> Result<Insights, DeckError> {
    let prompt = build_analysis_prompt(document_text, config.prompt_template.as_deref());
    info!(
        "Requesting analysis from '{}' ({} prompt chars)",
        backend.name(),
        prompt.chars().count()
    );

    let start = Instant::now();
    let secs = config.api_timeout_secs;
    let completion = tokio::time::timeout(Duration::from_secs(secs), backend.complete(&prompt))
        .await
        .map_err(|_| AnalysisError::Timeout { secs })??;
    let duration_ms = start.elapsed().as_millis() as u64;

    debug!(
        "'{}': {} input tokens, {} output tokens, {}ms",
        backend.name(),
        completion.input_tokens,
        completion.output_tokens,
        duration_ms
    );

    let analysis = reply::parse_reply(&completion.text)?;
    Ok(Insights {
        analysis,
        backend: backend.name().to_string(),
        input_tokens: completion.input_tokens,
        output_tokens: completion.output_tokens,
        duration_ms,
    })
}

// ── Backend resolution ───────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, AnalysisError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        AnalysisError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{}", e),
        }
    })
}

fn named_backend(name: &str, model: &str, config: &DeckConfig) -> Result<Arc<dyn InsightBackend>, AnalysisError> {
    let provider = create_provider(name, model)?;
    Ok(Arc::new(ProviderBackend::new(
        format!("{}/{}", name, model),
        provider,
        config,
    )))
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Resolve the insight backend, from most-specific to least-specific.
///
/// 1. `config.backend`, used as-is.
/// 2. `config.provider`, wrapped in a [`ProviderBackend`].
/// 3. `config.provider_name` with `config.model` (or that provider's
///    default model).
/// 4. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set.
/// 5. Gemini, when `GEMINI_API_KEY` or `GOOGLE_API_KEY` is set.
/// 6. `ProviderFactory::from_env`, which picks the first provider whose
///    API key it finds.
pub fn resolve_backend(config: &DeckConfig) -> Result<Arc<dyn InsightBackend>, AnalysisError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }

    if let Some(ref provider) = config.provider {
        let label = config.model.clone().unwrap_or_else(|| "custom".to_string());
        return Ok(Arc::new(ProviderBackend::new(
            label,
            Arc::clone(provider),
            config,
        )));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(default_model_for(name));
        return named_backend(name, model, config);
    }

    if let (Some(prov), Some(model)) = (
        env_non_empty("EDGEQUAKE_LLM_PROVIDER"),
        env_non_empty("EDGEQUAKE_MODEL"),
    ) {
        return named_backend(&prov, &model, config);
    }

    if env_non_empty("GEMINI_API_KEY").is_some() || env_non_empty("GOOGLE_API_KEY").is_some() {
        let model = config.model.as_deref().unwrap_or(default_model_for("gemini"));
        return named_backend("gemini", model, config);
    }

    let (provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| AnalysisError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;
    Ok(Arc::new(ProviderBackend::new("auto", provider, config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Canned {
        reply: Result<String, AnalysisError>,
        seen: Mutex<Vec<String>>,
    }

    impl Canned {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl InsightBackend for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<Completion, AnalysisError>> {
            self.seen.lock().unwrap().push(prompt.to_string());
            let result = self.reply.clone().map(|text| Completion {
                text,
                input_tokens: 10,
                output_tokens: 5,
            });
            Box::pin(async move { result })
        }
    }

    struct Stalled;

    impl InsightBackend for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        fn complete<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, Result<Completion, AnalysisError>> {
            Box::pin(futures::future::pending())
        }
    }

    #[test]
    fn build_options_defaults() {
        let opts = build_options(&DeckConfig::default());
        assert_eq!(opts.temperature, Some(0.2));
        assert_eq!(opts.max_tokens, Some(8192));
    }

    #[tokio::test]
    async fn sends_prompt_with_source_text() {
        let backend = Canned::ok(r#"{"company_name": "Acme"}"#);
        let insights = extract_with(&backend, "Annual text", &DeckConfig::default())
            .await
            .unwrap();
        assert_eq!(insights.analysis.company_name(), "Acme");
        assert_eq!(insights.input_tokens, 10);
        assert_eq!(insights.backend, "canned");

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].ends_with("Source Text: Annual text"));
    }

    #[tokio::test]
    async fn service_error_becomes_analysis_error() {
        let backend = Canned {
            reply: Err(AnalysisError::Service {
                provider: "canned".into(),
                message: "503".into(),
            }),
            seen: Mutex::new(Vec::new()),
        };
        let err = extract_with(&backend, "x", &DeckConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DeckError::Analysis(AnalysisError::Service { .. })));
    }

    #[tokio::test]
    async fn malformed_reply_aborts() {
        let backend = Canned::ok("I could not read the report.");
        let err = extract_with(&backend, "x", &DeckConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeckError::Analysis(AnalysisError::MalformedReply { .. })
        ));
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let config = DeckConfig::builder().api_timeout_secs(1).build().unwrap();
        let err = extract_with(&Stalled, "x", &config).await.unwrap_err();
        assert!(matches!(
            err,
            DeckError::Analysis(AnalysisError::Timeout { secs: 1 })
        ));
    }

    #[test]
    fn explicit_backend_wins() {
        let backend: Arc<dyn InsightBackend> = Arc::new(Canned::ok("{}"));
        let config = DeckConfig::builder()
            .backend(Arc::clone(&backend))
            .provider_name("openai")
            .build()
            .unwrap();
        let resolved = resolve_backend(&config).unwrap();
        assert_eq!(resolved.name(), "canned");
    }
}
