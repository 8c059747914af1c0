//! Top-level entry points.
//!
//! [`build_controller`] wires the configured extractor and model client into an
//! [`InteractionController`] for front-ends that keep a session open.
//! [`analyze`] is the one-shot form: load a résumé, press one button, return the
//! outcome.

use crate::config::{AnalyzerConfig, Backend};
use crate::error::{AtsError, RemoteServiceError};
use crate::extract::PdfiumExtractor;
use crate::output::Outcome;
use crate::pipeline::input::{self, UploadedDocument};
use crate::pipeline::llm::{GeminiClient, ModelClient, ProviderClient};
use crate::pipeline::render;
use crate::prompts::AnalysisKind;
use crate::session::InteractionController;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::info;

/// Default model for the `provider` backend when none is configured.
const DEFAULT_PROVIDER_MODEL: &str = "gpt-4.1-nano";

/// Build a controller from `config`.
pub fn build_controller(config: &AnalyzerConfig) -> Result<InteractionController, AtsError> {
    let client = resolve_client(config)?;
    let extractor = Arc::new(PdfiumExtractor::new(config.clone()));
    Ok(InteractionController::new(extractor, client))
}

/// Analyse a résumé at `resume` (path or URL) in one call.
///
/// # Example
/// ```rust,no_run
/// use ats_resume::{analyze, AnalysisKind, AnalyzerConfig, Outcome};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AnalyzerConfig::from_env();
/// let jd = std::fs::read_to_string("job.txt")?;
/// match analyze("cv.pdf", &jd, "Engineering", AnalysisKind::Match, &config).await? {
///     Outcome::Displayed(report) => println!("{}\n\n{}", report.heading, report.text),
///     Outcome::Rejected(r) => eprintln!("{}", r.message),
/// }
/// # Ok(())
/// # }
/// ```
pub async fn analyze(
    resume: &str,
    job_description: &str,
    job_field: &str,
    kind: AnalysisKind,
    config: &AnalyzerConfig,
) -> Result<Outcome, AtsError> {
    info!("Analysing {} ({})", resume, kind);
    let document = input::load_document(resume, config.download_timeout_secs).await?;
    analyze_document(document, job_description, job_field, kind, config).await
}

/// Like [`analyze`], for a résumé already in memory.
pub async fn analyze_document(
    document: UploadedDocument,
    job_description: &str,
    job_field: &str,
    kind: AnalysisKind,
    config: &AnalyzerConfig,
) -> Result<Outcome, AtsError> {
    let mut controller = build_controller(config)?;
    controller.upload(document);
    controller.set_job_description(job_description);
    controller.set_job_field(job_field);
    controller.press(kind).await
}

/// Synchronous wrapper around [`analyze`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    resume: &str,
    job_description: &str,
    job_field: &str,
    kind: AnalysisKind,
    config: &AnalyzerConfig,
) -> Result<Outcome, AtsError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AtsError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze(resume, job_description, job_field, kind, config))
}

/// Count the pages of a résumé without calling any model.
pub async fn inspect(resume: &str, config: &AnalyzerConfig) -> Result<usize, AtsError> {
    let document = input::load_document(resume, config.download_timeout_secs).await?;
    render::page_count(document.bytes().to_vec(), config).await
}

/// Resolve the model client, from most-specific to least-specific.
///
/// 1. **Pre-built client** (`config.client`), used as-is.
/// 2. **Gemini backend**: a [`GeminiClient`] built from `config.model`. The
///    API key may be absent; the call then fails with an auth error.
/// 3. **Provider backend**: an `edgequake-llm` provider (see
///    [`resolve_provider`]) wrapped in a [`ProviderClient`].
pub fn resolve_client(config: &AnalyzerConfig) -> Result<Arc<dyn ModelClient>, AtsError> {
    if let Some(ref client) = config.client {
        return Ok(Arc::clone(client));
    }

    match config.model.backend {
        Backend::Gemini => Ok(Arc::new(GeminiClient::new(&config.model)?)),
        Backend::Provider => {
            let (provider, label) = resolve_provider(config)?;
            Ok(Arc::new(ProviderClient::new(provider, label, &config.model)))
        }
    }
}

/// Pick an `edgequake-llm` provider.
///
/// 1. Named provider (`config.model.provider_name`) with the configured model.
/// 2. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL` when both are set.
/// 3. Full auto-detection via `ProviderFactory::from_env`.
fn resolve_provider(config: &AnalyzerConfig) -> Result<(Arc<dyn LLMProvider>, String), AtsError> {
    if let Some(ref name) = config.model.provider_name {
        let model = config.model.model.as_deref().unwrap_or(DEFAULT_PROVIDER_MODEL);
        return create_provider(name, model).map(|p| (p, name.clone()));
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model).map(|p| (p, prov));
        }
    }

    let (llm_provider, _embedding) = ProviderFactory::from_env().map_err(|e| {
        AtsError::Remote(RemoteServiceError::NotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or use --backend gemini.\n\
                Error: {}",
                e
            ),
        })
    })?;

    Ok((llm_provider, "auto".to_string()))
}

fn create_provider(name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, AtsError> {
    ProviderFactory::create_llm_provider(name, model).map_err(|e| {
        AtsError::Remote(RemoteServiceError::NotConfigured {
            provider: name.to_string(),
            hint: format!("{e}"),
        })
    })
}
