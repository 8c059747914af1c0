//! Configuration types for résumé analysis.
//!
//! Everything the pipeline needs is carried by [`AnalyzerConfig`], built via
//! [`AnalyzerConfigBuilder`]. Model access is configured separately in the
//! nested [`ModelConfig`] so the API key travels as explicit startup
//! configuration into the client constructor instead of living in process-wide
//! state. Only [`ModelConfig::from_env`] looks at the environment, and only
//! when the caller asks it to.

use crate::error::AtsError;
use crate::pipeline::llm::ModelClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Default Gemini model, matching the hosted tool this crate reproduces.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";

/// Default Gemini REST endpoint.
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Environment variables consulted (in order) for the Gemini API key.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GENAI_API_KEY", "GEMINI_API_KEY"];

/// Smallest accepted `max_rendered_pixels`.
pub const MIN_RENDERED_PIXELS: u32 = 100;

/// Configuration for a résumé analysis session.
///
/// # Example
/// ```rust
/// use ats_resume::AnalyzerConfig;
///
/// let config = AnalyzerConfig::builder()
///     .jpeg_quality(85)
///     .api_key("test-key")
///     .build()
///     .unwrap();
/// assert_eq!(config.jpeg_quality, 85);
/// ```
#[derive(Clone)]
pub struct AnalyzerConfig {
    /// Longest rendered edge of the first page in pixels. Default: 2000.
    ///
    /// A US-letter page at 200 DPI is 1700 × 2200 px; capping the longest edge
    /// keeps poster-sized pages from exhausting memory.
    pub max_rendered_pixels: u32,

    /// JPEG quality (1–100) used when compressing the rendered page. Default: 75.
    pub jpeg_quality: u8,

    /// PDF user password for encrypted résumés.
    pub password: Option<String>,

    /// pdfium shared library, or the directory that holds it. Falls back to
    /// `PDFIUM_LIB_PATH`, then to the system library.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Remote model settings.
    pub model: ModelConfig,

    /// Pre-constructed model client. Takes precedence over [`ModelConfig`].
    pub client: Option<Arc<dyn ModelClient>>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_rendered_pixels: 2000,
            jpeg_quality: 75,
            password: None,
            pdfium_lib_path: None,
            download_timeout_secs: 120,
            model: ModelConfig::default(),
            client: None,
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("model", &self.model)
            .field("client", &self.client.as_ref().map(|c| c.name().to_string()))
            .finish()
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Default settings with [`ModelConfig::from_env`] applied.
    pub fn from_env() -> Self {
        Self {
            model: ModelConfig::from_env(),
            ..Self::default()
        }
    }
}

/// Which remote client to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Direct REST call to Gemini `generateContent` (default).
    #[default]
    Gemini,
    /// Any provider supported by `edgequake-llm` (OpenAI, Anthropic, Ollama…).
    Provider,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Backend::Gemini),
            "provider" | "edgequake" => Ok(Backend::Provider),
            other => Err(format!("unknown backend '{other}' (expected gemini or provider)")),
        }
    }
}

/// Remote model settings handed to the client constructor.
#[derive(Clone, Default, PartialEq)]
pub struct ModelConfig {
    pub backend: Backend,

    /// Model identifier. `None` uses the backend default
    /// ([`DEFAULT_GEMINI_MODEL`] for Gemini).
    pub model: Option<String>,

    /// `edgequake-llm` provider name for [`Backend::Provider`]
    /// (e.g. "openai", "anthropic"). `None` auto-detects from the environment.
    pub provider_name: Option<String>,

    /// Gemini API key. A missing key is not an error until the first call.
    pub api_key: Option<String>,

    /// Override for the Gemini base URL (proxies, regional endpoints).
    pub endpoint: Option<String>,

    /// Sampling temperature. `None` leaves the service default.
    pub temperature: Option<f32>,

    /// Output token cap. `None` leaves the service default.
    pub max_tokens: Option<usize>,
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("backend", &self.backend)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl ModelConfig {
    /// Read the API key from [`API_KEY_ENV_VARS`] and the model from
    /// `ATS_MODEL`. Empty values count as unset.
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            api_key: API_KEY_ENV_VARS.iter().find_map(|k| non_empty(k)),
            model: non_empty("ATS_MODEL"),
            ..Self::default()
        }
    }

    /// The configured model, or the backend default.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL)
    }

    /// The configured endpoint, or the public Gemini endpoint.
    pub fn endpoint_or_default(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or(DEFAULT_GEMINI_ENDPOINT)
            .trim_end_matches('/')
    }
}

/// Builder for [`AnalyzerConfig`].
#[derive(Debug)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(MIN_RENDERED_PIXELS);
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn model_config(mut self, model: ModelConfig) -> Self {
        self.config.model = model;
        self
    }

    pub fn backend(mut self, backend: Backend) -> Self {
        self.config.model.backend = backend;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.model.provider_name = Some(name.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.model.api_key = Some(key.into());
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.model.endpoint = Some(url.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.model.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.model.max_tokens = Some(n);
        self
    }

    pub fn client(mut self, client: Arc<dyn ModelClient>) -> Self {
        self.config.client = Some(client);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalyzerConfig, AtsError> {
        let c = &self.config;
        if c.download_timeout_secs == 0 {
            return Err(AtsError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        if let Some(ref endpoint) = c.model.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(AtsError::InvalidConfig(format!(
                    "Endpoint must be an HTTP(S) URL, got '{endpoint}'"
                )));
            }
        }
        if c.model.max_tokens == Some(0) {
            return Err(AtsError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}
