//! # ats-resume
//!
//! Evaluate a PDF résumé against a job description with a vision language
//! model, the way an applicant tracking system (ATS) specialist would.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    load a local file, URL or byte buffer
//!  ├─ 2. Render   rasterise page one via pdfium (spawn_blocking)
//!  ├─ 3. Encode   RGB → JPEG → base64 {mime_type, data}
//!  ├─ 4. Model    job description + page image + analysis prompt
//!  └─ 5. Polish   strip reply artefacts, pull out the match percentage
//! ```
//!
//! Four analyses are available, one per [`AnalysisKind`]:
//!
//! | Kind | Button | Heading |
//! |------|--------|---------|
//! | `Analyze`   | Analyze Resume         | Resume Analysis Report |
//! | `Recommend` | Recommend Improvements | Skill Improvement Suggestions |
//! | `Missing`   | Find Missing Keywords  | Missing Keywords |
//! | `Match`     | Calculate ATS Match %  | ATS Match Percentage Report |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ats_resume::{build_controller, AnalysisKind, AnalyzerConfig, Outcome, UploadedDocument};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key from GENAI_API_KEY / GEMINI_API_KEY
//!     let config = AnalyzerConfig::from_env();
//!     let mut session = build_controller(&config)?;
//!     session.upload(UploadedDocument::from_path("cv.pdf")?);
//!     session.set_job_description(std::fs::read_to_string("job.txt")?);
//!     session.set_job_field("Engineering");
//!
//!     if let Outcome::Displayed(report) = session.press(AnalysisKind::Match).await? {
//!         println!("## {}\n\n{}", report.heading, report.text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ats-resume` binary (clap + anyhow + tracing-subscriber + indicatif + dotenvy) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, analyze_document, analyze_sync, build_controller, inspect, resolve_client};
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder, Backend, ModelConfig};
pub use error::{AtsError, RemoteServiceError};
pub use extract::{ExtractedPage, PageExtractor, PdfiumExtractor};
pub use output::{AnalysisReport, AnalysisStats, Outcome, Rejection, REJECTION_MESSAGE};
pub use pipeline::encode::{EncodedImagePart, JPEG_MIME_TYPE};
pub use pipeline::input::UploadedDocument;
pub use pipeline::llm::{GeminiClient, ModelClient, ProviderClient};
pub use progress::{InteractionObserver, InteractionState, NoopObserver, ObserverHandle};
pub use prompts::{AnalysisKind, PromptSet};
pub use session::{InteractionController, Notice};
