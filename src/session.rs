//! The interaction controller: one user session, four buttons.
//!
//! ## State machine
//!
//! ```text
//!            press
//!   Idle ───────────▶ Validating ──(no résumé / no job field)──▶ Rejected ──▶ Idle
//!                         │
//!                         ▼
//!                    Extracting ──▶ Invoking ──▶ Displaying ──▶ Idle
//!                         │             │
//!                         └──── Err ────┴──────────────────────▶ Idle
//! ```
//!
//! `press` borrows the controller mutably, so a session runs one analysis at a
//! time from start to finish. Only the input check is handled locally; PDF and
//! remote failures are returned to the caller unchanged so it can show them and
//! let the user retry.

use crate::error::AtsError;
use crate::extract::PageExtractor;
use crate::output::{AnalysisReport, AnalysisStats, Outcome, Rejection, REJECTION_MESSAGE};
use crate::pipeline::input::UploadedDocument;
use crate::pipeline::llm::ModelClient;
use crate::pipeline::postprocess;
use crate::progress::{InteractionState, ObserverHandle};
use crate::prompts::{AnalysisKind, PromptSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A status banner derived from the current inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "level", content = "message", rename_all = "lowercase")]
pub enum Notice {
    Success(String),
    Warning(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Success(m) | Notice::Warning(m) => m,
        }
    }
}

/// Owns the session inputs and runs button presses against them.
pub struct InteractionController {
    extractor: Arc<dyn PageExtractor>,
    client: Arc<dyn ModelClient>,
    observer: Option<ObserverHandle>,
    document: Option<Arc<UploadedDocument>>,
    job_description: String,
    prompts: PromptSet,
    state: InteractionState,
}

impl std::fmt::Debug for InteractionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionController")
            .field("client", &self.client.name())
            .field("document", &self.document)
            .field("job_field", &self.prompts.job_field())
            .field("job_description_len", &self.job_description.len())
            .field("state", &self.state)
            .finish()
    }
}

impl InteractionController {
    pub fn new(extractor: Arc<dyn PageExtractor>, client: Arc<dyn ModelClient>) -> Self {
        Self {
            extractor,
            client,
            observer: None,
            document: None,
            job_description: String::new(),
            prompts: PromptSet::default(),
            state: InteractionState::Idle,
        }
    }

    pub fn with_observer(mut self, observer: ObserverHandle) -> Self {
        self.observer = Some(observer);
        self
    }

    // ── Inputs ────────────────────────────────────────────────────────────

    /// Replace the current résumé.
    pub fn upload(&mut self, document: UploadedDocument) {
        info!(
            "Résumé uploaded: {} ({} bytes)",
            document.name().unwrap_or("<unnamed>"),
            document.len()
        );
        self.document = Some(Arc::new(document));
    }

    pub fn clear_document(&mut self) {
        self.document = None;
    }

    pub fn set_job_description(&mut self, text: impl Into<String>) {
        self.job_description = text.into();
    }

    /// Set the job field and re-render the four prompts.
    pub fn set_job_field(&mut self, field: impl Into<String>) {
        let field = field.into();
        if field != self.prompts.job_field() {
            self.prompts = PromptSet::new(field);
        }
    }

    pub fn document(&self) -> Option<&UploadedDocument> {
        self.document.as_deref()
    }

    pub fn job_description(&self) -> &str {
        &self.job_description
    }

    pub fn job_field(&self) -> &str {
        self.prompts.job_field()
    }

    pub fn prompts(&self) -> &PromptSet {
        &self.prompts
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn client_name(&self) -> &str {
        self.client.name()
    }

    /// Banners to show above the buttons.
    pub fn notices(&self) -> Vec<Notice> {
        let mut notices = Vec::with_capacity(2);
        notices.push(if self.document.is_some() {
            Notice::Success("Resume uploaded successfully.".to_string())
        } else {
            Notice::Warning("Upload your resume to continue.".to_string())
        });
        if self.prompts.job_field().is_empty() {
            notices.push(Notice::Warning(
                "Specify the job field for accurate analysis.".to_string(),
            ));
        }
        notices
    }

    // ── Actions ───────────────────────────────────────────────────────────

    /// Run one analysis.
    ///
    /// Returns `Ok(Outcome::Rejected)` when the résumé or job field is
    /// missing; in that case the model is not called. Extraction and remote
    /// errors are returned as `Err`. The controller is idle again afterwards
    /// in every case.
    pub async fn press(&mut self, kind: AnalysisKind) -> Result<Outcome, AtsError> {
        if let Some(ref o) = self.observer {
            o.on_press(kind);
        }
        self.transition(InteractionState::Validating);

        let missing_document = self.document.is_none();
        let missing_job_field = self.prompts.job_field().is_empty();
        if missing_document || missing_job_field {
            info!(
                "{}: rejected (document missing: {}, job field missing: {})",
                kind, missing_document, missing_job_field
            );
            self.transition(InteractionState::Rejected);
            self.transition(InteractionState::Idle);
            return Ok(Outcome::Rejected(Rejection {
                kind,
                message: REJECTION_MESSAGE.to_string(),
                missing_document,
                missing_job_field,
            }));
        }

        let result = self.run(kind).await;
        if let Err(ref e) = result {
            warn!("{}: failed: {}", kind, e);
            if let Some(ref o) = self.observer {
                o.on_error(kind, &e.to_string());
            }
        }
        self.transition(InteractionState::Idle);
        result.map(Outcome::Displayed)
    }

    /// Press every button in order, stopping at the first error.
    pub async fn press_all(&mut self) -> Result<Vec<Outcome>, AtsError> {
        let mut outcomes = Vec::with_capacity(AnalysisKind::ALL.len());
        for kind in AnalysisKind::ALL {
            outcomes.push(self.press(kind).await?);
        }
        Ok(outcomes)
    }

    async fn run(&mut self, kind: AnalysisKind) -> Result<AnalysisReport, AtsError> {
        let document = self
            .document
            .clone()
            .ok_or_else(|| AtsError::missing("no résumé uploaded"))?;
        let extractor = Arc::clone(&self.extractor);
        let client = Arc::clone(&self.client);

        self.transition(InteractionState::Extracting);
        let extract_start = Instant::now();
        let page = extractor.extract_first_page(&document).await?;
        let extract_ms = extract_start.elapsed().as_millis() as u64;
        debug!(
            "{}: page 1 of {} extracted in {}ms ({}x{})",
            kind, page.page_count, extract_ms, page.width, page.height
        );

        self.transition(InteractionState::Invoking);
        let model_start = Instant::now();
        let raw = client
            .generate(&self.job_description, &page.image, self.prompts.get(kind))
            .await?;
        let model_ms = model_start.elapsed().as_millis() as u64;
        info!("{}: {} answered in {}ms", kind, client.name(), model_ms);

        self.transition(InteractionState::Displaying);
        let text = postprocess::clean_response(&raw);
        let match_percentage = match kind {
            AnalysisKind::Match => postprocess::match_percentage(&text),
            _ => None,
        };

        Ok(AnalysisReport {
            kind,
            heading: kind.heading().to_string(),
            text,
            match_percentage,
            model: client.name().to_string(),
            stats: AnalysisStats {
                page_count: page.page_count,
                image_bytes: page.image.decoded_len(),
                extract_ms,
                model_ms,
            },
        })
    }

    fn transition(&mut self, to: InteractionState) {
        let from = std::mem::replace(&mut self.state, to);
        debug!("state: {} → {}", from, to);
        if let Some(ref o) = self.observer {
            o.on_transition(from, to);
        }
    }
}
