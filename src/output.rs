//! Result types handed back to front-ends.

use crate::prompts::AnalysisKind;
use serde::{Deserialize, Serialize};

/// Shown when a button is pressed without a résumé or a job field.
pub const REJECTION_MESSAGE: &str = "Please upload a resume and specify the job field.";

/// What a button press produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The model answered; display `report.text` under `report.heading`.
    Displayed(AnalysisReport),
    /// Validation failed; show `message` inline and do nothing else.
    Rejected(Rejection),
}

impl Outcome {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            Outcome::Displayed(r) => r.kind,
            Outcome::Rejected(r) => r.kind,
        }
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            Outcome::Displayed(r) => Some(r),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected(_))
    }
}

/// A validation failure for one press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub kind: AnalysisKind,
    pub message: String,
    pub missing_document: bool,
    pub missing_job_field: bool,
}

/// One completed analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub kind: AnalysisKind,
    /// Section heading for display.
    pub heading: String,
    /// Cleaned model answer.
    pub text: String,
    /// Headline number from a `Match` report, when one could be found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_percentage: Option<u8>,
    /// Client that produced the answer (e.g. "gemini").
    pub model: String,
    pub stats: AnalysisStats,
}

/// Timings and sizes for one analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Pages in the résumé; only the first was sent.
    pub page_count: usize,
    /// Compressed page image size in bytes.
    pub image_bytes: usize,
    pub extract_ms: u64,
    pub model_ms: u64,
}
