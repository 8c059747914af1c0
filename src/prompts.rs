//! Instruction templates for the four résumé analyses.
//!
//! Every analysis the tool offers is a variant of [`AnalysisKind`]; adding or
//! removing one is a compile-time-checked change because [`AnalysisKind::template`]
//! and the UI metadata below all match exhaustively.
//!
//! Templates are parameterised by the *job field* (e.g. "Marketing",
//! "Engineering"). The field is substituted verbatim and never validated; an
//! empty field produces a grammatical-but-vaguer prompt rather than an error.
//! The [`crate::session::InteractionController`] refuses to run with an empty
//! field anyway, so that case only arises through direct library use.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four canned analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    /// Strengths, weaknesses and critical gaps.
    Analyze,
    /// Skill and career improvement recommendations.
    Recommend,
    /// Job-description keywords missing from the résumé.
    Missing,
    /// Estimated ATS match percentage with a short justification.
    Match,
}

impl AnalysisKind {
    /// All kinds in button order.
    pub const ALL: [AnalysisKind; 4] = [
        AnalysisKind::Analyze,
        AnalysisKind::Recommend,
        AnalysisKind::Missing,
        AnalysisKind::Match,
    ];

    /// Stable lowercase identifier, used on the command line and in JSON.
    pub fn id(self) -> &'static str {
        match self {
            AnalysisKind::Analyze => "analyze",
            AnalysisKind::Recommend => "recommend",
            AnalysisKind::Missing => "missing",
            AnalysisKind::Match => "match",
        }
    }

    /// Label of the action that triggers this analysis.
    pub fn button_label(self) -> &'static str {
        match self {
            AnalysisKind::Analyze => "Analyze Resume",
            AnalysisKind::Recommend => "Recommend Improvements",
            AnalysisKind::Missing => "Find Missing Keywords",
            AnalysisKind::Match => "Calculate ATS Match %",
        }
    }

    /// Section heading the result is displayed under.
    pub fn heading(self) -> &'static str {
        match self {
            AnalysisKind::Analyze => "Resume Analysis Report",
            AnalysisKind::Recommend => "Skill Improvement Suggestions",
            AnalysisKind::Missing => "Missing Keywords",
            AnalysisKind::Match => "ATS Match Percentage Report",
        }
    }

    /// Render this kind's instruction text for `job_field`.
    pub fn template(self, job_field: &str) -> String {
        match self {
            AnalysisKind::Analyze => format!(
                "You are an expert HR and ATS specialist with deep knowledge of {job_field}.\n\
                 Evaluate the resume based on the provided job description.\n\
                 Your response must include:\n\
                 - A detailed assessment of resume strengths and weaknesses.\n\
                 - Critical gaps and missing elements.\n\
                 - Direct and actionable improvement recommendations.\n\
                 Format all suggestions as clear bullet points."
            ),
            AnalysisKind::Recommend => format!(
                "You are a professional career coach and resume reviewer specialized in {job_field}.\n\
                 Review the resume against the job description.\n\
                 Provide:\n\
                 - Concrete skill improvement recommendations.\n\
                 - Career development suggestions.\n\
                 - Steps to enhance the resume's chances of shortlisting.\n\
                 Keep the suggestions professional and ATS-focused."
            ),
            AnalysisKind::Missing => format!(
                "As an ATS and recruitment expert in {job_field}, your task is:\n\
                 - Identify essential keywords and skills present in the job description but missing from the resume.\n\
                 - Present the missing items as a bullet point list.\n\
                 Only include highly relevant and impactful keywords for ATS scoring."
            ),
            AnalysisKind::Match => format!(
                "Act as a strict ATS evaluator for {job_field}.\n\
                 Your task:\n\
                 - Compare the resume to the job description.\n\
                 - Calculate a realistic match percentage based on ATS standards.\n\
                 - Briefly justify the percentage.\n\
                 Be unbiased and professional."
            ),
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for AnalysisKind {
    type Err = String;

    /// Accepts the identifier (`match`), a few synonyms, or the button label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        let kind = match needle.as_str() {
            "analyze" | "analyse" | "analysis" => AnalysisKind::Analyze,
            "recommend" | "recommendations" | "improve" => AnalysisKind::Recommend,
            "missing" | "keywords" => AnalysisKind::Missing,
            "match" | "percentage" | "score" => AnalysisKind::Match,
            other => {
                return AnalysisKind::ALL
                    .into_iter()
                    .find(|k| k.button_label().to_lowercase() == other)
                    .ok_or_else(|| {
                        format!("unknown analysis '{s}' (expected analyze, recommend, missing or match)")
                    })
            }
        };
        Ok(kind)
    }
}

/// The four prompts rendered for one job field.
///
/// Recreate it whenever the job field changes; the controller does this in
/// [`crate::session::InteractionController::set_job_field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    job_field: String,
    analyze: String,
    recommend: String,
    missing: String,
    match_: String,
}

impl PromptSet {
    pub fn new(job_field: impl Into<String>) -> Self {
        let job_field = job_field.into();
        Self {
            analyze: AnalysisKind::Analyze.template(&job_field),
            recommend: AnalysisKind::Recommend.template(&job_field),
            missing: AnalysisKind::Missing.template(&job_field),
            match_: AnalysisKind::Match.template(&job_field),
            job_field,
        }
    }

    pub fn job_field(&self) -> &str {
        &self.job_field
    }

    /// The prompt for `kind`.
    pub fn get(&self, kind: AnalysisKind) -> &str {
        match kind {
            AnalysisKind::Analyze => &self.analyze,
            AnalysisKind::Recommend => &self.recommend,
            AnalysisKind::Missing => &self.missing,
            AnalysisKind::Match => &self.match_,
        }
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::new("")
    }
}
