//! Error types for the ats-resume library.
//!
//! Two error types reflect two distinct failure sources:
//!
//! * [`AtsError`] — anything that stops the current analysis: missing input,
//!   an unreadable or corrupt PDF, a pdfium binding problem, bad
//!   configuration. Only [`AtsError::MissingInput`] is recovered locally (the
//!   controller turns it into a rejection notice); everything else is
//!   returned to the caller.
//!
//! * [`RemoteServiceError`] — the model call itself failed (transport,
//!   authentication, quota, safety block). It is never retried or translated;
//!   it reaches callers wrapped as [`AtsError::Remote`].

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the ats-resume library.
#[derive(Debug, Error)]
pub enum AtsError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// A required input (résumé or job field) was not supplied.
    #[error("Missing input: {what}")]
    MissingInput { what: String },

    /// Résumé file was not found at the given path.
    #[error("Résumé file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The bytes do not start with the `%PDF` header.
    #[error("Upload is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// pdfium could not parse the document.
    #[error("Could not parse PDF: {detail}")]
    DocumentParse { detail: String },

    /// The PDF is encrypted and no (or a wrong) password was supplied.
    #[error("PDF is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired,

    /// The PDF parsed but contains no pages.
    #[error("PDF contains no pages")]
    EmptyDocument,

    /// pdfium failed to render the first page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// JPEG encoding of the rendered page failed.
    #[error("Image encoding failed: {0}")]
    ImageEncode(#[from] image::ImageError),

    // ── Model errors ──────────────────────────────────────────────────────
    /// The remote model call failed.
    #[error(transparent)]
    Remote(#[from] RemoteServiceError),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium for your platform, or point PDFIUM_LIB_PATH at an existing\n\
copy (the full path to libpdfium.so / libpdfium.dylib / pdfium.dll).\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AtsError {
    pub(crate) fn missing(what: impl Into<String>) -> Self {
        AtsError::MissingInput { what: what.into() }
    }

    /// `true` when the error stems from absent user input rather than from
    /// the document or the remote service.
    pub fn is_missing_input(&self) -> bool {
        matches!(self, AtsError::MissingInput { .. })
    }
}

/// Failures reported by a [`crate::pipeline::llm::ModelClient`].
#[derive(Debug, Error)]
pub enum RemoteServiceError {
    /// The backend cannot be constructed (unknown provider, no key in env…).
    #[error("Model provider '{provider}' is not configured.\n{hint}")]
    NotConfigured { provider: String, hint: String },

    /// 401/403 or an API-key rejection, including a missing key.
    #[error("Authentication error from '{provider}': {detail}")]
    Auth { provider: String, detail: String },

    /// HTTP 429 / quota exhausted.
    #[error("Rate limit exceeded for '{provider}'")]
    RateLimited {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// Any other non-success answer from the API.
    #[error("'{provider}' API error{}: {message}", http_suffix(.status))]
    Api {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    /// The model refused to answer (safety filter, blocked prompt).
    #[error("'{provider}' returned no content: {reason}")]
    Blocked { provider: String, reason: String },

    /// Connection, TLS or body-read failure.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("Could not decode '{provider}' response: {detail}")]
    Decode { provider: String, detail: String },
}

fn http_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_is_flagged() {
        let e = AtsError::missing("résumé");
        assert!(e.is_missing_input());
        assert!(e.to_string().contains("résumé"));
        assert!(!AtsError::EmptyDocument.is_missing_input());
    }

    #[test]
    fn remote_error_passes_through_display() {
        let e: AtsError = RemoteServiceError::Auth {
            provider: "gemini".into(),
            detail: "API key not valid".into(),
        }
        .into();
        let msg = e.to_string();
        assert!(msg.contains("gemini"), "got: {msg}");
        assert!(msg.contains("API key not valid"), "got: {msg}");
    }

    #[test]
    fn api_error_display_with_status() {
        let e = RemoteServiceError::Api {
            provider: "gemini".into(),
            status: Some(500),
            message: "internal".into(),
        };
        assert!(e.to_string().contains("HTTP 500"));
    }

    #[test]
    fn api_error_display_without_status() {
        let e = RemoteServiceError::Api {
            provider: "openai".into(),
            status: None,
            message: "overloaded".into(),
        };
        let msg = e.to_string();
        assert!(!msg.contains("HTTP"), "got: {msg}");
        assert!(msg.contains("overloaded"));
    }

    #[test]
    fn not_a_pdf_shows_magic() {
        let e = AtsError::NotAPdf {
            magic: b"PK\x03\x04".to_vec(),
        };
        assert!(e.to_string().contains("not a valid PDF"));
    }
}
