//! Pipeline stages for one résumé analysis.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the session layer only composes them.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ llm ──▶ postprocess
//! (path/URL) (pdfium)  (JPEG+b64) (model)  (cleanup)
//! ```
//!
//! 1. [`input`]  — load the user's PDF into an [`input::UploadedDocument`]
//! 2. [`render`] — rasterise page one; runs in `spawn_blocking` because
//!    pdfium is blocking
//! 3. [`encode`] — JPEG-compress and base64-wrap the page as an
//!    [`encode::EncodedImagePart`]
//! 4. [`llm`]    — the single network round trip, behind [`llm::ModelClient`]
//! 5. [`postprocess`] — strip reply artefacts, find the match percentage

pub mod encode;
pub mod input;
pub mod llm;
pub mod postprocess;
pub mod render;
