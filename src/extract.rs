//! First-page extraction: [`UploadedDocument`] → [`EncodedImagePart`].
//!
//! [`PageExtractor`] lets the session run against a stub in tests; the real
//! implementation, [`PdfiumExtractor`], chains the `render` and `encode`
//! pipeline stages.

use crate::config::AnalyzerConfig;
use crate::error::AtsError;
use crate::pipeline::encode::{self, EncodedImagePart};
use crate::pipeline::input::UploadedDocument;
use crate::pipeline::render;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Page one of a résumé, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub image: EncodedImagePart,
    /// Pages in the document. Only the first is ever sent.
    pub page_count: usize,
    pub width: u32,
    pub height: u32,
}

/// Turns an uploaded PDF into a request-ready image of its first page.
#[async_trait]
pub trait PageExtractor: Send + Sync {
    async fn extract_first_page(&self, document: &UploadedDocument) -> Result<ExtractedPage, AtsError>;
}

/// Require a document, failing with [`AtsError::MissingInput`] when absent.
pub fn require_document(document: Option<&UploadedDocument>) -> Result<&UploadedDocument, AtsError> {
    document
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AtsError::missing("no résumé uploaded"))
}

/// Extract page one of `document`, or fail with `MissingInput` when `None`.
pub async fn extract(
    extractor: &dyn PageExtractor,
    document: Option<&UploadedDocument>,
) -> Result<ExtractedPage, AtsError> {
    let document = require_document(document)?;
    extractor.extract_first_page(document).await
}

/// pdfium-backed extractor.
#[derive(Debug, Clone, Default)]
pub struct PdfiumExtractor {
    config: AnalyzerConfig,
}

impl PdfiumExtractor {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PageExtractor for PdfiumExtractor {
    async fn extract_first_page(&self, document: &UploadedDocument) -> Result<ExtractedPage, AtsError> {
        let rendered = render::render_first_page(document.bytes().to_vec(), &self.config).await?;
        if rendered.page_count > 1 {
            warn!(
                "Résumé has {} pages; only page 1 is analysed",
                rendered.page_count
            );
        }

        let image = encode::encode_page(&rendered.image, self.config.jpeg_quality)?;
        debug!("Page 1 encoded: {} bytes", image.decoded_len());

        Ok(ExtractedPage {
            image,
            page_count: rendered.page_count,
            width: rendered.image.width(),
            height: rendered.image.height(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    #[async_trait]
    impl PageExtractor for Fixed {
        async fn extract_first_page(&self, _: &UploadedDocument) -> Result<ExtractedPage, AtsError> {
            Ok(ExtractedPage {
                image: EncodedImagePart::from_jpeg_bytes(b"\xFF\xD8"),
                page_count: 1,
                width: 1,
                height: 1,
            })
        }
    }

    #[tokio::test]
    async fn no_document_is_missing_input() {
        let err = extract(&Fixed, None).await.unwrap_err();
        assert!(err.is_missing_input(), "{err:?}");
    }

    #[tokio::test]
    async fn document_is_forwarded() {
        let doc = UploadedDocument::from_bytes(b"%PDF-1.7".to_vec()).unwrap();
        let page = extract(&Fixed, Some(&doc)).await.unwrap();
        assert_eq!(page.image.mime_type, encode::JPEG_MIME_TYPE);
    }
}
