//! Input resolution: turn a path, URL or byte buffer into an [`UploadedDocument`].
//!
//! pdfium can load a document straight from memory, so unlike a
//! file-oriented pipeline nothing is staged on disk: URLs are downloaded into
//! a buffer and local files are read whole. The `%PDF` magic bytes are checked
//! up front so a mis-selected `.docx` produces a readable error instead of an
//! opaque pdfium failure.

use crate::error::AtsError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A résumé as uploaded: raw PDF bytes and an optional display name.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    name: Option<String>,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedDocument")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl UploadedDocument {
    /// Wrap in-memory bytes. Empty input counts as "nothing uploaded".
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, AtsError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(AtsError::missing("résumé upload is empty"));
        }
        check_magic(&bytes)?;
        Ok(Self { name: None, bytes })
    }

    /// Attach a display name (usually the file name).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Read a local file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AtsError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| io_error(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        debug!("Read {} bytes from {}", bytes.len(), path.display());

        let doc = Self::from_bytes(bytes)?;
        Ok(match name {
            Some(n) => doc.with_name(n),
            None => doc,
        })
    }

    /// Download a résumé over HTTP(S).
    pub async fn from_url(url: &str, timeout_secs: u64) -> Result<Self, AtsError> {
        info!("Downloading résumé from: {}", url);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AtsError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let response = client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AtsError::DownloadTimeout {
                    url: url.to_string(),
                    secs: timeout_secs,
                }
            } else {
                AtsError::DownloadFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        if !response.status().is_success() {
            return Err(AtsError::DownloadFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AtsError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        info!("Downloaded {} bytes", bytes.len());
        Ok(Self::from_bytes(bytes.to_vec())?.with_name(filename_from_url(url)))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load a résumé from a path or an HTTP(S) URL.
pub async fn load_document(input: &str, timeout_secs: u64) -> Result<UploadedDocument, AtsError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AtsError::missing("résumé path"));
    }
    if is_url(input) {
        UploadedDocument::from_url(input, timeout_secs).await
    } else if input.contains("://") {
        Err(AtsError::InvalidInput {
            input: input.to_string(),
        })
    } else {
        UploadedDocument::from_path(input)
    }
}

fn check_magic(bytes: &[u8]) -> Result<(), AtsError> {
    if bytes.len() < PDF_MAGIC.len() || &bytes[..PDF_MAGIC.len()] != PDF_MAGIC {
        return Err(AtsError::NotAPdf {
            magic: bytes.iter().take(PDF_MAGIC.len()).copied().collect(),
        });
    }
    Ok(())
}

fn io_error(path: &Path, e: std::io::Error) -> AtsError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => AtsError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => AtsError::FileNotFound {
            path: PathBuf::from(path),
        },
    }
}

/// Last non-empty URL path segment, or `resume.pdf`.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty())
        .unwrap_or_else(|| "resume.pdf".to_string())
}
