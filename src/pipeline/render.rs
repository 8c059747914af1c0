//! PDF rasterisation: render the first page to a `DynamicImage` via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which is blocking
//! and keeps thread-local state. `tokio::task::spawn_blocking` moves the work
//! onto the blocking pool so the runtime's worker threads keep serving I/O.
//!
//! ## Library binding
//!
//! Resolution order: explicit config path, `PDFIUM_LIB_PATH`, then the
//! platform system library. A path may name the library file itself or the
//! directory that holds it.

use crate::config::{AnalyzerConfig, MIN_RENDERED_PIXELS};
use crate::error::AtsError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Result of rasterising page one.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub image: DynamicImage,
    /// Pages in the whole document (only the first was rendered).
    pub page_count: usize,
}

/// Rasterise the first page of an in-memory PDF.
pub async fn render_first_page(
    bytes: Vec<u8>,
    config: &AnalyzerConfig,
) -> Result<RenderedPage, AtsError> {
    let lib_path = library_path(config);
    let max_pixels = render_budget(config);
    let password = config.password.clone();

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium(lib_path.as_deref())?;
        render_first_page_blocking(&pdfium, &bytes, max_pixels, password.as_deref())
    })
    .await
    .map_err(|e| AtsError::Internal(format!("Render task panicked: {}", e)))?
}

/// Count pages without rendering anything.
pub async fn page_count(bytes: Vec<u8>, config: &AnalyzerConfig) -> Result<usize, AtsError> {
    let lib_path = library_path(config);
    let password = config.password.clone();

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium(lib_path.as_deref())?;
        let document = load(&pdfium, &bytes, password.as_deref())?;
        Ok(document.pages().len() as usize)
    })
    .await
    .map_err(|e| AtsError::Internal(format!("Page-count task panicked: {}", e)))?
}

/// Longest rendered side, never below [`MIN_RENDERED_PIXELS`] even for a
/// hand-built config.
fn render_budget(config: &AnalyzerConfig) -> u32 {
    config.max_rendered_pixels.max(MIN_RENDERED_PIXELS)
}

fn library_path(config: &AnalyzerConfig) -> Option<PathBuf> {
    config.pdfium_lib_path.clone().or_else(|| {
        std::env::var("PDFIUM_LIB_PATH")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    })
}

/// Bind to pdfium at `path`, or to the system library when `None`.
///
/// `path` may name the library file or the directory that holds it.
pub fn bind_pdfium(path: Option<&Path>) -> Result<Pdfium, AtsError> {
    let bindings = match path {
        Some(p) if p.is_dir() => {
            debug!("Binding pdfium from directory {}", p.display());
            let lib = Pdfium::pdfium_platform_library_name_at_path(p.to_string_lossy().as_ref());
            Pdfium::bind_to_library(&lib)
        }
        Some(p) => {
            debug!("Binding pdfium from {}", p.display());
            Pdfium::bind_to_library(p)
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| AtsError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

fn load<'a>(
    pdfium: &'a Pdfium,
    bytes: &'a [u8],
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, AtsError> {
    pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(load_error)
}

fn load_error(e: PdfiumError) -> AtsError {
    match e {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            AtsError::PasswordRequired
        }
        other => AtsError::DocumentParse {
            detail: format!("{:?}", other),
        },
    }
}

fn require_pages(page_count: usize) -> Result<(), AtsError> {
    if page_count == 0 {
        return Err(AtsError::EmptyDocument);
    }
    Ok(())
}

/// Blocking implementation of first-page rendering.
fn render_first_page_blocking(
    pdfium: &Pdfium,
    bytes: &[u8],
    max_pixels: u32,
    password: Option<&str>,
) -> Result<RenderedPage, AtsError> {
    let document = load(pdfium, bytes, password)?;

    let pages = document.pages();
    let page_count = pages.len() as usize;
    info!("PDF loaded: {} pages", page_count);

    require_pages(page_count)?;

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let page = pages.get(0).map_err(|e| AtsError::RasterisationFailed {
        page: 1,
        detail: format!("{:?}", e),
    })?;

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| AtsError::RasterisationFailed {
            page: 1,
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    debug!("Rendered page 1 → {}x{} px", image.width(), image.height());

    Ok(RenderedPage { image, page_count })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_password_maps_to_password_required() {
        let err = load_error(PdfiumError::PdfiumLibraryInternalError(
            PdfiumInternalError::PasswordError,
        ));
        assert!(matches!(err, AtsError::PasswordRequired));
    }

    #[test]
    fn other_load_failures_are_parse_errors() {
        let err = load_error(PdfiumError::PdfiumLibraryInternalError(
            PdfiumInternalError::FormatError,
        ));
        assert!(matches!(err, AtsError::DocumentParse { .. }), "{err:?}");
    }

    #[test]
    fn zero_pages_is_empty_document() {
        assert!(matches!(require_pages(0), Err(AtsError::EmptyDocument)));
        assert!(require_pages(1).is_ok());
    }

    #[test]
    fn empty_library_directory_fails_to_bind() {
        let dir = tempfile::tempdir().unwrap();
        let err = bind_pdfium(Some(dir.path())).err().expect("no library in an empty dir");
        assert!(matches!(err, AtsError::PdfiumBindingFailed(_)), "{err:?}");
    }

    #[test]
    fn render_budget_has_a_floor() {
        let config = AnalyzerConfig {
            max_rendered_pixels: 0,
            ..AnalyzerConfig::default()
        };
        assert_eq!(render_budget(&config), MIN_RENDERED_PIXELS);
        assert_eq!(render_budget(&AnalyzerConfig::default()), 2000);
    }
}
