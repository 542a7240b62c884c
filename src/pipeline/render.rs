//! PDF rasterisation: render every page to a numbered JPEG via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, preventing the Tokio worker
//! threads from stalling during CPU-heavy rendering.
//!
//! ## Ordering contract
//!
//! The returned references are in strictly increasing page order and each
//! file is named `page_<n>.jpg` with a 1-based `n` matching the document.
//! Downstream `page_number` tagging depends on this, so ordering is part of
//! the contract, not an implementation detail.

use crate::error::ExtractError;
use image::ImageFormat;
use pdfium_render::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A reference to one rendered page, owned by the run until consumed by the
/// extractor. The caller owns cleanup of the files.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-based page number.
    pub page_number: usize,
    /// Location of the written JPEG.
    pub path: PathBuf,
}

/// File name for a rendered page, 1-based.
pub(crate) fn page_file_name(page_number: usize) -> String {
    format!("page_{page_number}.jpg")
}

/// Rasterise every page of a PDF into `output_dir`, creating it if absent.
///
/// Runs inside `spawn_blocking` since pdfium operations are CPU-bound.
/// The document handle is released when rendering finishes or on the first
/// failure.
///
/// # Errors
/// * [`ExtractError::FileNotFound`] / [`ExtractError::PermissionDenied`] /
///   [`ExtractError::NotAPdf`] when the source cannot be read as a PDF
/// * [`ExtractError::DocumentOpen`] when pdfium rejects the document
/// * [`ExtractError::RenderFailed`] when a single page fails to render or
///   its JPEG cannot be written
pub async fn rasterize(
    pdf_path: &Path,
    output_dir: &Path,
    zoom: f32,
) -> Result<Vec<PageImage>, ExtractError> {
    let path = pdf_path.to_path_buf();
    let out = output_dir.to_path_buf();

    tokio::task::spawn_blocking(move || rasterize_blocking(&path, &out, zoom))
        .await
        .map_err(|e| ExtractError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of page rendering.
fn rasterize_blocking(
    pdf_path: &Path,
    output_dir: &Path,
    zoom: f32,
) -> Result<Vec<PageImage>, ExtractError> {
    check_pdf_readable(pdf_path)?;

    std::fs::create_dir_all(output_dir).map_err(|e| {
        ExtractError::Internal(format!(
            "Could not create output directory '{}': {}",
            output_dir.display(),
            e
        ))
    })?;

    let pdfium = Pdfium::default();

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| ExtractError::DocumentOpen {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let render_config = PdfRenderConfig::new().scale_page_by_factor(zoom);

    let mut results = Vec::with_capacity(total_pages);

    for idx in 0..total_pages {
        let page_number = idx + 1;

        let page = pages
            .get(idx as u16)
            .map_err(|e| ExtractError::RenderFailed {
                page: page_number,
                detail: format!("{:?}", e),
            })?;

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| ExtractError::RenderFailed {
                page: page_number,
                detail: format!("{:?}", e),
            })?;

        // JPEG has no alpha channel; flatten before encoding.
        let image = bitmap.as_image().to_rgb8();
        let out_path = output_dir.join(page_file_name(page_number));
        image
            .save_with_format(&out_path, ImageFormat::Jpeg)
            .map_err(|e| ExtractError::RenderFailed {
                page: page_number,
                detail: format!("JPEG encoding failed: {}", e),
            })?;

        debug!(
            "Rendered page {} -> {} ({}x{} px)",
            page_number,
            out_path.display(),
            image.width(),
            image.height()
        );

        results.push(PageImage {
            page_number,
            path: out_path,
        });
    }

    Ok(results)
}

/// Validate existence, read permission, and the `%PDF` magic bytes before
/// handing the file to pdfium.
fn check_pdf_readable(path: &Path) -> Result<(), ExtractError> {
    if !path.exists() {
        return Err(ExtractError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(ExtractError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(ExtractError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(ExtractError::FileNotFound {
            path: path.to_path_buf(),
        }),
    }
}
