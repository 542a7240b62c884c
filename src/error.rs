//! Error types for the pdf2invoice library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`] — **Fatal**: the extraction run cannot proceed at all
//!   (missing file, not a PDF, no model credentials). Returned as
//!   `Err(ExtractError)` from the top-level `process_document*` functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page failed (unreadable image,
//!   transient model error, unparseable response) but the run carries on.
//!   Stored inside [`crate::output::PageExtraction`] and
//!   [`crate::output::ExtractionRun::skipped`] so callers can inspect
//!   partial success rather than losing the whole document to one bad page.
//!
//! Only document-level failures escalate; everything page-scoped degrades to
//! "fewer records produced".

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2invoice library.
///
/// Page-level failures use [`PageError`] and are collected on the run
/// result rather than propagated here.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Document errors ───────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and the document cannot be opened.
    #[error("Could not open PDF '{path}': {detail}")]
    DocumentOpen { path: PathBuf, detail: String },

    /// pdfium returned an error while rendering a specific page.
    ///
    /// Page-scoped, but the orchestrator treats any rasterisation failure as
    /// run-fatal: downstream page numbering depends on a complete render.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    // ── Model errors ──────────────────────────────────────────────────────
    /// No API key available for the vision model.
    #[error(
        "No model API key configured.\n\
         Set GEMINI_API_KEY or GOOGLE_API_KEY, or pass a key via ExtractionConfig."
    )]
    ModelNotConfigured,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the CSV artifact.
    #[error("Failed to write artifact '{path}': {detail}")]
    ArtifactWriteFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Stored alongside [`crate::output::PageExtraction`] when a page fails.
/// The run always completes; a page carrying one of these errors is simply
/// absent from the record sequence.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The rendered page image could not be read back from disk.
    #[error("Page {page}: page image unreadable: {detail}")]
    ImageUnreadable { page: usize, detail: String },

    /// Model call failed after retries.
    #[error("Page {page}: model call failed after {retries} retries: {detail}")]
    ModelFailed {
        page: usize,
        retries: u8,
        detail: String,
    },

    /// The model answered, but the response was not parseable as the
    /// expected JSON template.
    #[error("Page {page}: malformed model response: {detail}")]
    MalformedResponse { page: usize, detail: String },

    /// Model call timed out.
    #[error("Page {page}: model call timed out after {secs}s")]
    Timeout { page: usize, secs: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_failed_display() {
        let e = ExtractError::RenderFailed {
            page: 3,
            detail: "bitmap allocation".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("page 3"), "got: {msg}");
    }

    #[test]
    fn not_a_pdf_display() {
        let e = ExtractError::NotAPdf {
            path: PathBuf::from("/tmp/x.pdf"),
            magic: *b"PK\x03\x04",
        };
        assert!(e.to_string().contains("/tmp/x.pdf"));
    }

    #[test]
    fn model_not_configured_hints_env_vars() {
        let msg = ExtractError::ModelNotConfigured.to_string();
        assert!(msg.contains("GEMINI_API_KEY"));
        assert!(msg.contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn page_error_display() {
        let e = PageError::ModelFailed {
            page: 2,
            retries: 3,
            detail: "HTTP 500".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Page 2"));
        assert!(msg.contains("3 retries"));
    }

    #[test]
    fn timeout_display() {
        let e = PageError::Timeout { page: 1, secs: 60 };
        assert!(e.to_string().contains("60s"));
    }
}
