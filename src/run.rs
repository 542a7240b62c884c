//! Pipeline orchestration: the eager, whole-document entry points.
//!
//! ## Sequencing
//!
//! Pages are processed strictly one at a time. The pacing delay between
//! model calls exists to respect the provider's request rate, so concurrent
//! fan-out across pages is not an option here; use
//! [`crate::stream::extract_record_stream`] when you want records
//! progressively rather than all at once.
//!
//! ## Failure semantics
//!
//! A rasterisation failure aborts the run. A per-page extraction failure is
//! logged, recorded on [`ExtractionRun::skipped`], and the page is absent
//! from the result. A run that opens its document always returns a result,
//! possibly partial or empty.

use crate::artifact;
use crate::config::ExtractionConfig;
use crate::error::{ExtractError, PageError};
use crate::output::{ExtractionRun, RunStats};
use crate::pipeline::{extract, normalize, render};
use crate::provider::VisionModel;
use crate::record::InvoiceRecord;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Run the full pipeline over one document.
///
/// Rasterises every page into `pages_dir`, extracts and normalises each page
/// in order with the configured pacing delay between model calls, writes the
/// CSV artifact, and returns the in-memory run together with the artifact
/// location.
///
/// # Errors
/// Returns `Err(ExtractError)` only for document-level failures: the source
/// cannot be opened as a PDF, a page fails to rasterise, or the artifact
/// cannot be written. Model and parse failures degrade to skipped pages.
pub async fn process_document(
    model: Arc<dyn VisionModel>,
    pdf_path: impl AsRef<Path>,
    pages_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<(ExtractionRun, PathBuf), ExtractError> {
    let pdf_path = pdf_path.as_ref();
    let total_start = Instant::now();
    info!("Starting extraction run: {}", pdf_path.display());

    // ── Step 1: Rasterise ────────────────────────────────────────────────
    let render_start = Instant::now();
    let pages = render::rasterize(pdf_path, pages_dir.as_ref(), config.zoom).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!("Rasterised {} pages in {}ms", pages.len(), render_duration_ms);

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(pages.len());
    }

    // ── Step 2: Extract and normalise, page by page ──────────────────────
    let model_start = Instant::now();
    let (records, skipped) = extract_pages(&model, &pages, config).await;
    let model_duration_ms = model_start.elapsed().as_millis() as u64;

    let stats = RunStats {
        total_pages: pages.len(),
        extracted_pages: records.len(),
        failed_pages: skipped.len(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        render_duration_ms,
        model_duration_ms,
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(stats.total_pages, stats.extracted_pages);
    }

    let run = ExtractionRun {
        records,
        skipped,
        stats,
    };

    // ── Step 3: Persist the artifact ─────────────────────────────────────
    let artifact_path = artifact::write_records(&run.records, &config.artifact_dir)?;

    info!(
        "Run complete: {}/{} pages extracted, artifact {}",
        run.stats.extracted_pages,
        run.stats.total_pages,
        artifact_path.display()
    );

    Ok((run, artifact_path))
}

/// Run the pipeline over PDF bytes already in memory.
///
/// This is the entry point for upload boundaries that receive the document
/// as a body rather than a path. The bytes are written to a managed
/// [`tempfile`] which is cleaned up automatically on return or panic.
pub async fn process_document_bytes(
    model: Arc<dyn VisionModel>,
    bytes: &[u8],
    pages_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<(ExtractionRun, PathBuf), ExtractError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| ExtractError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| ExtractError::Internal(format!("tempfile write: {e}")))?;
    // `tmp` is dropped (and the file deleted) when this call returns
    process_document(model, tmp.path(), pages_dir, config).await
}

/// The per-page extraction loop over already-rendered pages.
///
/// Building block for callers that rasterise separately (and for tests,
/// which script the model and feed pre-rendered page images). Enforces the
/// pacing delay between successive model calls and honours the cancel flag
/// at the page boundary.
pub async fn extract_pages(
    model: &Arc<dyn VisionModel>,
    pages: &[render::PageImage],
    config: &ExtractionConfig,
) -> (Vec<InvoiceRecord>, Vec<PageError>) {
    let total = pages.len();
    let mut records = Vec::with_capacity(total);
    let mut skipped = Vec::new();

    for (i, page) in pages.iter().enumerate() {
        if config.is_cancelled() {
            info!("Run cancelled after {} of {} pages", i, total);
            break;
        }

        if i > 0 && config.pacing_delay_ms > 0 {
            debug!(
                "Pacing delay {}ms before page {}",
                config.pacing_delay_ms, page.page_number
            );
            sleep(Duration::from_millis(config.pacing_delay_ms)).await;
        }

        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page.page_number, total);
        }

        let outcome = extract::extract_fields(model, page, config).await;

        match outcome.fields {
            Some(raw) => {
                let record = normalize::normalize(&raw, page.page_number);
                debug!(
                    "Page {}: extracted invoice '{}' in {}ms",
                    page.page_number, record.invoice_number, outcome.duration_ms
                );
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_extracted(page.page_number, total);
                }
                records.push(record);
            }
            None => {
                let error = outcome.error.unwrap_or_else(|| PageError::ModelFailed {
                    page: page.page_number,
                    retries: outcome.retries,
                    detail: "no fields extracted".to_string(),
                });
                warn!("Page {} skipped: {}", page.page_number, error);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_skipped(page.page_number, total, &error.to_string());
                }
                skipped.push(error);
            }
        }
    }

    (records, skipped)
}
