//! Run output types: per-page outcomes and the finalized extraction run.

use crate::error::PageError;
use crate::record::{InvoiceRecord, RawExtraction};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The typed outcome of one per-page model invocation.
///
/// Always produced, never an `Err`: a page that failed carries `error` and an
/// absent `fields`, making the non-fatal contract explicit in the type rather
/// than relying on exception interception.
#[derive(Debug, Clone)]
pub struct PageExtraction {
    /// 1-based page number.
    pub page_number: usize,
    /// The parsed template mapping, or `None` when the page failed.
    pub fields: Option<RawExtraction>,
    /// Wall-clock time spent on this page, including retries.
    pub duration_ms: u64,
    /// Retry attempts consumed before the final outcome.
    pub retries: u8,
    /// Set when the page failed; `fields` is `None` in that case.
    pub error: Option<PageError>,
}

impl PageExtraction {
    pub fn extracted(
        page_number: usize,
        retries: u8,
        duration: Duration,
        fields: RawExtraction,
    ) -> Self {
        Self {
            page_number,
            fields: Some(fields),
            duration_ms: duration.as_millis() as u64,
            retries,
            error: None,
        }
    }

    pub fn failed(page_number: usize, retries: u8, duration: Duration, error: PageError) -> Self {
        Self {
            page_number,
            fields: None,
            duration_ms: duration.as_millis() as u64,
            retries,
            error: Some(error),
        }
    }
}

/// Aggregate statistics for one extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Pages rasterised from the document.
    pub total_pages: usize,
    /// Pages that produced a record.
    pub extracted_pages: usize,
    /// Pages skipped on model or parse failure.
    pub failed_pages: usize,
    /// End-to-end run duration.
    pub total_duration_ms: u64,
    /// Time spent rasterising.
    pub render_duration_ms: u64,
    /// Time spent in model calls and pacing.
    pub model_duration_ms: u64,
}

/// The ordered record sequence produced from one document, plus the per-page
/// failures that kept pages out of it.
#[derive(Debug, Clone, Default)]
pub struct ExtractionRun {
    /// Records in page order. A failed page is simply absent.
    pub records: Vec<InvoiceRecord>,
    /// Page-scoped errors for the pages that produced no record.
    pub skipped: Vec<PageError>,
    pub stats: RunStats,
}
