//! Progress-callback trait for per-page run events.
//!
//! Inject an `Arc<dyn RunProgressCallback>` via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through a document. Callbacks are the
//! least-invasive integration point: the CLI forwards them to a terminal
//! progress bar, a service might forward them to a job-status row, and the
//! library knows nothing about either.

use std::sync::Arc;

/// Called by the orchestrator at the per-page boundaries of a run.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The pipeline is sequential, so implementations are
/// never called concurrently, but `Send + Sync` is still required because
/// the callback crosses task boundaries.
pub trait RunProgressCallback: Send + Sync {
    /// Called once after rasterisation, before any model call.
    fn on_run_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before the model request for a page is sent.
    fn on_page_start(&self, page_number: usize, total_pages: usize) {
        let _ = (page_number, total_pages);
    }

    /// Called when a page produced a record.
    fn on_page_extracted(&self, page_number: usize, total_pages: usize) {
        let _ = (page_number, total_pages);
    }

    /// Called when a page is skipped after its extraction failed.
    fn on_page_skipped(&self, page_number: usize, total_pages: usize, error: &str) {
        let _ = (page_number, total_pages, error);
    }

    /// Called once after the last page has been attempted.
    fn on_run_complete(&self, total_pages: usize, extracted: usize) {
        let _ = (total_pages, extracted);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in
/// [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        extracted: AtomicUsize,
        skipped: AtomicUsize,
        final_count: AtomicUsize,
    }

    impl RunProgressCallback for TrackingCallback {
        fn on_page_extracted(&self, _page: usize, _total: usize) {
            self.extracted.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_skipped(&self, _page: usize, _total: usize, _error: &str) {
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }

        fn on_run_complete(&self, _total: usize, extracted: usize) {
            self.final_count.store(extracted, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(3);
        cb.on_page_start(1, 3);
        cb.on_page_extracted(1, 3);
        cb.on_page_skipped(2, 3, "model timeout");
        cb.on_run_complete(3, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            extracted: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            final_count: AtomicUsize::new(0),
        };

        tracker.on_run_start(2);
        tracker.on_page_start(1, 2);
        tracker.on_page_extracted(1, 2);
        tracker.on_page_start(2, 2);
        tracker.on_page_skipped(2, 2, "network error");
        tracker.on_run_complete(2, 1);

        assert_eq!(tracker.extracted.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.skipped.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.final_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn RunProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_run_start(10);
        cb.on_page_extracted(1, 10);
    }
}
