//! Streaming extraction API: emit records as pages complete.
//!
//! The eager [`crate::run::process_document`] returns only after every page
//! has been attempted, which for a long document paced at two seconds per
//! model call can take minutes. This variant yields each page's outcome as
//! it finishes, so callers can display rows progressively or persist them
//! incrementally.
//!
//! Pages are still processed strictly in order with the pacing delay between
//! model calls; streaming changes when results become visible, not how the
//! provider is driven. No CSV artifact is written in this mode.

use crate::config::ExtractionConfig;
use crate::error::{ExtractError, PageError};
use crate::pipeline::{extract, normalize, render};
use crate::provider::VisionModel;
use crate::record::InvoiceRecord;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-page results, in page order.
pub type RecordStream = Pin<Box<dyn Stream<Item = Result<InvoiceRecord, PageError>> + Send>>;

/// Rasterise the document, then stream one result per page.
///
/// Fatal document errors surface immediately from this call; page-scoped
/// failures arrive as `Err(PageError)` items in the stream.
pub async fn extract_record_stream(
    model: Arc<dyn VisionModel>,
    pdf_path: impl AsRef<Path>,
    pages_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<RecordStream, ExtractError> {
    let pdf_path = pdf_path.as_ref();
    info!("Starting streaming extraction: {}", pdf_path.display());

    let pages = render::rasterize(pdf_path, pages_dir.as_ref(), config.zoom).await?;
    let config = config.clone();

    // `then` drives the futures one at a time, which is exactly the pacing
    // guarantee the provider requires.
    let s = stream::iter(pages.into_iter().enumerate()).then(move |(i, page)| {
        let model = Arc::clone(&model);
        let config = config.clone();
        async move {
            if i > 0 && config.pacing_delay_ms > 0 {
                sleep(Duration::from_millis(config.pacing_delay_ms)).await;
            }
            let outcome = extract::extract_fields(&model, &page, &config).await;
            match outcome.fields {
                Some(raw) => Ok(normalize::normalize(&raw, page.page_number)),
                None => Err(outcome.error.unwrap_or_else(|| PageError::ModelFailed {
                    page: page.page_number,
                    retries: outcome.retries,
                    detail: "no fields extracted".to_string(),
                })),
            }
        }
    });

    Ok(Box::pin(s))
}
