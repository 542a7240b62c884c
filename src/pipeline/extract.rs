//! Field extraction: one model call per page, fence-stripped and parsed.
//!
//! This stage is intentionally thin over the [`VisionModel`] seam; the prompt
//! lives in [`crate::prompts`] so it can change without touching retry or
//! error handling here.
//!
//! ## Failure policy
//!
//! The function fails closed. Transport failures, timeouts, and unparseable
//! responses all end as a [`PageExtraction`] carrying an error and no fields.
//! Nothing propagates upward: one bad page must never abort the run, and the
//! typed absence makes that contract visible in the signature.
//!
//! ## Retry strategy
//!
//! Transient transport errors (429, 5xx, timeouts, connection resets) are
//! retried with exponential backoff (`retry_backoff_ms * 2^attempt`).
//! Authentication failures and malformed responses are not retried; the
//! first cannot succeed and the second already consumed a model answer.

use crate::config::ExtractionConfig;
use crate::error::PageError;
use crate::output::PageExtraction;
use crate::pipeline::{encode, render::PageImage};
use crate::prompts;
use crate::provider::{ModelError, VisionModel};
use crate::record::RawExtraction;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::warn;

/// Extract the template fields from a single rendered page.
///
/// Always returns a [`PageExtraction`]; callers check `fields` to decide
/// whether the page contributes a record.
pub async fn extract_fields(
    model: &Arc<dyn VisionModel>,
    page: &PageImage,
    config: &ExtractionConfig,
) -> PageExtraction {
    let start = Instant::now();
    let page_num = page.page_number;

    let payload = match encode::encode_jpeg_file(&page.path) {
        Ok(p) => p,
        Err(e) => {
            return PageExtraction::failed(
                page_num,
                0,
                start.elapsed(),
                PageError::ImageUnreadable {
                    page: page_num,
                    detail: e.to_string(),
                },
            )
        }
    };

    let prompt = config
        .prompt
        .clone()
        .unwrap_or_else(prompts::extraction_prompt);

    let mut last_err: Option<ModelError> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "Page {}: retry {}/{} after {}ms",
                page_num, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match model.generate(&payload, &prompt).await {
            Ok(text) => {
                return match parse_response(&text, page_num) {
                    Ok(raw) => {
                        PageExtraction::extracted(page_num, attempt as u8, start.elapsed(), raw)
                    }
                    Err(e) => {
                        warn!("Page {}: {}", page_num, e);
                        PageExtraction::failed(page_num, attempt as u8, start.elapsed(), e)
                    }
                };
            }
            Err(ModelError::Auth(detail)) => {
                warn!("Page {}: authentication rejected, not retrying", page_num);
                return PageExtraction::failed(
                    page_num,
                    attempt as u8,
                    start.elapsed(),
                    PageError::ModelFailed {
                        page: page_num,
                        retries: attempt as u8,
                        detail,
                    },
                );
            }
            Err(e) => {
                warn!("Page {}: attempt {} failed: {}", page_num, attempt + 1, e);
                last_err = Some(e);
            }
        }
    }

    // All retries exhausted
    let retries = config.max_retries as u8;
    let error = match last_err {
        Some(ModelError::Timeout { secs }) => PageError::Timeout {
            page: page_num,
            secs,
        },
        other => PageError::ModelFailed {
            page: page_num,
            retries,
            detail: other
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string()),
        },
    };

    PageExtraction::failed(page_num, retries, start.elapsed(), error)
}

/// Strip the code-fence markers models wrap JSON in despite instructions.
///
/// Removes the literal ```` ```json ```` and ```` ``` ```` substrings and
/// trims the remainder.
pub fn strip_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse a fence-stripped model response into the template mapping.
fn parse_response(text: &str, page: usize) -> Result<RawExtraction, PageError> {
    let cleaned = strip_fences(text);
    let value: serde_json::Value =
        serde_json::from_str(&cleaned).map_err(|e| PageError::MalformedResponse {
            page,
            detail: format!("model output is not JSON: {e}"),
        })?;
    RawExtraction::from_json(value).ok_or_else(|| PageError::MalformedResponse {
        page,
        detail: "model output is not a JSON object".to_string(),
    })
}
