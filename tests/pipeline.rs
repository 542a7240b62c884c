//! Integration tests for the per-page pipeline loop.
//!
//! The model is a scripted in-process double and the "rendered" pages are
//! tiny JPEGs written to a temp directory, so these tests exercise encode →
//! extract → normalize → artifact without a network or a pdfium binding.

use async_trait::async_trait;
use pdf2invoice::{
    extract_pages, write_records, ExtractionConfig, ImagePayload, InvoiceStore, MemoryStore,
    ModelError, PageError, PageImage, VisionModel,
};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test doubles and fixtures ────────────────────────────────────────────────

/// Replays a fixed script of responses, one per model call.
struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String, ModelError>>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    fn new(responses: Vec<Result<String, ModelError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionModel for ScriptedModel {
    async fn generate(&self, _image: &ImagePayload, _prompt: &str) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("model called more times than scripted")
    }
}

fn rendered_page(dir: &Path, page_number: usize) -> PageImage {
    let path = dir.join(format!("page_{page_number}.jpg"));
    image::RgbImage::from_pixel(8, 8, image::Rgb([230, 230, 230]))
        .save_with_format(&path, image::ImageFormat::Jpeg)
        .expect("write page image");
    PageImage { page_number, path }
}

fn fast_config() -> ExtractionConfig {
    ExtractionConfig::builder()
        .pacing_delay_ms(1)
        .retry_backoff_ms(1)
        .max_retries(0)
        .build()
        .unwrap()
}

fn page_one_json() -> String {
    r#"{
        "Invoice Number / Bill No.": "INV-2024-17",
        "Date": "05/03/2024",
        "Seller": "Acme Traders",
        "Items or Desciption of Goods Details": "Cement, Sand",
        "Quantity": "10, 5",
        "Rate of Goods": "350, 40",
        "Total Gst Amount": "612",
        "Total Amount": "4262"
    }"#
    .to_string()
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn transport_error_skips_the_page_but_not_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let pages = vec![rendered_page(dir.path(), 1), rendered_page(dir.path(), 2)];

    let model = ScriptedModel::new(vec![
        Ok(page_one_json()),
        Err(ModelError::Network("connection reset".into())),
    ]);
    let shared: Arc<dyn VisionModel> = model.clone();

    let (records, skipped) = extract_pages(&shared, &pages, &fast_config()).await;

    assert_eq!(records.len(), 1, "page 2 must be absent, not fatal");
    assert_eq!(records[0].page_number, 1);
    assert_eq!(records[0].invoice_number, "INV-2024-17");
    assert_eq!(skipped.len(), 1);
    assert!(matches!(skipped[0], PageError::ModelFailed { page: 2, .. }));

    // the artifact is still written for the partial run
    let artifact = write_records(&records, dir.path()).unwrap();
    assert!(artifact.exists());
    let name = artifact.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("invoice_details_") && name.ends_with(".csv"));

    let mut reader = csv::Reader::from_path(&artifact).unwrap();
    assert_eq!(reader.records().count(), 1);
}

#[tokio::test]
async fn fenced_response_is_stripped_and_amounts_coerced() {
    let dir = tempfile::tempdir().unwrap();
    let pages = vec![rendered_page(dir.path(), 1)];

    let fenced = "```json\n{\"Invoice Number / Bill No.\": \"INV-9\", \
                  \"Total Amount\": \"1200\", \"Total Gst Amount\": \"100\"}\n```";
    let shared: Arc<dyn VisionModel> = ScriptedModel::new(vec![Ok(fenced.to_string())]);

    let (records, skipped) = extract_pages(&shared, &pages, &fast_config()).await;

    assert!(skipped.is_empty());
    assert_eq!(records[0].total_amount, 1200.0);
    assert_eq!(records[0].tax_amount, 100.0);
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let dir = tempfile::tempdir().unwrap();
    let pages = vec![rendered_page(dir.path(), 1)];

    let model = ScriptedModel::new(vec![Err(ModelError::RateLimited), Ok(page_one_json())]);
    let shared: Arc<dyn VisionModel> = model.clone();

    let config = ExtractionConfig::builder()
        .pacing_delay_ms(1)
        .retry_backoff_ms(1)
        .max_retries(1)
        .build()
        .unwrap();

    let (records, skipped) = extract_pages(&shared, &pages, &config).await;

    assert_eq!(model.calls(), 2);
    assert_eq!(records.len(), 1);
    assert!(skipped.is_empty());
}

#[tokio::test]
async fn malformed_response_is_a_skip_not_a_retry() {
    let dir = tempfile::tempdir().unwrap();
    let pages = vec![rendered_page(dir.path(), 1)];

    let model = ScriptedModel::new(vec![Ok("the page is blurry, sorry".to_string())]);
    let shared: Arc<dyn VisionModel> = model.clone();

    let config = ExtractionConfig::builder()
        .pacing_delay_ms(1)
        .retry_backoff_ms(1)
        .max_retries(3)
        .build()
        .unwrap();

    let (records, skipped) = extract_pages(&shared, &pages, &config).await;

    assert_eq!(model.calls(), 1, "parse failures must not burn retries");
    assert!(records.is_empty());
    assert!(matches!(skipped[0], PageError::MalformedResponse { page: 1, .. }));
}

#[tokio::test]
async fn cancelled_run_calls_no_model() {
    let dir = tempfile::tempdir().unwrap();
    let pages = vec![rendered_page(dir.path(), 1), rendered_page(dir.path(), 2)];

    let cancel = Arc::new(AtomicBool::new(true));
    let config = ExtractionConfig::builder()
        .pacing_delay_ms(1)
        .cancel_flag(cancel)
        .build()
        .unwrap();

    let model = ScriptedModel::new(vec![]);
    let shared: Arc<dyn VisionModel> = model.clone();

    let (records, skipped) = extract_pages(&shared, &pages, &config).await;

    assert_eq!(model.calls(), 0);
    assert!(records.is_empty());
    assert!(skipped.is_empty());
}

#[tokio::test]
async fn extracted_records_hand_off_to_a_store() {
    let dir = tempfile::tempdir().unwrap();
    let pages = vec![rendered_page(dir.path(), 1)];
    let shared: Arc<dyn VisionModel> = ScriptedModel::new(vec![Ok(page_one_json())]);

    let (records, _) = extract_pages(&shared, &pages, &fast_config()).await;

    let store = MemoryStore::new();
    let stored = store.insert_many(records).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, 1);
    assert_eq!(stored[0].record.invoice_number, "INV-2024-17");
}
