//! # pdf2invoice
//!
//! Extract structured invoice records from scanned invoice PDFs using a
//! vision language model.
//!
//! ## Why this crate?
//!
//! Scanned invoices defeat classic OCR-plus-rules extraction: layouts vary
//! per supplier, tables wrap, stamps and handwriting overlap the print.
//! Instead this crate rasterises each page to a JPEG and asks a multimodal
//! model to fill a fixed 15-field template, then normalises the answers into
//! one canonical record per page. The model is treated as an inherently
//! unreliable classifier: the pipeline guarantees a consistent, recoverable
//! shape around it, not extraction accuracy.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Render     rasterise pages to page_<n>.jpg via pdfium (spawn_blocking)
//!  ├─ 2. Encode     JPEG → base64 payload
//!  ├─ 3. Extract    one paced model call per page, fence-strip, parse JSON
//!  ├─ 4. Normalize  template labels → canonical InvoiceRecord
//!  ├─ 5. Artifact   invoice_details_<timestamp>.csv
//!  └─ 6. Handoff    records + CSV location returned to the caller
//! ```
//!
//! Pages are processed strictly sequentially with a pacing delay between
//! model calls; one bad page degrades the result, never aborts it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2invoice::{process_document, ExtractionConfig, GeminiClient, VisionModel};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Key read from GEMINI_API_KEY / GOOGLE_API_KEY
//!     let config = ExtractionConfig::default();
//!     let model: Arc<dyn VisionModel> = Arc::new(GeminiClient::from_config(&config)?);
//!
//!     let (run, artifact) = process_document(model, "invoice.pdf", "pages", &config).await?;
//!     println!(
//!         "{} of {} pages extracted -> {}",
//!         run.stats.extracted_pages,
//!         run.stats.total_pages,
//!         artifact.display()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2invoice` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2invoice = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod artifact;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod provider;
pub mod record;
pub mod run;
pub mod store;
pub mod stream;
pub mod validate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use artifact::{write_records, CSV_COLUMNS};
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{ExtractError, PageError};
pub use output::{ExtractionRun, PageExtraction, RunStats};
pub use pipeline::render::PageImage;
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
pub use provider::{GeminiClient, ImagePayload, ModelError, VisionModel};
pub use record::{BuyerDetails, InvoiceRecord, PartyDetails, RawExtraction};
pub use run::{extract_pages, process_document, process_document_bytes};
pub use store::{InvoiceStore, MemoryStore, StoreError, StoredInvoice};
pub use stream::{extract_record_stream, RecordStream};
pub use validate::{validate, ReviewRecord, RuleViolation};
