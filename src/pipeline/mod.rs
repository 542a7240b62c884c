//! Pipeline stages for invoice extraction.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap an
//! implementation (e.g. a different rendering backend) without touching the
//! others.
//!
//! ## Data Flow
//!
//! ```text
//! document ──▶ render ──▶ encode ──▶ extract ──▶ normalize
//! (PDF path)   (pdfium)   (base64)   (VLM+parse)  (canonical record)
//! ```
//!
//! 1. [`render`]    — rasterise every page to a numbered JPEG; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 2. [`encode`]    — read a page JPEG and base64-wrap it for the multimodal
//!    request body
//! 3. [`extract`]   — drive the model call with retry/backoff, strip fences,
//!    parse the template JSON; the only stage with network I/O. Fails closed:
//!    a bad page yields a typed absence, never an error that aborts the run
//! 4. [`normalize`] — map template labels to the canonical record, split the
//!    comma-joined list fields, coerce amounts

pub mod encode;
pub mod extract;
pub mod normalize;
pub mod render;
