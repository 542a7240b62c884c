//! Configuration for an extraction run.
//!
//! Every knob lives in [`ExtractionConfig`], built via its builder. One
//! struct makes it trivial to share a config across pages, log it, and diff
//! two runs to understand why their outputs differ.

use crate::error::ExtractError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Configuration for a document extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2invoice::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .zoom(2.0)
///     .pacing_delay_ms(1000)
///     .model("gemini-2.0-flash")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Uniform render scale applied to every page. Default: 3.0.
    ///
    /// 3x is enough for a vision model to read small print on a scanned
    /// invoice; lower it for very large pages where upload size matters.
    pub zoom: f32,

    /// Fixed delay between successive model calls, in milliseconds.
    /// Default: 2000.
    ///
    /// This is a hard sequencing requirement, not an optimisation: the
    /// provider's request-rate limit assumes one paced call at a time.
    /// Concurrent page fan-out would violate it, which is why the pipeline
    /// is strictly sequential.
    pub pacing_delay_ms: u64,

    /// Maximum retry attempts on a transient model failure. Default: 2.
    ///
    /// Timeouts, 429s and 5xx responses are retried with exponential
    /// backoff. Auth failures and unparseable responses are not; retrying
    /// those cannot succeed.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (doubles per attempt). Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-model-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Model identifier, e.g. "gemini-2.0-flash". Default: "gemini-2.0-flash".
    pub model: String,

    /// Model API key. When `None`, [`crate::provider::GeminiClient::from_config`]
    /// reads `GEMINI_API_KEY` / `GOOGLE_API_KEY` from the environment.
    pub api_key: Option<String>,

    /// Directory the CSV artifact is written into. Default: current directory.
    pub artifact_dir: PathBuf,

    /// Net payment terms, in days, used to derive a due date before
    /// validation. Default: 30.
    pub net_days: i64,

    /// Custom extraction instruction. If `None`, uses
    /// [`crate::prompts::extraction_prompt`].
    pub prompt: Option<String>,

    /// Progress callback fired at per-page boundaries. Default: none.
    pub progress_callback: Option<ProgressCallback>,

    /// Cooperative cancellation flag, checked before each page. A cancelled
    /// run finalizes with the records gathered so far.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            zoom: 3.0,
            pacing_delay_ms: 2000,
            max_retries: 2,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            artifact_dir: PathBuf::from("."),
            net_days: 30,
            prompt: None,
            progress_callback: None,
            cancel: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("zoom", &self.zoom)
            .field("pacing_delay_ms", &self.pacing_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("artifact_dir", &self.artifact_dir)
            .field("net_days", &self.net_days)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Whether the cancel flag has been raised.
    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn zoom(mut self, zoom: f32) -> Self {
        self.config.zoom = zoom.clamp(0.5, 6.0);
        self
    }

    pub fn pacing_delay_ms(mut self, ms: u64) -> Self {
        self.config.pacing_delay_ms = ms;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.artifact_dir = dir.into();
        self
    }

    pub fn net_days(mut self, days: i64) -> Self {
        self.config.net_days = days;
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.config.progress_callback = Some(callback);
        self
    }

    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.config.cancel = Some(flag);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if !c.zoom.is_finite() || c.zoom <= 0.0 {
            return Err(ExtractError::InvalidConfig(format!(
                "zoom must be a positive scale factor, got {}",
                c.zoom
            )));
        }
        if c.model.is_empty() {
            return Err(ExtractError::InvalidConfig("model id must not be empty".into()));
        }
        if c.net_days < 0 {
            return Err(ExtractError::InvalidConfig(format!(
                "net_days must not be negative, got {}",
                c.net_days
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = ExtractionConfig::default();
        assert_eq!(c.zoom, 3.0);
        assert_eq!(c.pacing_delay_ms, 2000);
        assert_eq!(c.max_retries, 2);
        assert_eq!(c.model, "gemini-2.0-flash");
        assert_eq!(c.net_days, 30);
        assert!(!c.is_cancelled());
    }

    #[test]
    fn builder_clamps_zoom() {
        let c = ExtractionConfig::builder().zoom(0.01).build().unwrap();
        assert_eq!(c.zoom, 0.5);
        let c = ExtractionConfig::builder().zoom(50.0).build().unwrap();
        assert_eq!(c.zoom, 6.0);
    }

    #[test]
    fn build_rejects_negative_net_days() {
        let err = ExtractionConfig::builder().net_days(-1).build();
        assert!(matches!(err, Err(ExtractError::InvalidConfig(_))));
    }

    #[test]
    fn cancel_flag_is_observed() {
        let flag = Arc::new(AtomicBool::new(false));
        let c = ExtractionConfig::builder()
            .cancel_flag(Arc::clone(&flag))
            .build()
            .unwrap();
        assert!(!c.is_cancelled());
        flag.store(true, Ordering::Relaxed);
        assert!(c.is_cancelled());
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = ExtractionConfig::builder().api_key("secret").build().unwrap();
        let shown = format!("{c:?}");
        assert!(!shown.contains("secret"));
        assert!(shown.contains("redacted"));
    }
}
