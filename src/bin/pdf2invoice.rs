//! CLI binary for pdf2invoice.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, runs the pipeline, and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2invoice::{
    process_document, validate, ExtractionConfig, GeminiClient, ProgressCallback, ReviewRecord,
    RunProgressCallback, VisionModel,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the run, a log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:40.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl RunProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_pages: usize) {
        self.bar.set_length(total_pages as u64);
        self.bar
            .println(bold(&format!("Processing {total_pages} pages…")));
    }

    fn on_page_start(&self, page_number: usize, _total: usize) {
        self.bar.set_message(format!("page {page_number}"));
    }

    fn on_page_extracted(&self, page_number: usize, total: usize) {
        self.bar
            .println(format!("  {} Page {:>3}/{:<3}", green("✓"), page_number, total));
        self.bar.inc(1);
    }

    fn on_page_skipped(&self, page_number: usize, total: usize, error: &str) {
        let msg = if error.len() > 80 {
            format!("{}\u{2026}", &error[..79])
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_number,
            total,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, _total: usize, _extracted: usize) {
        self.bar.finish_and_clear();
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

/// Extract structured invoice rows from a scanned PDF invoice.
#[derive(Parser, Debug)]
#[command(name = "pdf2invoice", version, about)]
struct Cli {
    /// Path to the invoice PDF
    input: PathBuf,

    /// Directory for rendered page images (created if absent)
    #[arg(long, default_value = "pages")]
    pages_dir: PathBuf,

    /// Directory the CSV artifact is written into
    #[arg(long, default_value = ".")]
    artifact_dir: PathBuf,

    /// Page render zoom factor
    #[arg(long, default_value_t = 3.0)]
    zoom: f32,

    /// Vision model identifier
    #[arg(long, default_value = "gemini-2.0-flash")]
    model: String,

    /// Model API key (falls back to GEMINI_API_KEY / GOOGLE_API_KEY)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Delay between model calls, in milliseconds
    #[arg(long, default_value_t = 2000)]
    pacing_ms: u64,

    /// Retries per page on transient model failures
    #[arg(long, default_value_t = 2)]
    retries: u32,

    /// Net payment terms (days) used to derive due dates during validation
    #[arg(long, default_value_t = 30)]
    net_days: i64,

    /// Validate extracted records and report rule violations
    #[arg(long)]
    validate: bool,

    /// Print the line items of each extracted record
    #[arg(long)]
    details: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut builder = ExtractionConfig::builder()
        .zoom(cli.zoom)
        .pacing_delay_ms(cli.pacing_ms)
        .max_retries(cli.retries)
        .model(&cli.model)
        .artifact_dir(&cli.artifact_dir)
        .net_days(cli.net_days)
        .progress_callback(CliProgressCallback::new() as ProgressCallback);
    if let Some(key) = &cli.api_key {
        builder = builder.api_key(key);
    }
    let config = builder.build().context("invalid configuration")?;

    let model: Arc<dyn VisionModel> =
        Arc::new(GeminiClient::from_config(&config).context("could not configure the model")?);

    let (run, artifact_path) = process_document(model, &cli.input, &cli.pages_dir, &config)
        .await
        .with_context(|| format!("extraction failed for '{}'", cli.input.display()))?;

    // ── Summary ──────────────────────────────────────────────────────────
    println!(
        "\n{} {} of {} pages extracted in {:.1}s",
        bold("Done:"),
        run.stats.extracted_pages,
        run.stats.total_pages,
        run.stats.total_duration_ms as f64 / 1000.0
    );
    println!("Artifact: {}", artifact_path.display());

    for record in &run.records {
        println!(
            "\n  {} {}  {}  {}",
            bold(&format!("Page {}", record.page_number)),
            record.invoice_number,
            record.supplier_details.name,
            dim(&format!("total {}", record.total_amount)),
        );

        if cli.details {
            for (item, qty, rate) in record.line_item_rows() {
                println!("      {item:<40} {qty:>8} {rate:>10}");
            }
        }

        if cli.validate {
            match validate(&ReviewRecord::with_terms(record, cli.net_days)) {
                Ok(()) => println!("      {}", green("valid")),
                Err(violations) => {
                    for v in violations {
                        println!("      {} {}", red("✗"), v);
                    }
                }
            }
        }
    }

    if !run.skipped.is_empty() {
        println!("\n{}", bold("Skipped pages:"));
        for err in &run.skipped {
            println!("  {} {}", red("✗"), err);
        }
    }

    Ok(())
}
