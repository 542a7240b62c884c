//! Data model: the raw template mapping and the canonical invoice record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The extractor's parsed-but-unmapped output: a mapping from template label
/// to whatever value the model produced for it.
///
/// Values are kept as raw JSON (the model sometimes answers numbers unquoted)
/// and the [`ABSENT_SENTINEL`](crate::prompts::ABSENT_SENTINEL) survives
/// until normalisation. Ephemeral: consumed by
/// [`crate::pipeline::normalize::normalize`] immediately after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawExtraction {
    fields: serde_json::Map<String, Value>,
}

impl RawExtraction {
    /// Wrap a parsed model response. Returns `None` unless the value is a
    /// JSON object.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Look up the raw value for a template label.
    pub fn value(&self, label: &str) -> Option<&Value> {
        self.fields.get(label)
    }

    /// Number of fields the model answered.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Supplier identity as printed on the invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartyDetails {
    pub name: String,
    pub gst_no: String,
}

/// Buyer identity as printed on the invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuyerDetails {
    pub name: String,
    pub gst_no: String,
    pub city: String,
}

/// One normalised invoice record, produced per successfully extracted page.
///
/// Immutable once appended to a run's record sequence. Dates are kept as the
/// source text (`DD/MM/YYYY`), not parsed to a date type; parsing happens
/// only where a rule needs it (see [`crate::validate`]).
///
/// `items`, `quantities` and `rates` are positionally aligned when the model
/// returns matching comma counts. When it does not, the lengths diverge and
/// that divergence is preserved: reconciling would fabricate data. Use
/// [`InvoiceRecord::line_item_rows`] for padded display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub invoice_number: String,
    /// Source format `DD/MM/YYYY`.
    pub issue_date: String,
    pub supplier_details: PartyDetails,
    pub buyer_details: BuyerDetails,
    pub items: Vec<String>,
    pub quantities: Vec<String>,
    pub rates: Vec<String>,
    pub discount: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
    /// 1-based page the record was extracted from.
    pub page_number: usize,
}

impl InvoiceRecord {
    /// Zip items, quantities and rates into display rows, padding the shorter
    /// sequences with empty strings.
    ///
    /// Display-only: the stored sequences are never reconciled.
    pub fn line_item_rows(&self) -> Vec<(String, String, String)> {
        let len = self
            .items
            .len()
            .max(self.quantities.len())
            .max(self.rates.len());
        (0..len)
            .map(|i| {
                (
                    self.items.get(i).cloned().unwrap_or_default(),
                    self.quantities.get(i).cloned().unwrap_or_default(),
                    self.rates.get(i).cloned().unwrap_or_default(),
                )
            })
            .collect()
    }
}
