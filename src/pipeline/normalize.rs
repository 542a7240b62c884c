//! Normalisation: template mapping → canonical [`InvoiceRecord`].
//!
//! A pure mapping that never fails and is idempotent: the same raw extraction
//! and page number always yield structurally equal records. Leniency is the
//! point. The upstream classifier is unreliable, so absent or garbled values
//! normalise to defaults instead of raising; a page with a half-usable answer
//! still produces a row.

use crate::prompts::{
    ABSENT_SENTINEL, FIELD_CITY, FIELD_CLIENT, FIELD_CLIENT_GST, FIELD_DATE, FIELD_DISCOUNT,
    FIELD_INVOICE_NUMBER, FIELD_ITEMS, FIELD_QUANTITY, FIELD_RATE, FIELD_SELLER, FIELD_SELLER_GST,
    FIELD_TAX, FIELD_TOTAL,
};
use crate::record::{BuyerDetails, InvoiceRecord, PartyDetails, RawExtraction};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Map a raw extraction to the canonical record for the given 1-based page.
///
/// * Text fields: trimmed; the `"NAN"` sentinel and missing labels become
///   empty strings.
/// * List fields (items, quantities, rates): split on `','`, each element
///   trimmed, empty segments dropped; an absent source yields an empty
///   sequence. Lengths across the three lists are NOT reconciled.
/// * Amount fields (discount, tax, total): coerced to `f64`; absent or
///   non-numeric text becomes 0.
pub fn normalize(raw: &RawExtraction, page_number: usize) -> InvoiceRecord {
    InvoiceRecord {
        invoice_number: text_field(raw, FIELD_INVOICE_NUMBER),
        issue_date: text_field(raw, FIELD_DATE),
        supplier_details: PartyDetails {
            name: text_field(raw, FIELD_SELLER),
            gst_no: text_field(raw, FIELD_SELLER_GST),
        },
        buyer_details: BuyerDetails {
            name: text_field(raw, FIELD_CLIENT),
            gst_no: text_field(raw, FIELD_CLIENT_GST),
            city: text_field(raw, FIELD_CITY),
        },
        items: list_field(raw, FIELD_ITEMS),
        quantities: list_field(raw, FIELD_QUANTITY),
        rates: list_field(raw, FIELD_RATE),
        discount: amount_field(raw, FIELD_DISCOUNT),
        tax_amount: amount_field(raw, FIELD_TAX),
        total_amount: amount_field(raw, FIELD_TOTAL),
        page_number,
    }
}

fn text_field(raw: &RawExtraction, label: &str) -> String {
    match raw.value(label) {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed == ABSENT_SENTINEL {
                String::new()
            } else {
                trimmed.to_string()
            }
        }
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn list_field(raw: &RawExtraction, label: &str) -> Vec<String> {
    let joined = text_field(raw, label);
    if joined.is_empty() {
        return Vec::new();
    }
    joined
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}

// First numeric run in the text, tolerating thousands separators. Currency
// symbols and unit suffixes around it are ignored.
static RE_AMOUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d[\d,]*(?:\.\d+)?").unwrap());

fn amount_field(raw: &RawExtraction, label: &str) -> f64 {
    match raw.value(label) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => parse_amount(s),
        _ => 0.0,
    }
}

fn parse_amount(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == ABSENT_SENTINEL {
        return 0.0;
    }
    RE_AMOUNT
        .find(trimmed)
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
        .unwrap_or(0.0)
}
