//! The extraction template: field labels and the instruction prompt.
//!
//! Centralising the template here serves two purposes:
//!
//! 1. **Single source of truth** — the label strings are the JSON keys the
//!    model echoes back, so the prompt builder, the normaliser, and the tests
//!    all read from the same constants.
//!
//! 2. **Testability** — unit tests can assert every template field appears in
//!    the instruction without calling a real model.
//!
//! Callers can override the instruction via
//! [`crate::config::ExtractionConfig::prompt`]; the constants here are used
//! when no override is provided.

/// Sentinel the model is instructed to answer when a field is not present
/// in the document.
pub const ABSENT_SENTINEL: &str = "NAN";

// Template labels, verbatim. These are the exact JSON keys the model is told
// to produce, misspellings included ("Clinet", "Desciption"); correcting them
// here would break every response.
pub const FIELD_DATE: &str = "Date";
pub const FIELD_SELLER: &str = "Seller";
pub const FIELD_SELLER_GST: &str = "Seller Gst No.";
pub const FIELD_CLIENT: &str = "Client";
pub const FIELD_INVOICE_NUMBER: &str = "Invoice Number / Bill No.";
pub const FIELD_TRANSPORT: &str = "Transport";
pub const FIELD_LR_NO: &str = "LR. No.";
pub const FIELD_CLIENT_GST: &str = "Clinet Gst No.";
pub const FIELD_CITY: &str = "City Name / Area of the Client";
pub const FIELD_ITEMS: &str = "Items or Desciption of Goods Details";
pub const FIELD_QUANTITY: &str = "Quantity";
pub const FIELD_RATE: &str = "Rate of Goods";
pub const FIELD_DISCOUNT: &str = "Less / Discount Amount";
pub const FIELD_TAX: &str = "Total Gst Amount";
pub const FIELD_TOTAL: &str = "Total Amount";

/// The full template, in prompt order.
pub const TEMPLATE_FIELDS: [&str; 15] = [
    FIELD_DATE,
    FIELD_SELLER,
    FIELD_SELLER_GST,
    FIELD_CLIENT,
    FIELD_INVOICE_NUMBER,
    FIELD_TRANSPORT,
    FIELD_LR_NO,
    FIELD_CLIENT_GST,
    FIELD_CITY,
    FIELD_ITEMS,
    FIELD_QUANTITY,
    FIELD_RATE,
    FIELD_DISCOUNT,
    FIELD_TAX,
    FIELD_TOTAL,
];

/// Build the per-page extraction instruction sent alongside the page image.
///
/// The instruction asks the model to answer every template field from the
/// document content, join tabular goods/quantities/rates with commas, use
/// [`ABSENT_SENTINEL`] for fields it cannot find, and reply with a single
/// JSON object keyed by the literal field names.
pub fn extraction_prompt() -> String {
    let mut prompt = String::from(
        "You are reading one page of a scanned invoice. \
         Fill in each template field below from the document content.\n\n\
         Template fields:\n",
    );
    for field in TEMPLATE_FIELDS {
        prompt.push_str("- \"");
        prompt.push_str(field);
        prompt.push_str("\"\n");
    }
    prompt.push_str(
        "\nList every goods entry present in the items table, joined with commas. \
         Join the quantities and the rates with commas as well, keeping column order.\n\
         If a field is not present in the document, answer exactly \"NAN\" for that field.\n\
         Respond with a single JSON object whose keys are exactly the field names above \
         and whose values are strings. No commentary, no markdown.",
    );
    prompt
}
