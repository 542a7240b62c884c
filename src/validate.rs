//! Business-rule validation for normalised records.
//!
//! Validation runs on a [`ReviewRecord`]: the extracted record plus a due
//! date. The normaliser never produces a due date (invoices rarely print
//! one), so it is derived from the issue date and the configured net payment
//! terms before the rules run.
//!
//! Violations are reported individually as values, never raised: callers
//! branch on them to decide per-field remediation versus rejection.

use crate::record::InvoiceRecord;
use chrono::NaiveDate;
use thiserror::Error;

/// Date format used on the source documents.
pub const SOURCE_DATE_FORMAT: &str = "%d/%m/%Y";

/// One violated business rule. The full set for a record comes back from
/// [`validate`] as a `Vec`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleViolation {
    #[error("invoice_number is missing")]
    MissingInvoiceNumber,

    #[error("issue_date is missing")]
    MissingIssueDate,

    #[error("due_date is missing")]
    MissingDueDate,

    #[error("total_amount is missing")]
    MissingTotalAmount,

    #[error("total_amount must be greater than zero, got {amount}")]
    NonPositiveTotal { amount: f64 },

    #[error("tax_amount must not be negative, got {amount}")]
    NegativeTax { amount: f64 },

    #[error("due_date {due} is earlier than issue_date {issue}")]
    DueBeforeIssue { issue: String, due: String },
}

/// Parse a `DD/MM/YYYY` source date.
pub fn parse_source_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), SOURCE_DATE_FORMAT).ok()
}

/// Derive a due date as issue date plus net payment terms.
///
/// Returns `None` when the issue date does not parse; the missing-due-date
/// rule reports that case instead of guessing.
pub fn derive_due_date(issue_date: &str, net_days: i64) -> Option<NaiveDate> {
    parse_source_date(issue_date)
        .and_then(|d| d.checked_add_signed(chrono::Duration::days(net_days)))
}

/// A due-date-bearing view of an [`InvoiceRecord`], ready for validation.
#[derive(Debug, Clone)]
pub struct ReviewRecord<'a> {
    record: &'a InvoiceRecord,
    due_date: String,
}

impl<'a> ReviewRecord<'a> {
    /// Pair a record with an explicit due date (`DD/MM/YYYY`).
    pub fn new(record: &'a InvoiceRecord, due_date: impl Into<String>) -> Self {
        Self {
            record,
            due_date: due_date.into(),
        }
    }

    /// Pair a record with a due date derived from its issue date and the
    /// given net payment terms. An unparseable issue date leaves the due
    /// date empty.
    pub fn with_terms(record: &'a InvoiceRecord, net_days: i64) -> Self {
        let due_date = derive_due_date(&record.issue_date, net_days)
            .map(|d| d.format(SOURCE_DATE_FORMAT).to_string())
            .unwrap_or_default();
        Self { record, due_date }
    }

    pub fn record(&self) -> &InvoiceRecord {
        self.record
    }

    pub fn due_date(&self) -> &str {
        &self.due_date
    }
}

/// Check every business rule, collecting all violations rather than
/// stopping at the first.
///
/// A zero total counts as missing (an invoice for nothing is not an
/// invoice); a negative total violates the sign rule instead, so the two
/// amount rules never double-report.
pub fn validate(review: &ReviewRecord<'_>) -> Result<(), Vec<RuleViolation>> {
    let mut violations = Vec::new();
    let record = review.record;

    if record.invoice_number.trim().is_empty() {
        violations.push(RuleViolation::MissingInvoiceNumber);
    }
    if record.issue_date.trim().is_empty() {
        violations.push(RuleViolation::MissingIssueDate);
    }
    if review.due_date.trim().is_empty() {
        violations.push(RuleViolation::MissingDueDate);
    }

    if record.total_amount == 0.0 {
        violations.push(RuleViolation::MissingTotalAmount);
    } else if record.total_amount < 0.0 {
        violations.push(RuleViolation::NonPositiveTotal {
            amount: record.total_amount,
        });
    }

    if record.tax_amount < 0.0 {
        violations.push(RuleViolation::NegativeTax {
            amount: record.tax_amount,
        });
    }

    if let (Some(issue), Some(due)) = (
        parse_source_date(&record.issue_date),
        parse_source_date(&review.due_date),
    ) {
        if due < issue {
            violations.push(RuleViolation::DueBeforeIssue {
                issue: record.issue_date.trim().to_string(),
                due: review.due_date.trim().to_string(),
            });
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
