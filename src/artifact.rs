//! The tabular artifact: one CSV row per extracted page.
//!
//! ## Column contract
//!
//! Nested record fields are flattened into the stable column order of
//! [`CSV_COLUMNS`]; downstream importers may rely on it. The sequence fields
//! (items, quantities, rates) are re-joined with `", "` inside a single
//! quoted cell, mirroring the comma-joined form they arrived in.

use crate::error::ExtractError;
use crate::record::InvoiceRecord;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::info;

/// Artifact columns, in order. Stable: changing this is a breaking change
/// for every consumer of the CSV.
pub const CSV_COLUMNS: [&str; 14] = [
    "invoice_number",
    "issue_date",
    "supplier_name",
    "supplier_gst_no",
    "buyer_name",
    "buyer_gst_no",
    "buyer_city",
    "items",
    "quantities",
    "rates",
    "discount",
    "tax_amount",
    "total_amount",
    "page_number",
];

/// Timestamped artifact file name for a run that started at `now`.
pub fn artifact_file_name(now: &DateTime<Local>) -> String {
    format!("invoice_details_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Serialize the run's records into a timestamp-named CSV inside `dir`,
/// creating the directory if absent. Returns the artifact location.
pub fn write_records(records: &[InvoiceRecord], dir: &Path) -> Result<PathBuf, ExtractError> {
    std::fs::create_dir_all(dir).map_err(|e| ExtractError::ArtifactWriteFailed {
        path: dir.to_path_buf(),
        detail: e.to_string(),
    })?;
    let path = dir.join(artifact_file_name(&Local::now()));
    write_records_to(records, &path)?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(path)
}

/// Serialize records to an explicit path. Split out from [`write_records`]
/// so tests can pin the file name.
pub fn write_records_to(records: &[InvoiceRecord], path: &Path) -> Result<(), ExtractError> {
    let write_err = |detail: String| ExtractError::ArtifactWriteFailed {
        path: path.to_path_buf(),
        detail,
    };

    let mut writer = csv::Writer::from_path(path).map_err(|e| write_err(e.to_string()))?;
    writer
        .write_record(CSV_COLUMNS)
        .map_err(|e| write_err(e.to_string()))?;

    for record in records {
        let row = [
            record.invoice_number.clone(),
            record.issue_date.clone(),
            record.supplier_details.name.clone(),
            record.supplier_details.gst_no.clone(),
            record.buyer_details.name.clone(),
            record.buyer_details.gst_no.clone(),
            record.buyer_details.city.clone(),
            record.items.join(", "),
            record.quantities.join(", "),
            record.rates.join(", "),
            record.discount.to_string(),
            record.tax_amount.to_string(),
            record.total_amount.to_string(),
            record.page_number.to_string(),
        ];
        writer
            .write_record(&row)
            .map_err(|e| write_err(e.to_string()))?;
    }

    writer.flush().map_err(|e| write_err(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{BuyerDetails, PartyDetails};
    use chrono::TimeZone;

    fn sample_record() -> InvoiceRecord {
        InvoiceRecord {
            invoice_number: "INV-17".into(),
            issue_date: "05/03/2024".into(),
            supplier_details: PartyDetails {
                name: "Acme Traders".into(),
                gst_no: "27AAAAA0000A1Z5".into(),
            },
            buyer_details: BuyerDetails {
                name: "Bharat Constructions".into(),
                gst_no: "29BBBBB1111B2Z6".into(),
                city: "Pune".into(),
            },
            items: vec!["Cement".into(), "Sand".into()],
            quantities: vec!["10".into(), "5".into()],
            rates: vec!["350".into(), "40".into()],
            discount: 50.0,
            tax_amount: 612.0,
            total_amount: 4262.0,
            page_number: 1,
        }
    }

    #[test]
    fn file_name_uses_run_timestamp() {
        let ts = Local.with_ymd_and_hms(2024, 3, 5, 14, 30, 9).unwrap();
        assert_eq!(artifact_file_name(&ts), "invoice_details_20240305_143009.csv");
    }

    #[test]
    fn header_matches_column_contract() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_records_to(&[sample_record()], &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let header: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(String::from)
            .collect();
        assert_eq!(header, CSV_COLUMNS.to_vec());
    }

    #[test]
    fn rows_flatten_nested_and_list_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_records_to(&[sample_record()], &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(&row[0], "INV-17");
        assert_eq!(&row[2], "Acme Traders");
        assert_eq!(&row[7], "Cement, Sand");
        assert_eq!(&row[12], "4262");
        assert_eq!(&row[13], "1");
    }

    #[test]
    fn empty_run_still_writes_header_only_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_records(&[], dir.path()).unwrap();
        assert!(path.exists());

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.records().count(), 0);
    }
}
