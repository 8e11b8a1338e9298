//! Writes the enriched table as a delimited spreadsheet file.
//!
//! The export carries full-precision values; rounding happens only in the
//! display layer. Null derived values become empty cells.

use std::io::Write;
use std::path::{Path, PathBuf};

use exposure_core::error::Result;
use exposure_core::models::EnrichedMerchantRecord;
use tracing::info;

use crate::delimited::join_fields;
use crate::pipeline::ExposureReport;

/// Fixed name the processed spreadsheet is offered under.
pub const EXPORT_FILE_NAME: &str = "APPS_Exposure.csv";

/// MIME type for the exported spreadsheet.
pub const EXPORT_MIME_TYPE: &str = "text/csv";

/// Header row of the export, ledger columns first, derived columns after.
pub const EXPORT_COLUMNS: [&str; 22] = [
    "Account",
    "MID",
    "MCC",
    "Association",
    "Date Opened",
    "Date Closed",
    "YTD Gross Sales Volume",
    "YTD Credit Volume",
    "YTD Chargeback Volume",
    "YTD Volume Card-NOT-Present",
    "YTD Volume Card-Present",
    "days_processing",
    "refund_rate",
    "chargeback_rate",
    "CNP",
    "CP/ACH",
    "refund_risk",
    "chargeback_risk",
    "cnp_dd_risk",
    "cp_dd_risk",
    "exposure",
    "exposure_category",
];

/// Write the report's enriched table into `dir` under [`EXPORT_FILE_NAME`].
///
/// Returns the path of the written file.
pub fn write_report(report: &ExposureReport, dir: &Path, delimiter: char) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(EXPORT_FILE_NAME);
    let mut file = std::fs::File::create(&path)?;

    writeln!(file, "{}", join_fields(&EXPORT_COLUMNS, delimiter))?;

    for record in &report.records {
        writeln!(file, "{}", join_fields(&record_fields(record), delimiter))?;
    }

    info!(
        "Wrote {} enriched rows to {}",
        report.records.len(),
        path.display()
    );
    Ok(path)
}

// ── Cell rendering ────────────────────────────────────────────────────────────

fn record_fields(record: &EnrichedMerchantRecord) -> Vec<String> {
    let m = &record.merchant;
    let risk = &record.risk;
    vec![
        m.account_id.clone(),
        m.merchant_id.clone(),
        m.mcc.clone(),
        m.association.to_string(),
        m.date_opened.format("%Y-%m-%d").to_string(),
        m.date_closed
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        number_cell(m.gross_sales_volume),
        number_cell(m.credit_volume),
        number_cell(m.chargeback_volume),
        number_cell(m.cnp_volume),
        number_cell(m.cp_volume),
        record
            .days_processing
            .map(|d| d.to_string())
            .unwrap_or_default(),
        number_cell(record.refund_rate),
        number_cell(record.chargeback_rate),
        optional_number_cell(record.cnp_coefficient),
        optional_number_cell(record.cp_coefficient),
        optional_number_cell(risk.refund_risk),
        optional_number_cell(risk.chargeback_risk),
        optional_number_cell(risk.cnp_dd_risk),
        optional_number_cell(risk.cp_dd_risk),
        optional_number_cell(risk.exposure),
        record
            .category
            .map(|c| c.label().to_string())
            .unwrap_or_default(),
    ]
}

/// Shortest round-trippable decimal form; no display rounding.
fn number_cell(value: f64) -> String {
    value.to_string()
}

fn optional_number_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use exposure_core::models::{CategoryRiskRating, MerchantRecord};
    use exposure_core::months::Month;
    use tempfile::TempDir;

    use crate::delimited::split_line;
    use crate::pipeline::ExposurePipeline;

    fn sample_report(with_rating: bool) -> ExposureReport {
        let merchant = MerchantRecord {
            account_id: "ACC-1".to_string(),
            merchant_id: "M-1".to_string(),
            mcc: "5999".to_string(),
            association: 44,
            date_opened: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            date_closed: None,
            gross_sales_volume: 10_000.0,
            credit_volume: 200.0,
            chargeback_volume: 10.0,
            cnp_volume: 6_000.0,
            cp_volume: 4_000.0,
        };
        let ratings = if with_rating {
            vec![CategoryRiskRating {
                mcc: "5999".to_string(),
                cnp_coefficient: Some(0.5),
                cp_coefficient: Some(0.25),
            }]
        } else {
            vec![]
        };
        ExposurePipeline::default().run_tables(vec![merchant], ratings, Month::September)
    }

    #[test]
    fn test_write_report_fixed_file_name() {
        let dir = TempDir::new().unwrap();
        let path = write_report(&sample_report(true), dir.path(), ',').unwrap();
        assert_eq!(path.file_name().unwrap(), EXPORT_FILE_NAME);
        assert!(path.is_file());
    }

    #[test]
    fn test_write_report_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = write_report(&sample_report(true), dir.path(), ',').unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2); // header + one merchant

        let header = split_line(lines[0], ',');
        assert_eq!(header.len(), 22);
        assert_eq!(header[0], "Account");
        assert_eq!(header[20], "exposure");
        assert_eq!(header[21], "exposure_category");

        let row = split_line(lines[1], ',');
        assert_eq!(row.len(), header.len());
        assert_eq!(row[1], "M-1");
        assert_eq!(row[11], "107"); // days_processing
        assert_eq!(row[21], "under_100k");
    }

    #[test]
    fn test_write_report_null_cells_are_empty() {
        let dir = TempDir::new().unwrap();
        // No rating row: coefficients, dd risks, exposure, category all null.
        let path = write_report(&sample_report(false), dir.path(), ',').unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let row = split_line(content.lines().nth(1).unwrap(), ',');
        assert_eq!(row[14], ""); // CNP
        assert_eq!(row[15], ""); // CP/ACH
        assert_eq!(row[18], ""); // cnp_dd_risk
        assert_eq!(row[20], ""); // exposure
        assert_eq!(row[21], ""); // exposure_category
    }

    #[test]
    fn test_write_report_full_precision() {
        let dir = TempDir::new().unwrap();
        let report = sample_report(true);
        let path = write_report(&report, dir.path(), ',').unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let row = split_line(content.lines().nth(1).unwrap(), ',');
        // The exported exposure parses back to the exact in-memory value.
        let exported: f64 = row[20].parse().unwrap();
        assert_eq!(exported, report.records[0].exposure().unwrap());
    }

    #[test]
    fn test_mime_type_is_delimited_text() {
        assert_eq!(EXPORT_MIME_TYPE, "text/csv");
    }
}
