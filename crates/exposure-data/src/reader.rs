//! Delimited-file loading for the APPS ledger and the MCC rating table.
//!
//! Reads each table strictly: a missing required column or an unparseable
//! cell aborts the whole load with the offending column and line named.
//! The only rows silently skipped are fully blank lines.

use std::io::BufRead;
use std::path::Path;

use chrono::NaiveDate;
use exposure_core::error::{ExposureError, Result};
use exposure_core::models::{CategoryRiskRating, MerchantRecord};
use tracing::debug;

use crate::delimited::split_line;
use crate::schema::{
    normalize_mcc, HeaderIndex, APPS_COLUMNS, APPS_TABLE, MCC_COLUMNS, MCC_TABLE,
};

// ── Public API ────────────────────────────────────────────────────────────────

/// Load the APPS merchant ledger.
pub fn load_merchants(path: &Path, delimiter: char) -> Result<Vec<MerchantRecord>> {
    let (header, rows) = read_rows(path, delimiter, APPS_TABLE)?;
    let index = HeaderIndex::resolve(APPS_TABLE, &header, APPS_COLUMNS)?;

    let mut merchants = Vec::with_capacity(rows.len());
    for (line, row) in &rows {
        merchants.push(parse_merchant(&index, row, *line)?);
    }

    debug!(
        "Loaded {} merchant rows from {}",
        merchants.len(),
        path.display()
    );
    Ok(merchants)
}

/// Load the MCC risk-rating table.
pub fn load_ratings(path: &Path, delimiter: char) -> Result<Vec<CategoryRiskRating>> {
    let (header, rows) = read_rows(path, delimiter, MCC_TABLE)?;
    let index = HeaderIndex::resolve(MCC_TABLE, &header, MCC_COLUMNS)?;

    let mut ratings = Vec::with_capacity(rows.len());
    for (line, row) in &rows {
        ratings.push(CategoryRiskRating {
            mcc: normalize_mcc(index.cell(row, "MCC")),
            cnp_coefficient: parse_optional_number("CNP", index.cell(row, "CNP"), *line)?,
            cp_coefficient: parse_optional_number("CP/ACH", index.cell(row, "CP/ACH"), *line)?,
        });
    }

    debug!(
        "Loaded {} rating rows from {}",
        ratings.len(),
        path.display()
    );
    Ok(ratings)
}

// ── Row reading ───────────────────────────────────────────────────────────────

/// Read a delimited file into a header row plus `(line_number, fields)` data
/// rows. Line numbers are 1-based file lines; blank lines are skipped.
fn read_rows(
    path: &Path,
    delimiter: char,
    table: &str,
) -> Result<(Vec<String>, Vec<(usize, Vec<String>)>)> {
    let file = std::fs::File::open(path).map_err(|source| ExposureError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = std::io::BufReader::new(file);

    let mut header: Option<Vec<String>> = None;
    let mut rows: Vec<(usize, Vec<String>)> = Vec::new();

    for (i, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|source| ExposureError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let fields = split_line(&line, delimiter);
        match header {
            None => header = Some(fields),
            Some(_) => rows.push((i + 1, fields)),
        }
    }

    let header = header.ok_or_else(|| ExposureError::EmptyTable(table.to_string()))?;
    if rows.is_empty() {
        return Err(ExposureError::EmptyTable(table.to_string()));
    }
    Ok((header, rows))
}

// ── Merchant row parsing ──────────────────────────────────────────────────────

fn parse_merchant(index: &HeaderIndex, row: &[String], line: usize) -> Result<MerchantRecord> {
    let merchant_id = index.cell(row, "MID").trim().to_string();
    // Ledgers without a separate account column fall back to the MID.
    let account_cell = index.cell(row, "Account").trim();
    let account_id = if account_cell.is_empty() {
        merchant_id.clone()
    } else {
        account_cell.to_string()
    };

    Ok(MerchantRecord {
        account_id,
        merchant_id,
        mcc: normalize_mcc(index.cell(row, "MCC")),
        association: parse_association(index.cell(row, "Association"), line)?,
        date_opened: parse_date("Date Opened", index.cell(row, "Date Opened"), line)?,
        date_closed: parse_optional_date("Date Closed", index.cell(row, "Date Closed"), line)?,
        gross_sales_volume: parse_number(
            "YTD Gross Sales Volume",
            index.cell(row, "YTD Gross Sales Volume"),
            line,
        )?,
        credit_volume: parse_number(
            "YTD Credit Volume",
            index.cell(row, "YTD Credit Volume"),
            line,
        )?,
        chargeback_volume: parse_number(
            "YTD Chargeback Volume",
            index.cell(row, "YTD Chargeback Volume"),
            line,
        )?,
        cnp_volume: parse_number(
            "YTD Volume Card-NOT-Present",
            index.cell(row, "YTD Volume Card-NOT-Present"),
            line,
        )?,
        cp_volume: parse_number(
            "YTD Volume Card-Present",
            index.cell(row, "YTD Volume Card-Present"),
            line,
        )?,
    })
}

// ── Cell parsers ──────────────────────────────────────────────────────────────

/// Date formats accepted across the upstream exports.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"];

/// Datetime formats some spreadsheet exports attach to date columns.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

fn parse_date(column: &str, value: &str, line: usize) -> Result<NaiveDate> {
    let trimmed = value.trim();

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt.date());
        }
    }

    Err(ExposureError::InvalidDate {
        column: column.to_string(),
        line,
        value: value.to_string(),
    })
}

/// Empty cell → `None` (the account is still open); anything else must parse.
fn parse_optional_date(column: &str, value: &str, line: usize) -> Result<Option<NaiveDate>> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_date(column, value, line).map(Some)
}

/// Parse a numeric cell, tolerating a leading `$` and thousands separators.
fn parse_number(column: &str, value: &str, line: usize) -> Result<f64> {
    let cleaned: String = value
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();

    cleaned
        .parse::<f64>()
        .map_err(|_| ExposureError::InvalidNumber {
            column: column.to_string(),
            line,
            value: value.to_string(),
        })
}

/// Empty cell → `None` (an unrated category); anything else must parse.
fn parse_optional_number(column: &str, value: &str, line: usize) -> Result<Option<f64>> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_number(column, value, line).map(Some)
}

/// Association identifiers arrive as integers, sometimes float-typed by the
/// exporting spreadsheet.
fn parse_association(value: &str, line: usize) -> Result<i64> {
    parse_number("Association", value, line).map(|n| n as i64)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
