//! Column schemas and header resolution for the two input tables.
//!
//! Aliasing is an explicit schema-mapping step rather than ad hoc renaming:
//! each logical column carries its canonical header plus the alternative
//! spellings seen in upstream exports, and the header row is resolved once
//! before any row is parsed.

use std::collections::HashMap;

use exposure_core::error::{ExposureError, Result};

/// Display name for the merchant ledger in error messages.
pub const APPS_TABLE: &str = "APPS";
/// Display name for the rating table in error messages.
pub const MCC_TABLE: &str = "MCC";

// ── Column specs ──────────────────────────────────────────────────────────────

/// One logical column: canonical header, accepted aliases, and whether the
/// table is unusable without it.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
    pub required: bool,
}

impl ColumnSpec {
    const fn required(canonical: &'static str, aliases: &'static [&'static str]) -> Self {
        Self {
            canonical,
            aliases,
            required: true,
        }
    }

    const fn optional(canonical: &'static str, aliases: &'static [&'static str]) -> Self {
        Self {
            canonical,
            aliases,
            required: false,
        }
    }

    fn matches(&self, header: &str) -> bool {
        let header = header.trim();
        header.eq_ignore_ascii_case(self.canonical)
            || self.aliases.iter().any(|a| header.eq_ignore_ascii_case(a))
    }
}

/// Columns of the APPS merchant ledger.
pub const APPS_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::optional("Account", &["Account Number"]),
    ColumnSpec::required("MID", &[]),
    ColumnSpec::required("MCC", &["MCC Code"]),
    ColumnSpec::required("Association", &[]),
    ColumnSpec::required("Date Opened", &[]),
    ColumnSpec::required("Date Closed", &[]),
    ColumnSpec::required("YTD Gross Sales Volume", &[]),
    ColumnSpec::required("YTD Credit Volume", &[]),
    ColumnSpec::required("YTD Chargeback Volume", &[]),
    ColumnSpec::required("YTD Volume Card-NOT-Present", &["YTD Volume Card Not Present"]),
    ColumnSpec::required("YTD Volume Card-Present", &["YTD Volume Card Present"]),
];

/// Columns of the MCC risk-rating table.
pub const MCC_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::required("MCC", &["MCC Code"]),
    ColumnSpec::required("CNP", &[]),
    ColumnSpec::required("CP/ACH", &["CP"]),
];

// ── HeaderIndex ───────────────────────────────────────────────────────────────

/// Canonical column name → position in the header row.
#[derive(Debug, Clone)]
pub struct HeaderIndex {
    positions: HashMap<&'static str, usize>,
}

impl HeaderIndex {
    /// Resolve a header row against `specs`.
    ///
    /// The first header cell matching a spec (canonical name or alias,
    /// case-insensitive on trimmed text) wins. A required spec with no
    /// matching cell aborts with [`ExposureError::MissingColumn`] before any
    /// data row is touched.
    pub fn resolve(table: &str, header: &[String], specs: &[ColumnSpec]) -> Result<Self> {
        let mut positions = HashMap::new();

        for spec in specs {
            let found = header.iter().position(|cell| spec.matches(cell));
            match found {
                Some(idx) => {
                    positions.insert(spec.canonical, idx);
                }
                None if spec.required => {
                    return Err(ExposureError::MissingColumn {
                        table: table.to_string(),
                        column: spec.canonical.to_string(),
                    });
                }
                None => {}
            }
        }

        Ok(Self { positions })
    }

    /// Position of a resolved column, `None` for absent optional columns.
    pub fn get(&self, canonical: &str) -> Option<usize> {
        self.positions.get(canonical).copied()
    }

    /// Fetch a cell from `row` by canonical column name, empty when the row
    /// is short or the optional column is absent.
    pub fn cell<'a>(&self, row: &'a [String], canonical: &str) -> &'a str {
        self.get(canonical)
            .and_then(|idx| row.get(idx))
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}

// ── MCC normalisation ─────────────────────────────────────────────────────────

/// Normalise a category code to a uniform textual form for joining.
///
/// Trims whitespace and drops a trailing `.0` left behind when a spreadsheet
/// exports numeric-typed codes, so `5999`, ` 5999 `, and `5999.0` all join.
pub fn normalize_mcc(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(stem) = trimmed.strip_suffix(".0") {
        if !stem.is_empty() && stem.chars().all(|c| c.is_ascii_digit()) {
            return stem.to_string();
        }
    }
    trimmed.to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
