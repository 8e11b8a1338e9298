use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the APPS merchant ledger after ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantRecord {
    /// Account identifier. Falls back to the MID when the ledger has no
    /// separate account column.
    pub account_id: String,
    /// Merchant identifier (MID), always carried as text.
    pub merchant_id: String,
    /// Merchant category code, normalised to text before joining.
    pub mcc: String,
    /// Association / network identifier.
    pub association: i64,
    /// Date the account began processing.
    pub date_opened: NaiveDate,
    /// Date the account was closed. `None` means still open.
    pub date_closed: Option<NaiveDate>,
    /// Year-to-date gross sales volume (USD).
    pub gross_sales_volume: f64,
    /// Year-to-date credit (refund) volume (USD).
    pub credit_volume: f64,
    /// Year-to-date chargeback volume (USD).
    pub chargeback_volume: f64,
    /// Year-to-date card-not-present volume (USD).
    pub cnp_volume: f64,
    /// Year-to-date card-present volume (USD).
    pub cp_volume: f64,
}

/// One row of the MCC risk-rating table.
///
/// Coefficients may be absent for categories the rating sheet leaves blank;
/// absence propagates as `None` through the risk arithmetic rather than
/// erroring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRiskRating {
    /// Merchant category code, normalised to text.
    pub mcc: String,
    /// Card-not-present daily-discount coefficient.
    pub cnp_coefficient: Option<f64>,
    /// Card-present / ACH daily-discount coefficient.
    pub cp_coefficient: Option<f64>,
}

/// The four per-merchant risk components and their total.
///
/// Any component whose inputs are unavailable (degenerate day count, missing
/// rating coefficient) is `None`, and a `None` component makes the total
/// `None` as well.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskComponents {
    /// Expected refund liability over the refund window.
    pub refund_risk: Option<f64>,
    /// Expected chargeback liability over the chargeback window.
    pub chargeback_risk: Option<f64>,
    /// Card-not-present daily-discount risk.
    pub cnp_dd_risk: Option<f64>,
    /// Card-present daily-discount risk.
    pub cp_dd_risk: Option<f64>,
    /// Sum of the four components.
    pub exposure: Option<f64>,
}

/// Exposure bucket for a merchant, by fixed dollar thresholds.
///
/// Serialised labels match the report column values exactly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ExposureCategory {
    /// Exposure below $100,000.
    #[serde(rename = "under_100k")]
    Under100k,
    /// Exposure in [$100,000, $500,000).
    #[serde(rename = "Range_100k_500k")]
    Range100k500k,
    /// Exposure at or above $500,000.
    #[serde(rename = "Range_Over_500k")]
    RangeOver500k,
}

impl ExposureCategory {
    /// All categories in ascending threshold order.
    pub const ALL: [ExposureCategory; 3] = [
        ExposureCategory::Under100k,
        ExposureCategory::Range100k500k,
        ExposureCategory::RangeOver500k,
    ];

    /// Bucket a finite exposure value.
    ///
    /// Boundaries are inclusive-low / exclusive-high except the top bucket,
    /// which is open-ended above $500,000.
    pub fn from_value(exposure: f64) -> ExposureCategory {
        if exposure < 100_000.0 {
            ExposureCategory::Under100k
        } else if exposure < 500_000.0 {
            ExposureCategory::Range100k500k
        } else {
            ExposureCategory::RangeOver500k
        }
    }

    /// The report label for this category.
    pub fn label(self) -> &'static str {
        match self {
            ExposureCategory::Under100k => "under_100k",
            ExposureCategory::Range100k500k => "Range_100k_500k",
            ExposureCategory::RangeOver500k => "Range_Over_500k",
        }
    }
}

impl std::fmt::Display for ExposureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A [`MerchantRecord`] extended with every derived column the pipeline
/// computes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedMerchantRecord {
    /// The underlying ledger row.
    #[serde(flatten)]
    pub merchant: MerchantRecord,
    /// Estimated days of processing within the reporting window. `None` when
    /// the window resolves to zero or negative days.
    pub days_processing: Option<i64>,
    /// credit_volume / gross_sales_volume.
    pub refund_rate: f64,
    /// chargeback_volume / gross_sales_volume.
    pub chargeback_rate: f64,
    /// CNP coefficient joined from the rating table, if matched.
    pub cnp_coefficient: Option<f64>,
    /// CP/ACH coefficient joined from the rating table, if matched.
    pub cp_coefficient: Option<f64>,
    /// The four risk components and their total.
    #[serde(flatten)]
    pub risk: RiskComponents,
    /// Exposure bucket, absent when the exposure itself is null.
    pub category: Option<ExposureCategory>,
}

impl EnrichedMerchantRecord {
    /// Total exposure for this merchant, when computable.
    pub fn exposure(&self) -> Option<f64> {
        self.risk.exposure
    }
}
