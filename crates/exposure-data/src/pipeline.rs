//! The exposure pipeline.
//!
//! Orchestrates filtering, day-count and rate derivation, the rating join,
//! risk computation, categorization, and the scalar/group aggregates,
//! returning an [`ExposureReport`] ready for display and export.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::Utc;
use exposure_core::calculations::RiskCalculator;
use exposure_core::config::PipelineConfig;
use exposure_core::error::Result;
use exposure_core::models::{
    CategoryRiskRating, EnrichedMerchantRecord, ExposureCategory, MerchantRecord,
};
use exposure_core::months::Month;
use serde::Serialize;
use tracing::{debug, warn};

use crate::reader::{load_merchants, load_ratings};

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// ISO-8601 timestamp when this report was generated.
    pub generated_at: String,
    /// The selected reporting month.
    pub month: String,
    /// Merchant rows read from the ledger before filtering.
    pub merchants_loaded: usize,
    /// Merchant rows surviving the open/association/volume filters.
    pub merchants_analyzed: usize,
    /// Rating rows read from the MCC table.
    pub ratings_loaded: usize,
    /// Analyzed merchants whose MCC matched a rating row.
    pub matched_ratings: usize,
    /// Wall-clock seconds spent loading the input files.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent in the pipeline stages.
    pub compute_time_seconds: f64,
}

/// The complete output of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct ExposureReport {
    /// The enriched table, one row per analyzed merchant.
    pub records: Vec<EnrichedMerchantRecord>,
    /// Sum of exposure over rows where it is computable.
    pub total_exposure: f64,
    /// Maximum exposure over the same rows, `None` when no row has one.
    pub max_exposure: Option<f64>,
    /// Merchant count per exposure category, in ascending threshold order.
    pub category_counts: BTreeMap<ExposureCategory, u64>,
    /// Run metadata.
    pub metadata: ReportMetadata,
}

// ── ExposurePipeline ──────────────────────────────────────────────────────────

/// Single-pass exposure computation over the two input tables.
pub struct ExposurePipeline {
    config: PipelineConfig,
}

impl Default for ExposurePipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl ExposurePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Load both tables from disk and run the pipeline.
    pub fn run_files(
        &self,
        apps_path: &Path,
        mcc_path: &Path,
        delimiter: char,
        month: Month,
    ) -> Result<ExposureReport> {
        let load_start = std::time::Instant::now();
        let merchants = load_merchants(apps_path, delimiter)?;
        let ratings = load_ratings(mcc_path, delimiter)?;
        let load_time = load_start.elapsed().as_secs_f64();

        let mut report = self.run_tables(merchants, ratings, month);
        report.metadata.load_time_seconds = load_time;
        Ok(report)
    }

    /// Run the pipeline over already-loaded tables.
    pub fn run_tables(
        &self,
        merchants: Vec<MerchantRecord>,
        ratings: Vec<CategoryRiskRating>,
        month: Month,
    ) -> ExposureReport {
        let compute_start = std::time::Instant::now();
        let merchants_loaded = merchants.len();
        let ratings_loaded = ratings.len();

        // ── Stage 1: Filter ───────────────────────────────────────────────────
        let analyzed: Vec<MerchantRecord> = merchants
            .into_iter()
            .filter(|m| self.retain(m))
            .collect();
        debug!(
            "Filter kept {} of {} merchant rows",
            analyzed.len(),
            merchants_loaded
        );

        // ── Stage 4 prep: rating lookup ───────────────────────────────────────
        let rating_map = build_rating_map(ratings);

        // ── Stages 2-5 + 7: per-row enrichment ────────────────────────────────
        let mut matched_ratings = 0usize;
        let records: Vec<EnrichedMerchantRecord> = analyzed
            .into_iter()
            .map(|m| {
                if rating_map.contains_key(&m.mcc) {
                    matched_ratings += 1;
                }
                self.enrich(m, &rating_map, month)
            })
            .collect();

        // ── Stage 6: scalar aggregates ────────────────────────────────────────
        let total_exposure = RiskCalculator::total_exposure(&records);
        let max_exposure = RiskCalculator::max_exposure(&records);

        // ── Stage 8: group counts ─────────────────────────────────────────────
        let mut category_counts: BTreeMap<ExposureCategory, u64> = BTreeMap::new();
        for record in &records {
            if let Some(category) = record.category {
                *category_counts.entry(category).or_insert(0) += 1;
            }
        }

        let metadata = ReportMetadata {
            generated_at: Utc::now().to_rfc3339(),
            month: month.to_string(),
            merchants_loaded,
            merchants_analyzed: records.len(),
            ratings_loaded,
            matched_ratings,
            load_time_seconds: 0.0,
            compute_time_seconds: compute_start.elapsed().as_secs_f64(),
        };

        ExposureReport {
            records,
            total_exposure,
            max_exposure,
            category_counts,
            metadata,
        }
    }

    // ── Private ───────────────────────────────────────────────────────────────

    /// Stage 1 predicate: open accounts outside the excluded association with
    /// meaningful sales volume.
    fn retain(&self, merchant: &MerchantRecord) -> bool {
        merchant.date_closed.is_none()
            && merchant.association != self.config.excluded_association
            && merchant.gross_sales_volume > self.config.min_gross_sales
    }

    /// Stages 2, 3, 5, and 7 for one merchant, with the rating join applied.
    fn enrich(
        &self,
        merchant: MerchantRecord,
        ratings: &HashMap<String, CategoryRiskRating>,
        month: Month,
    ) -> EnrichedMerchantRecord {
        let days_processing =
            RiskCalculator::days_processing(merchant.date_opened, month, &self.config);

        // The filter guarantees a positive denominator.
        let refund_rate = merchant.credit_volume / merchant.gross_sales_volume;
        let chargeback_rate = merchant.chargeback_volume / merchant.gross_sales_volume;

        let (cnp_coefficient, cp_coefficient) = match ratings.get(&merchant.mcc) {
            Some(rating) => (rating.cnp_coefficient, rating.cp_coefficient),
            None => (None, None),
        };

        let risk = RiskCalculator::risk_components(
            merchant.cnp_volume,
            merchant.cp_volume,
            days_processing,
            refund_rate,
            chargeback_rate,
            cnp_coefficient,
            cp_coefficient,
            &self.config,
        );

        let category = risk.exposure.map(ExposureCategory::from_value);

        EnrichedMerchantRecord {
            merchant,
            days_processing,
            refund_rate,
            chargeback_rate,
            cnp_coefficient,
            cp_coefficient,
            risk,
            category,
        }
    }
}

/// Key the rating table by normalised MCC. First occurrence wins; later
/// duplicates are logged and dropped.
fn build_rating_map(ratings: Vec<CategoryRiskRating>) -> HashMap<String, CategoryRiskRating> {
    let mut map: HashMap<String, CategoryRiskRating> = HashMap::with_capacity(ratings.len());
    for rating in ratings {
        if map.contains_key(&rating.mcc) {
            warn!("Duplicate MCC {} in rating table; keeping first", rating.mcc);
            continue;
        }
        map.insert(rating.mcc.clone(), rating);
    }
    map
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn merchant(id: &str, mcc: &str) -> MerchantRecord {
        MerchantRecord {
            account_id: id.to_string(),
            merchant_id: id.to_string(),
            mcc: mcc.to_string(),
            association: 44,
            date_opened: date(2024, 1, 1),
            date_closed: None,
            gross_sales_volume: 10_000.0,
            credit_volume: 200.0,
            chargeback_volume: 10.0,
            cnp_volume: 6_000.0,
            cp_volume: 4_000.0,
        }
    }

    fn rating(mcc: &str, cnp: f64, cp: f64) -> CategoryRiskRating {
        CategoryRiskRating {
            mcc: mcc.to_string(),
            cnp_coefficient: Some(cnp),
            cp_coefficient: Some(cp),
        }
    }

    fn run(
        merchants: Vec<MerchantRecord>,
        ratings: Vec<CategoryRiskRating>,
        month: Month,
    ) -> ExposureReport {
        ExposurePipeline::default().run_tables(merchants, ratings, month)
    }

    // ── Stage 1: filtering ───────────────────────────────────────────────────

    #[test]
    fn test_filter_drops_closed_accounts() {
        let mut closed = merchant("M-closed", "5999");
        closed.date_closed = Some(date(2024, 5, 1));

        let report = run(
            vec![merchant("M-open", "5999"), closed],
            vec![rating("5999", 0.5, 0.25)],
            Month::September,
        );

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].merchant.merchant_id, "M-open");
    }

    #[test]
    fn test_filter_drops_excluded_association() {
        let mut excluded = merchant("M-excl", "5999");
        excluded.association = 192_024;

        let report = run(
            vec![merchant("M-kept", "5999"), excluded],
            vec![rating("5999", 0.5, 0.25)],
            Month::September,
        );

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].merchant.merchant_id, "M-kept");
    }

    #[test]
    fn test_filter_drops_low_volume() {
        let mut tiny = merchant("M-tiny", "5999");
        tiny.gross_sales_volume = 1.0; // not strictly greater than 1
        let mut zero = merchant("M-zero", "5999");
        zero.gross_sales_volume = 0.0;

        let report = run(
            vec![merchant("M-kept", "5999"), tiny, zero],
            vec![rating("5999", 0.5, 0.25)],
            Month::September,
        );

        assert_eq!(report.records.len(), 1);
    }

    #[test]
    fn test_post_filter_invariants() {
        let mut rows = vec![merchant("A", "5999"), merchant("B", "7995")];
        rows[1].association = 192_024;
        let mut closed = merchant("C", "5999");
        closed.date_closed = Some(date(2024, 2, 2));
        rows.push(closed);

        let report = run(rows, vec![], Month::September);

        for record in &report.records {
            assert!(record.merchant.date_closed.is_none());
            assert_ne!(record.merchant.association, 192_024);
            assert!(record.merchant.gross_sales_volume > 1.0);
        }
    }

    // ── Stage 4: join ────────────────────────────────────────────────────────

    #[test]
    fn test_left_join_preserves_row_count() {
        // Only one of three MCCs is rated; all three rows survive.
        let report = run(
            vec![
                merchant("A", "5999"),
                merchant("B", "7995"),
                merchant("C", "4armed"),
            ],
            vec![rating("5999", 0.5, 0.25)],
            Month::September,
        );

        assert_eq!(report.records.len(), 3);
        assert_eq!(report.metadata.matched_ratings, 1);
    }

    #[test]
    fn test_unmatched_rows_carry_null_coefficients_and_exposure() {
        let report = run(
            vec![merchant("A", "9999")],
            vec![rating("5999", 0.5, 0.25)],
            Month::September,
        );

        let record = &report.records[0];
        assert_eq!(record.cnp_coefficient, None);
        assert_eq!(record.cp_coefficient, None);
        assert_eq!(record.risk.cnp_dd_risk, None);
        assert_eq!(record.exposure(), None);
        assert_eq!(record.category, None);
    }

    #[test]
    fn test_duplicate_rating_first_wins() {
        let report = run(
            vec![merchant("A", "5999")],
            vec![rating("5999", 0.5, 0.25), rating("5999", 9.9, 9.9)],
            Month::September,
        );

        assert_eq!(report.records[0].cnp_coefficient, Some(0.5));
    }

    // ── Stages 2/3/5: derivations ────────────────────────────────────────────

    #[test]
    fn test_enriched_row_values() {
        // Opened 2024-06-15, September window → 107 processing days.
        let mut m = merchant("A", "5999");
        m.date_opened = date(2024, 6, 15);

        let report = run(vec![m], vec![rating("5999", 0.5, 0.25)], Month::September);
        let r = &report.records[0];

        assert_eq!(r.days_processing, Some(107));
        assert!((r.refund_rate - 0.02).abs() < 1e-12);
        assert!((r.chargeback_rate - 0.001).abs() < 1e-12);

        let daily_cnp = 6_000.0 / 107.0;
        assert!((r.risk.refund_risk.unwrap() - daily_cnp * 0.02 * 30.0).abs() < 1e-9);
        assert!((r.risk.chargeback_risk.unwrap() - daily_cnp * 0.001 * 180.0).abs() < 1e-9);
        assert!((r.risk.cnp_dd_risk.unwrap() - daily_cnp * 0.5).abs() < 1e-9);
        assert!((r.risk.cp_dd_risk.unwrap() - (4_000.0 / 107.0) * 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_exposure_is_exact_component_sum() {
        let report = run(
            vec![merchant("A", "5999")],
            vec![rating("5999", 0.5, 0.25)],
            Month::September,
        );
        let risk = &report.records[0].risk;

        let expected = risk.refund_risk.unwrap()
            + risk.chargeback_risk.unwrap()
            + risk.cnp_dd_risk.unwrap()
            + risk.cp_dd_risk.unwrap();
        assert_eq!(risk.exposure.unwrap(), expected);
    }

    #[test]
    fn test_pre_reference_year_account_gets_full_window() {
        let mut m = merchant("A", "5999");
        m.date_opened = date(2023, 5, 1);

        let report = run(vec![m], vec![rating("5999", 0.5, 0.25)], Month::March);
        assert_eq!(report.records[0].days_processing, Some(90));
    }

    #[test]
    fn test_degenerate_window_excluded_from_aggregates() {
        // Opened in October, reporting January: negative window.
        let mut late = merchant("M-late", "5999");
        late.date_opened = date(2024, 10, 1);

        let report = run(
            vec![merchant("M-ok", "5999"), late],
            vec![rating("5999", 0.5, 0.25)],
            Month::January,
        );

        let late_row = report
            .records
            .iter()
            .find(|r| r.merchant.merchant_id == "M-late")
            .unwrap();
        assert_eq!(late_row.days_processing, None);
        assert_eq!(late_row.exposure(), None);

        let ok_row = report
            .records
            .iter()
            .find(|r| r.merchant.merchant_id == "M-ok")
            .unwrap();
        // Only the valid row contributes to the aggregates.
        assert!((report.total_exposure - ok_row.exposure().unwrap()).abs() < 1e-9);
        assert_eq!(report.max_exposure, ok_row.exposure());
    }

    // ── Stages 6-8: aggregates and categorization ────────────────────────────

    #[test]
    fn test_scalar_aggregates_match_rows() {
        let report = run(
            vec![merchant("A", "5999"), merchant("B", "5999")],
            vec![rating("5999", 0.5, 0.25)],
            Month::September,
        );

        let sum: f64 = report.records.iter().filter_map(|r| r.exposure()).sum();
        assert!((report.total_exposure - sum).abs() < 1e-9);

        let max = report
            .records
            .iter()
            .filter_map(|r| r.exposure())
            .fold(f64::MIN, f64::max);
        assert_eq!(report.max_exposure, Some(max));
    }

    #[test]
    fn test_category_counts() {
        // Scale volumes so the three merchants land in three buckets.
        // With 365 window days and coefficients (0.5, 0.25):
        // exposure scales linearly in volume for fixed rates.
        let small = merchant("S", "5999");
        let mut medium = merchant("M", "5999");
        let mut large = merchant("L", "5999");

        // merchant() defaults give an exposure well under 100k.
        // Scale M and L up to cross the thresholds.
        for (m, factor) in [(&mut medium, 5_000.0), (&mut large, 50_000.0)] {
            m.gross_sales_volume *= factor;
            m.credit_volume *= factor;
            m.chargeback_volume *= factor;
            m.cnp_volume *= factor;
            m.cp_volume *= factor;
        }

        let report = run(
            vec![small, medium, large],
            vec![rating("5999", 0.5, 0.25)],
            Month::December,
        );

        let counts = &report.category_counts;
        assert_eq!(counts.get(&ExposureCategory::Under100k), Some(&1));
        assert_eq!(counts.get(&ExposureCategory::Range100k500k), Some(&1));
        assert_eq!(counts.get(&ExposureCategory::RangeOver500k), Some(&1));
    }

    #[test]
    fn test_aggregates_invariant_under_row_order() {
        let rows = vec![
            merchant("A", "5999"),
            merchant("B", "7995"),
            merchant("C", "5999"),
        ];
        let ratings = vec![rating("5999", 0.5, 0.25), rating("7995", 1.2, 0.9)];

        let forward = run(rows.clone(), ratings.clone(), Month::September);
        let mut reversed_rows = rows;
        reversed_rows.reverse();
        let reversed = run(reversed_rows, ratings, Month::September);

        // Summation order may differ in the last ulp; compare within tolerance.
        assert!((forward.total_exposure - reversed.total_exposure).abs() < 1e-9);
        assert_eq!(forward.max_exposure, reversed.max_exposure);
        assert_eq!(forward.category_counts, reversed.category_counts);
    }

    #[test]
    fn test_idempotence() {
        let rows = vec![merchant("A", "5999"), merchant("B", "7995")];
        let ratings = vec![rating("5999", 0.5, 0.25)];

        let first = run(rows.clone(), ratings.clone(), Month::September);
        let second = run(rows, ratings, Month::September);

        assert_eq!(first.records, second.records);
        assert_eq!(first.total_exposure, second.total_exposure);
        assert_eq!(first.max_exposure, second.max_exposure);
        assert_eq!(first.category_counts, second.category_counts);
    }

    #[test]
    fn test_empty_input() {
        let report = run(vec![], vec![], Month::September);
        assert!(report.records.is_empty());
        assert_eq!(report.total_exposure, 0.0);
        assert_eq!(report.max_exposure, None);
        assert!(report.category_counts.is_empty());
    }

    #[test]
    fn test_metadata_counts() {
        let mut closed = merchant("C", "5999");
        closed.date_closed = Some(date(2024, 3, 3));

        let report = run(
            vec![merchant("A", "5999"), merchant("B", "9999"), closed],
            vec![rating("5999", 0.5, 0.25), rating("7995", 1.2, 0.9)],
            Month::September,
        );

        assert_eq!(report.metadata.merchants_loaded, 3);
        assert_eq!(report.metadata.merchants_analyzed, 2);
        assert_eq!(report.metadata.ratings_loaded, 2);
        assert_eq!(report.metadata.matched_ratings, 1);
        assert_eq!(report.metadata.month, "September");
    }
}
