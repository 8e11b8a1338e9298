use chrono::{Datelike, NaiveDate};

use crate::config::PipelineConfig;
use crate::models::{EnrichedMerchantRecord, RiskComponents};
use crate::months::Month;

// ── RiskCalculator ────────────────────────────────────────────────────────────

/// Stateless collection of the per-merchant exposure calculations.
pub struct RiskCalculator;

impl RiskCalculator {
    /// Estimated days of processing within the reporting window.
    ///
    /// `D` is the selected month's cumulative day-of-year count. Accounts
    /// opened before the reference year receive the full window (`D`, or the
    /// configured override); later accounts receive `D` minus the days
    /// elapsed between January 1 of the open year and the open date.
    ///
    /// Returns `None` when the window resolves to zero or negative days, so
    /// downstream division degenerates to null instead of ±infinity.
    pub fn days_processing(
        date_opened: NaiveDate,
        month: Month,
        config: &PipelineConfig,
    ) -> Option<i64> {
        let window = i64::from(config.month_days.cumulative_days(month));

        if date_opened.year() < config.window_reference_year {
            let days = config.pre_window_days.map(i64::from).unwrap_or(window);
            return (days > 0).then_some(days);
        }

        let jan_first = NaiveDate::from_ymd_opt(date_opened.year(), 1, 1)?;
        let elapsed = (date_opened - jan_first).num_days();
        let days = window - elapsed;
        (days > 0).then_some(days)
    }

    /// The four risk components and their total for one merchant.
    ///
    /// `None` flows through untouched: a degenerate day count nulls every
    /// component, a missing rating coefficient nulls its daily-discount
    /// component, and any null component nulls the total exposure.
    #[allow(clippy::too_many_arguments)]
    pub fn risk_components(
        cnp_volume: f64,
        cp_volume: f64,
        days_processing: Option<i64>,
        refund_rate: f64,
        chargeback_rate: f64,
        cnp_coefficient: Option<f64>,
        cp_coefficient: Option<f64>,
        config: &PipelineConfig,
    ) -> RiskComponents {
        let days = days_processing.map(|d| d as f64);
        let daily_cnp = days.map(|d| cnp_volume / d);
        let daily_cp = days.map(|d| cp_volume / d);

        let refund_risk = daily_cnp.map(|v| v * refund_rate * config.refund_days);
        let chargeback_risk = daily_cnp.map(|v| v * chargeback_rate * config.chargeback_days);
        let cnp_dd_risk = match (daily_cnp, cnp_coefficient) {
            (Some(v), Some(c)) => Some(v * c),
            _ => None,
        };
        let cp_dd_risk = match (daily_cp, cp_coefficient) {
            (Some(v), Some(c)) => Some(v * c),
            _ => None,
        };

        let exposure = match (refund_risk, chargeback_risk, cnp_dd_risk, cp_dd_risk) {
            (Some(r), Some(c), Some(cnp), Some(cp)) => Some(r + c + cnp + cp),
            _ => None,
        };

        RiskComponents {
            refund_risk,
            chargeback_risk,
            cnp_dd_risk,
            cp_dd_risk,
            exposure,
        }
    }

    /// Sum of exposure over rows where it is computable.
    ///
    /// Invariant under row reordering; an empty (or fully null) set sums
    /// to 0.0.
    pub fn total_exposure(records: &[EnrichedMerchantRecord]) -> f64 {
        records.iter().filter_map(|r| r.exposure()).sum()
    }

    /// Maximum exposure over rows where it is computable, `None` when no row
    /// has a value.
    pub fn max_exposure(records: &[EnrichedMerchantRecord]) -> Option<f64> {
        records
            .iter()
            .filter_map(|r| r.exposure())
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
