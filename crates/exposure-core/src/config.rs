use serde::{Deserialize, Serialize};

use crate::months::MonthDayTable;

/// Tunable parameters for the exposure pipeline.
///
/// The defaults mirror the production report: association 192024 is the
/// excluded network program, refunds are modelled over a 30-day window and
/// chargebacks over 180 days, and accounts opened before 2024 receive the
/// full reporting window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Association identifier whose merchants are excluded outright.
    pub excluded_association: i64,
    /// Rows with gross sales volume at or below this are dropped.
    pub min_gross_sales: f64,
    /// Days of refund liability carried against daily CNP volume.
    pub refund_days: f64,
    /// Days of chargeback liability carried against daily CNP volume.
    pub chargeback_days: f64,
    /// Accounts opened before this year use the fixed reference window
    /// rather than a window shortened by their open date.
    pub window_reference_year: i32,
    /// Explicit day count for accounts opened before the reference year.
    /// `None` means the selected month's cumulative count is used.
    pub pre_window_days: Option<u32>,
    /// Month → cumulative day-of-year lookup for the reporting window.
    pub month_days: MonthDayTable,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            excluded_association: 192_024,
            min_gross_sales: 1.0,
            refund_days: 30.0,
            chargeback_days: 180.0,
            window_reference_year: 2024,
            pre_window_days: None,
            month_days: MonthDayTable::default(),
        }
    }
}
