//! Bar-chart data series for the exposure category counts.
//!
//! This module produces the data contract for an external bar-chart
//! renderer: one point per category label with the merchant count and a
//! hover tooltip. No drawing happens here.

use std::collections::BTreeMap;

use exposure_core::models::ExposureCategory;
use serde::Serialize;

/// Chart title shown above the category bars.
pub const CHART_TITLE: &str = "Exposure Count by Threshold Level";

/// X-axis title (category labels).
pub const X_AXIS_TITLE: &str = "Exposure Threshold";

/// Y-axis title (merchant counts).
pub const Y_AXIS_TITLE: &str = "Total Merchants";

/// One bar of the category chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    /// Category label on the x-axis.
    pub label: &'static str,
    /// Merchant count, the bar height.
    pub merchants: u64,
    /// Hover detail.
    pub tooltip: String,
}

/// Build the chart series from the per-category counts.
///
/// Always yields all three categories in ascending threshold order,
/// zero-filling labels with no merchants so the axis stays stable across
/// runs.
pub fn category_series(counts: &BTreeMap<ExposureCategory, u64>) -> Vec<ChartPoint> {
    ExposureCategory::ALL
        .iter()
        .map(|category| {
            let merchants = counts.get(category).copied().unwrap_or(0);
            ChartPoint {
                label: category.label(),
                merchants,
                tooltip: format!("{} merchants", merchants),
            }
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
