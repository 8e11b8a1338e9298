mod bootstrap;

use anyhow::Result;
use clap::Parser;
use exposure_core::config::PipelineConfig;
use exposure_core::formatting::{format_count, format_currency};
use exposure_core::months::Month;
use exposure_core::settings::Settings;
use exposure_data::chart::{category_series, CHART_TITLE};
use exposure_data::export;
use exposure_data::pipeline::{ExposurePipeline, ExposureReport};

fn main() -> Result<()> {
    let settings = Settings::parse();
    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("APPS Exposure v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Month: {}, APPS: {}, MCC: {}",
        settings.month,
        settings.apps.display(),
        settings.mcc.display()
    );

    let month = Month::from_name(&settings.month)?;
    let pipeline = ExposurePipeline::new(PipelineConfig::default());
    let report = pipeline.run_files(&settings.apps, &settings.mcc, settings.delimiter, month)?;

    match settings.output.as_str() {
        "json" => print_json_summary(&report)?,
        _ => print_table_summary(&report),
    }

    if !settings.no_export {
        let path = export::write_report(&report, &settings.export_dir, settings.delimiter)?;
        println!("\nDownload the processed data: {}", path.display());
    }

    Ok(())
}

/// Human-readable summary: the two currency scalars and the category bars.
fn print_table_summary(report: &ExposureReport) {
    println!("Total Exposure: {}", format_currency(report.total_exposure));
    println!(
        "Max Exposure:   {}",
        format_currency(report.max_exposure.unwrap_or(0.0))
    );

    println!("\n{}", CHART_TITLE);
    for point in category_series(&report.category_counts) {
        println!("  {:<16} {:>10}", point.label, format_count(point.merchants));
    }

    println!(
        "\nAnalyzed {} of {} merchants ({} matched a rating)",
        format_count(report.metadata.merchants_analyzed as u64),
        format_count(report.metadata.merchants_loaded as u64),
        format_count(report.metadata.matched_ratings as u64),
    );
}

/// Machine-readable summary of the scalars, category series, and metadata.
/// The enriched table itself goes to the export file, not stdout.
fn print_json_summary(report: &ExposureReport) -> Result<()> {
    let summary = serde_json::json!({
        "total_exposure": report.total_exposure,
        "max_exposure": report.max_exposure,
        "categories": category_series(&report.category_counts),
        "metadata": &report.metadata,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
