use clap::Parser;
use std::path::PathBuf;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Merchant exposure and risk reporting for the APPS portfolio
#[derive(Parser, Debug, Clone)]
#[command(
    name = "apps-exposure",
    about = "Merchant exposure and risk reporting for the APPS portfolio",
    version
)]
pub struct Settings {
    /// Path to the APPS merchant ledger (delimited text)
    #[arg(long)]
    pub apps: PathBuf,

    /// Path to the MCC risk-rating table (delimited text)
    #[arg(long)]
    pub mcc: PathBuf,

    /// Reporting month
    #[arg(long, value_parser = [
        "January", "February", "March", "April", "May", "June",
        "July", "August", "September", "October", "November", "December",
    ])]
    pub month: String,

    /// Directory the enriched spreadsheet is written to
    #[arg(long, default_value = ".")]
    pub export_dir: PathBuf,

    /// Skip writing the export file
    #[arg(long)]
    pub no_export: bool,

    /// Output mode for the summary
    #[arg(long, default_value = "table", value_parser = ["table", "json"])]
    pub output: String,

    /// Field delimiter used by both input tables and the export
    #[arg(long, default_value = ",")]
    pub delimiter: char,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,
}
