//! Ingestion and pipeline layer for the APPS exposure reporter.
//!
//! Responsible for reading the two delimited input tables, resolving their
//! schemas, running the exposure pipeline, and producing the export file and
//! chart series consumed by the presentation layer.

pub mod chart;
pub mod delimited;
pub mod export;
pub mod pipeline;
pub mod reader;
pub mod schema;

pub use exposure_core as core;
