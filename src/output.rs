//! Output formatting and persistence for metric bundles.
//!
//! Supports pretty-printing, JSON serialization, CSV append, and JSON
//! file export. The aggregation itself never touches the clock; rows are
//! timestamped here, at the moment they are recorded.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::types::MetricBundle;
use crate::reading::MetricKind;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// One flat history row, CSV-friendly. Successful samples fill the metric
/// columns; failed samples fill `error_type`/`error_message` instead so
/// outages stay visible in the history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundleRow {
    pub recorded_at: DateTime<Utc>,
    pub zone: String,
    pub vehicle_count: i64,
    pub index_score: Option<i64>,
    pub index_band: Option<String>,
    pub pmx: Option<f64>,
    pub pmx_ratio: Option<f64>,
    pub pmx_band: Option<String>,
    pub nox: Option<f64>,
    pub nox_ratio: Option<f64>,
    pub nox_band: Option<String>,
    pub co2: Option<f64>,
    pub co2_ratio: Option<f64>,
    pub co2_band: Option<String>,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
}

impl BundleRow {
    /// Flattens a bundle into a history row, stamped with the current time.
    pub fn from_bundle(bundle: &MetricBundle) -> Self {
        let pmx = bundle.pollutants.get(&MetricKind::Particulate);
        let nox = bundle.pollutants.get(&MetricKind::NitrogenOxide);
        let co2 = bundle.pollutants.get(&MetricKind::Carbon);

        BundleRow {
            recorded_at: Utc::now(),
            zone: bundle.zone.clone(),
            vehicle_count: bundle.vehicle_count,
            index_score: Some(bundle.composite.score),
            index_band: Some(bundle.composite.band.to_string()),
            pmx: pmx.map(|m| m.value),
            pmx_ratio: pmx.map(|m| m.ratio),
            pmx_band: pmx.map(|m| m.band.to_string()),
            nox: nox.map(|m| m.value),
            nox_ratio: nox.map(|m| m.ratio),
            nox_band: nox.map(|m| m.band.to_string()),
            co2: co2.map(|m| m.value),
            co2_ratio: co2.map(|m| m.ratio),
            co2_band: co2.map(|m| m.band.to_string()),
            error_type: None,
            error_message: None,
        }
    }

    /// Builds a failure row for `zone`, stamped with the current time.
    pub fn from_error(zone: &str, error_type: &str, message: &str) -> Self {
        BundleRow {
            recorded_at: Utc::now(),
            zone: zone.to_string(),
            error_type: Some(error_type.to_string()),
            error_message: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error_type.is_some()
    }
}

/// Logs a metric bundle using Rust's debug pretty-print format.
pub fn print_pretty(bundle: &MetricBundle) {
    debug!("{:#?}", bundle);
}

/// Logs a metric bundle as pretty-printed JSON.
pub fn print_json(bundle: &MetricBundle) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(bundle)?);
    Ok(())
}

/// Appends a [`BundleRow`] to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, row: &BundleRow) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(row)?;
    writer.flush()?;

    Ok(())
}

/// Writes any serializable value to `path` as pretty-printed JSON,
/// replacing the file if it exists.
pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    info!(path, "Wrote JSON export");
    Ok(())
}
