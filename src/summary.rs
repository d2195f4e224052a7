//! History summarization.
//!
//! Folds the per-zone CSV history written by the sampler into per-zone
//! summaries and a single index document for dashboards. History files
//! are kept in place; summarization only reads them.
//!
//! History layout on disk:
//!
//! ```text
//! <base_dir>/zone=<zone name>/date=<YYYY-MM-DD>.csv
//! ```

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use tracing::info;

use crate::config::{EngineConfig, ThresholdTable};
use crate::engine::types::SeverityBand;
use crate::output::BundleRow;

/// Arithmetic mean. Returns 0.0 for empty input.
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation given a pre-computed mean. Returns 0.0
/// for empty input.
fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

/// Rolled-up history for one zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub zone: String,
    /// Successful sample rows folded into the statistics.
    pub samples: usize,
    /// Failure rows recorded over the same window.
    pub error_rows: usize,
    pub mean_score: f64,
    pub stddev_score: f64,
    pub peak_score: i64,
    /// Band of the mean score under the composite table.
    pub band: SeverityBand,
    pub avg_vehicles: f64,
    pub window_minutes: i64,
}

/// Index document covering every zone with history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneIndex {
    pub generated_at: DateTime<Utc>,
    pub zones: Vec<ZoneSummary>,
}

/// Folds one zone's history rows into a [`ZoneSummary`].
///
/// Failure rows are counted but excluded from the score and vehicle
/// statistics. The summary window spans the first to last row timestamp.
pub fn summarize_zone(zone: &str, rows: &[BundleRow], composite: &ThresholdTable) -> ZoneSummary {
    let window_minutes = if rows.len() < 2 {
        0
    } else {
        let first = rows.first().unwrap().recorded_at;
        let last = rows.last().unwrap().recorded_at;
        (last - first).num_minutes()
    };

    let mut scores = Vec::new();
    let mut vehicles = Vec::new();
    let mut error_rows = 0usize;

    for row in rows {
        if row.is_error() {
            error_rows += 1;
            continue;
        }
        if let Some(score) = row.index_score {
            scores.push(score as f64);
        }
        vehicles.push(row.vehicle_count as f64);
    }

    let mean_score = mean(&scores);
    let peak_score = scores.iter().copied().fold(0.0f64, f64::max) as i64;

    ZoneSummary {
        zone: zone.to_string(),
        samples: scores.len(),
        error_rows,
        mean_score,
        stddev_score: stddev(&scores, mean_score),
        peak_score,
        band: composite.band_for(mean_score),
        avg_vehicles: mean(&vehicles),
        window_minutes,
    }
}

/// Lists the zones that have a history directory under `base_dir`.
pub fn load_zone_names(base_dir: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();

    for entry in fs::read_dir(base_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(dir_name) = entry.file_name().to_str() {
                if let Some(zone) = dir_name.strip_prefix("zone=") {
                    names.push(zone.to_string());
                }
            }
        }
    }

    names.sort();
    Ok(names)
}

/// Loads every history row for `zone`, across all dates.
pub fn load_zone_rows(base_dir: &str, zone: &str) -> Result<Vec<BundleRow>> {
    let mut rows = Vec::new();
    let zone_dir = format!("{}/zone={}", base_dir, zone);

    let mut paths: Vec<_> = fs::read_dir(&zone_dir)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("csv"))
        .collect();
    paths.sort();

    for path in paths {
        let file = File::open(path)?;
        let mut rdr = csv::Reader::from_reader(file);

        for result in rdr.deserialize() {
            let record: BundleRow = result?;
            rows.push(record);
        }
    }

    Ok(rows)
}

/// Summarizes every zone with history under `base_dir` into a
/// [`ZoneIndex`]. Zones with no rows are skipped.
pub fn build_index(base_dir: &str, config: &EngineConfig) -> Result<ZoneIndex> {
    let zone_names = load_zone_names(base_dir)?;
    info!(zones = zone_names.len(), base_dir, "Summarizing history");

    let mut summaries = Vec::new();
    for zone in zone_names {
        let rows = load_zone_rows(base_dir, &zone)?;
        if rows.is_empty() {
            continue;
        }
        summaries.push(summarize_zone(&zone, &rows, &config.composite));
    }

    Ok(ZoneIndex {
        generated_at: Utc::now(),
        zones: summaries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::append_record;
    use chrono::TimeZone;
    use std::env;

    fn score_row(zone: &str, score: i64, vehicles: i64, minute: u32) -> BundleRow {
        BundleRow {
            recorded_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, minute, 0).unwrap(),
            zone: zone.to_string(),
            vehicle_count: vehicles,
            index_score: Some(score),
            index_band: Some("moderate".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_summarize_zone_statistics() {
        let composite = EngineConfig::default().composite;
        let rows = vec![
            score_row("Maarif", 30, 400, 0),
            score_row("Maarif", 40, 450, 10),
            score_row("Maarif", 50, 500, 20),
        ];

        let summary = summarize_zone("Maarif", &rows, &composite);
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.error_rows, 0);
        assert_eq!(summary.mean_score, 40.0);
        assert_eq!(summary.peak_score, 50);
        assert_eq!(summary.band, SeverityBand::Moderate);
        assert_eq!(summary.avg_vehicles, 450.0);
        assert_eq!(summary.window_minutes, 20);
        // population stddev of [30, 40, 50]
        assert!((summary.stddev_score - 8.164965809).abs() < 1e-6);
    }

    #[test]
    fn test_error_rows_are_counted_but_excluded() {
        let composite = EngineConfig::default().composite;
        let mut error = BundleRow::from_error("Anfa", "fetch_error", "timed out");
        error.recorded_at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 5, 0).unwrap();

        let rows = vec![score_row("Anfa", 20, 100, 0), error, score_row("Anfa", 20, 100, 10)];
        let summary = summarize_zone("Anfa", &rows, &composite);

        assert_eq!(summary.samples, 2);
        assert_eq!(summary.error_rows, 1);
        assert_eq!(summary.mean_score, 20.0);
        assert_eq!(summary.avg_vehicles, 100.0);
    }

    #[test]
    fn test_single_row_window_is_zero() {
        let composite = EngineConfig::default().composite;
        let summary = summarize_zone("Anfa", &[score_row("Anfa", 10, 50, 0)], &composite);
        assert_eq!(summary.window_minutes, 0);
        assert_eq!(summary.samples, 1);
    }

    #[test]
    fn test_build_index_over_history_dir() {
        let base_dir = format!(
            "{}/zonewatch_test_index_{}",
            env::temp_dir().display(),
            std::process::id()
        );
        let zone_dir = format!("{}/zone=Test Zone", base_dir);
        let _ = fs::remove_dir_all(&base_dir);
        fs::create_dir_all(&zone_dir).unwrap();

        let csv_path = format!("{}/date=2026-03-14.csv", zone_dir);
        append_record(&csv_path, &score_row("Test Zone", 30, 200, 0)).unwrap();
        append_record(&csv_path, &score_row("Test Zone", 50, 300, 30)).unwrap();

        let index = build_index(&base_dir, &EngineConfig::default()).unwrap();
        assert_eq!(index.zones.len(), 1);
        let summary = &index.zones[0];
        assert_eq!(summary.zone, "Test Zone");
        assert_eq!(summary.samples, 2);
        assert_eq!(summary.mean_score, 40.0);

        // history must survive summarization
        assert!(std::path::Path::new(&csv_path).exists());

        fs::remove_dir_all(&base_dir).unwrap();
    }

    #[test]
    fn test_zone_names_are_sorted() {
        let base_dir = format!(
            "{}/zonewatch_test_names_{}",
            env::temp_dir().display(),
            std::process::id()
        );
        let _ = fs::remove_dir_all(&base_dir);
        fs::create_dir_all(format!("{}/zone=Maarif", base_dir)).unwrap();
        fs::create_dir_all(format!("{}/zone=Anfa", base_dir)).unwrap();
        fs::create_dir_all(format!("{}/not_a_zone", base_dir)).unwrap();

        let names = load_zone_names(&base_dir).unwrap();
        assert_eq!(names, vec!["Anfa".to_string(), "Maarif".to_string()]);

        fs::remove_dir_all(&base_dir).unwrap();
    }
}
