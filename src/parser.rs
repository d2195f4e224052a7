//! JSON parser for zone reading documents.
//!
//! Readings arrive as flat rows, one object per zone, with one optional
//! column per pollutant kind:
//!
//! ```json
//! {
//!   "zone_name": "Maarif",
//!   "vehicle_count": 450,
//!   "total_load_pmx": 65.0,
//!   "total_load_nox": 52.0,
//!   "total_load_co2": 8000.0,
//!   "global_avg_pmx": 45.0
//! }
//! ```
//!
//! Absent columns mean "not measured" and are simply left out of the
//! decoded maps. Unknown columns are ignored.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::reading::{MetricKind, ZoneReading};

/// Flat wire row. One optional column per kind keeps the store schema a
/// plain table.
#[derive(Debug, Deserialize)]
struct RawRow {
    zone_name: String,
    vehicle_count: i64,
    #[serde(default)]
    total_load_pmx: Option<f64>,
    #[serde(default)]
    total_load_nox: Option<f64>,
    #[serde(default)]
    total_load_co2: Option<f64>,
    #[serde(default)]
    global_avg_pmx: Option<f64>,
    #[serde(default)]
    global_avg_nox: Option<f64>,
    #[serde(default)]
    global_avg_co2: Option<f64>,
}

impl From<RawRow> for ZoneReading {
    fn from(row: RawRow) -> Self {
        let mut reading = ZoneReading::new(row.zone_name, row.vehicle_count);
        let loads = [
            (MetricKind::Particulate, row.total_load_pmx),
            (MetricKind::NitrogenOxide, row.total_load_nox),
            (MetricKind::Carbon, row.total_load_co2),
        ];
        for (kind, value) in loads {
            if let Some(value) = value {
                reading.loads.insert(kind, value);
            }
        }
        let averages = [
            (MetricKind::Particulate, row.global_avg_pmx),
            (MetricKind::NitrogenOxide, row.global_avg_nox),
            (MetricKind::Carbon, row.global_avg_co2),
        ];
        for (kind, value) in averages {
            if let Some(value) = value {
                reading.global_avg.insert(kind, value);
            }
        }
        reading
    }
}

/// Decodes a JSON array of reading rows.
///
/// # Errors
///
/// Returns an error if the bytes are not a valid JSON array of rows.
pub fn parse_rows(bytes: &[u8]) -> Result<Vec<ZoneReading>> {
    let rows: Vec<RawRow> =
        serde_json::from_slice(bytes).context("decoding zone reading rows")?;
    Ok(rows.into_iter().map(ZoneReading::from).collect())
}

/// Decodes a single reading from either a bare JSON object or a
/// one-element array (the shape row stores return for `limit=1` queries).
///
/// # Errors
///
/// Returns an error if the bytes decode to neither shape, or to an empty
/// array.
pub fn parse_reading(bytes: &[u8]) -> Result<ZoneReading> {
    if let Ok(row) = serde_json::from_slice::<RawRow>(bytes) {
        return Ok(row.into());
    }
    let rows = parse_rows(bytes).context("decoding zone reading document")?;
    rows.into_iter()
        .next()
        .context("reading document contains no rows")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_ROW: &str = r#"{
        "zone_name": "Maarif",
        "vehicle_count": 450,
        "total_load_pmx": 65.0,
        "total_load_nox": 52.0,
        "total_load_co2": 8000.0,
        "global_avg_pmx": 45.0
    }"#;

    #[test]
    fn test_parse_full_row() {
        let reading = parse_reading(FULL_ROW.as_bytes()).unwrap();
        assert_eq!(reading.zone_name, "Maarif");
        assert_eq!(reading.vehicle_count, 450);
        assert_eq!(reading.load(MetricKind::Particulate), Some(65.0));
        assert_eq!(reading.load(MetricKind::NitrogenOxide), Some(52.0));
        assert_eq!(reading.load(MetricKind::Carbon), Some(8000.0));
        assert_eq!(reading.global_avg.get(&MetricKind::Particulate), Some(&45.0));
        assert_eq!(reading.global_avg.get(&MetricKind::Carbon), None);
    }

    #[test]
    fn test_parse_minimal_row_has_empty_maps() {
        let reading =
            parse_reading(br#"{"zone_name": "Anfa", "vehicle_count": 0}"#).unwrap();
        assert_eq!(reading.zone_name, "Anfa");
        assert!(reading.loads.is_empty());
        assert!(reading.global_avg.is_empty());
    }

    #[test]
    fn test_parse_rows_preserves_order() {
        let body = br#"[
            {"zone_name": "Anfa", "vehicle_count": 1},
            {"zone_name": "Maarif", "vehicle_count": 2}
        ]"#;
        let rows = parse_rows(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].zone_name, "Anfa");
        assert_eq!(rows[1].zone_name, "Maarif");
    }

    #[test]
    fn test_parse_reading_accepts_one_element_array() {
        let body = br#"[{"zone_name": "Anfa", "vehicle_count": 7}]"#;
        let reading = parse_reading(body).unwrap();
        assert_eq!(reading.zone_name, "Anfa");
        assert_eq!(reading.vehicle_count, 7);
    }

    #[test]
    fn test_parse_reading_rejects_empty_array() {
        assert!(parse_reading(b"[]").is_err());
    }

    #[test]
    fn test_parse_invalid_bytes() {
        assert!(parse_rows(&[0xFF, 0xFE, 0x00, 0x01]).is_err());
        assert!(parse_reading(b"{ not json").is_err());
    }

    #[test]
    fn test_unknown_columns_are_ignored() {
        let body = br#"{"zone_name": "Anfa", "vehicle_count": 3, "noise_db": 71.0}"#;
        let reading = parse_reading(body).unwrap();
        assert_eq!(reading.vehicle_count, 3);
        assert!(reading.loads.is_empty());
    }
}
