//! Input model: zones, metric kinds, and per-zone readings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The pollutant kinds the engine recognizes.
///
/// The variant order doubles as the display order in serialized bundles.
/// Wire names (`pmx`, `nox`, `co2`) match the column suffixes of the hosted
/// readings table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum MetricKind {
    /// Fine particulate load (PM), µg/m³.
    #[serde(rename = "pmx")]
    Particulate,
    /// Nitrogen-oxide load, ppb.
    #[serde(rename = "nox")]
    NitrogenOxide,
    /// Carbon (CO₂) load, mg.
    #[serde(rename = "co2")]
    Carbon,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [
        MetricKind::Particulate,
        MetricKind::NitrogenOxide,
        MetricKind::Carbon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Particulate => "pmx",
            MetricKind::NitrogenOxide => "nox",
            MetricKind::Carbon => "co2",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A monitored zone as listed by the store's `zones` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: i64,
    pub name: String,
}

/// One complete reading for a geographic zone, as supplied by a provider.
///
/// Immutable once constructed. Kinds absent from `loads` are unmeasured and
/// contribute zero downstream; they are not an error. `vehicle_count` stays
/// signed so that a malformed negative wire value is carried through to
/// validation instead of silently wrapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneReading {
    pub zone_name: String,
    pub vehicle_count: i64,
    /// Raw pollutant loads keyed by kind.
    #[serde(default)]
    pub loads: BTreeMap<MetricKind, f64>,
    /// Historical global average loads keyed by kind.
    #[serde(default)]
    pub global_avg: BTreeMap<MetricKind, f64>,
}

impl ZoneReading {
    pub fn new(zone_name: impl Into<String>, vehicle_count: i64) -> Self {
        ZoneReading {
            zone_name: zone_name.into(),
            vehicle_count,
            loads: BTreeMap::new(),
            global_avg: BTreeMap::new(),
        }
    }

    /// Records a measured load for `kind`.
    pub fn with_load(mut self, kind: MetricKind, value: f64) -> Self {
        self.loads.insert(kind, value);
        self
    }

    /// Records the historical global average for `kind`.
    pub fn with_global_avg(mut self, kind: MetricKind, value: f64) -> Self {
        self.global_avg.insert(kind, value);
        self
    }

    pub fn load(&self, kind: MetricKind) -> Option<f64> {
        self.loads.get(&kind).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(MetricKind::Particulate.as_str(), "pmx");
        assert_eq!(MetricKind::NitrogenOxide.as_str(), "nox");
        assert_eq!(MetricKind::Carbon.as_str(), "co2");
    }

    #[test]
    fn test_kind_order_matches_display_order() {
        let mut sorted = MetricKind::ALL;
        sorted.sort();
        assert_eq!(sorted, MetricKind::ALL);
    }

    #[test]
    fn test_reading_builder() {
        let reading = ZoneReading::new("Maarif", 450)
            .with_load(MetricKind::Particulate, 65.0)
            .with_global_avg(MetricKind::Particulate, 45.0);

        assert_eq!(reading.load(MetricKind::Particulate), Some(65.0));
        assert_eq!(reading.load(MetricKind::NitrogenOxide), None);
        assert_eq!(
            reading.global_avg.get(&MetricKind::Particulate),
            Some(&45.0)
        );
    }
}
