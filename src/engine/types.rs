//! Output types produced by the metrics engine.

use crate::reading::MetricKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Discrete severity classification for a metric value.
///
/// The derived order is the severity order: `Good < Moderate < High <
/// Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SeverityBand {
    Good,
    Moderate,
    High,
    Critical,
}

impl SeverityBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityBand::Good => "good",
            SeverityBand::Moderate => "moderate",
            SeverityBand::High => "high",
            SeverityBand::Critical => "critical",
        }
    }
}

impl fmt::Display for SeverityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weighted composite score with its band on the composite scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeIndex {
    pub score: i64,
    pub band: SeverityBand,
}

/// Display-ready figures for a single measured pollutant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantMetric {
    pub value: f64,
    pub unit: String,
    pub limit: f64,
    /// `value / limit`, uncapped; display layers clamp the progress bar.
    pub ratio: f64,
    pub band: SeverityBand,
}

/// One point of the synthetic trend series: composite estimate plus the
/// lead pollutant's raw estimate under a shared time label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub label: String,
    pub index: i64,
    pub load: f64,
}

/// Complete derived-metrics output for one zone.
///
/// Built fresh on every aggregation call; nothing in a bundle is shared or
/// reused across calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricBundle {
    pub zone: String,
    pub vehicle_count: i64,
    pub composite: CompositeIndex,
    pub pollutants: BTreeMap<MetricKind, PollutantMetric>,
    pub trend: Vec<TrendPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_total_order() {
        assert!(SeverityBand::Good < SeverityBand::Moderate);
        assert!(SeverityBand::Moderate < SeverityBand::High);
        assert!(SeverityBand::High < SeverityBand::Critical);
    }

    #[test]
    fn test_band_serializes_lowercase() {
        let json = serde_json::to_string(&SeverityBand::Moderate).unwrap();
        assert_eq!(json, "\"moderate\"");
    }
}
