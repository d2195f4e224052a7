//! Static engine configuration: threshold tables, composite weights, and
//! projection settings.
//!
//! The built-in defaults reproduce the constants of the source monitoring
//! system. The composite weights in particular (`pmx 0.23`, `nox 0.18`,
//! `co2 0.001`) are carried over as placeholder domain constants with no
//! documented derivation; deployments are expected to override them.
//!
//! A config file is a plain JSON document; any omitted section falls back
//! to the defaults:
//!
//! ```json
//! {
//!   "weights": { "pmx": 0.25, "nox": 0.2, "co2": 0.001 },
//!   "composite": {
//!     "steps": [
//!       { "bound": 25.0, "band": "good" },
//!       { "bound": 50.0, "band": "moderate" },
//!       { "bound": 75.0, "band": "high" }
//!     ],
//!     "above": "critical"
//!   }
//! }
//! ```

use crate::engine::types::SeverityBand;
use crate::error::{EngineError, EngineResult};
use crate::reading::MetricKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One `(upper_bound, band)` entry of a threshold table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdStep {
    pub bound: f64,
    pub band: SeverityBand,
}

/// Ordered severity thresholds terminated by an open-ended top band.
///
/// A value classifies into the first step whose bound is `>=` the value;
/// a value exactly equal to a bound therefore takes that (lower) step's
/// band. Values above every bound take `above`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    pub steps: Vec<ThresholdStep>,
    pub above: SeverityBand,
}

impl ThresholdTable {
    pub fn new(steps: Vec<(f64, SeverityBand)>, above: SeverityBand) -> Self {
        ThresholdTable {
            steps: steps
                .into_iter()
                .map(|(bound, band)| ThresholdStep { bound, band })
                .collect(),
            above,
        }
    }

    /// Returns the band for `value`. The caller is responsible for value
    /// validation; the scan itself is total.
    pub fn band_for(&self, value: f64) -> SeverityBand {
        for step in &self.steps {
            if value <= step.bound {
                return step.band;
            }
        }
        self.above
    }

    /// Checks bound and band ordering. `what` names the table in error
    /// messages (e.g. `"composite"` or a kind name).
    fn validate(&self, what: &str) -> EngineResult<()> {
        if self.steps.is_empty() {
            return Err(EngineError::Configuration(format!(
                "threshold table for {what} has no steps"
            )));
        }
        let mut prev_bound = f64::NEG_INFINITY;
        let mut prev_band = None;
        for step in &self.steps {
            if !step.bound.is_finite() || step.bound < 0.0 {
                return Err(EngineError::Configuration(format!(
                    "threshold table for {what} has invalid bound {}",
                    step.bound
                )));
            }
            if step.bound <= prev_bound {
                return Err(EngineError::Configuration(format!(
                    "threshold bounds for {what} must be strictly increasing"
                )));
            }
            if let Some(prev) = prev_band {
                if step.band < prev {
                    return Err(EngineError::Configuration(format!(
                        "threshold bands for {what} must be non-decreasing"
                    )));
                }
            }
            prev_bound = step.bound;
            prev_band = Some(step.band);
        }
        if let Some(last) = prev_band {
            if self.above < last {
                return Err(EngineError::Configuration(format!(
                    "open-ended band for {what} is below the last step's band"
                )));
            }
        }
        Ok(())
    }
}

/// Per-kind display and classification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantSpec {
    /// Display unit for this kind's load values.
    pub unit: String,
    /// Reference limit used for progress ratios.
    pub limit: f64,
    pub thresholds: ThresholdTable,
}

/// Settings for the synthetic trend series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Fraction of the historical average subtracted to obtain the series
    /// start value.
    pub spread_ratio: f64,
    /// Time labels, in ascending order; the current value lands on the last.
    pub labels: Vec<String>,
    /// Pollutant charted alongside the composite estimate.
    pub lead: MetricKind,
}

/// Complete engine configuration. Read-only after [`validate`] passes;
/// aggregation may run concurrently against a shared instance.
///
/// [`validate`]: EngineConfig::validate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_pollutants")]
    pub pollutants: BTreeMap<MetricKind, PollutantSpec>,
    #[serde(default = "default_weights")]
    pub weights: BTreeMap<MetricKind, f64>,
    #[serde(default = "default_composite")]
    pub composite: ThresholdTable,
    #[serde(default = "default_projection")]
    pub projection: ProjectionConfig,
}

fn default_pollutants() -> BTreeMap<MetricKind, PollutantSpec> {
    use SeverityBand::*;
    let mut map = BTreeMap::new();
    map.insert(
        MetricKind::Particulate,
        PollutantSpec {
            unit: "µg/m³".to_string(),
            limit: 25.0,
            thresholds: ThresholdTable::new(vec![(25.0, Good), (50.0, High)], Critical),
        },
    );
    map.insert(
        MetricKind::NitrogenOxide,
        PollutantSpec {
            unit: "ppb".to_string(),
            limit: 60.0,
            thresholds: ThresholdTable::new(vec![(60.0, Good), (120.0, High)], Critical),
        },
    );
    map.insert(
        MetricKind::Carbon,
        PollutantSpec {
            unit: "mg".to_string(),
            limit: 2500.0,
            thresholds: ThresholdTable::new(vec![(2500.0, Good)], Moderate),
        },
    );
    map
}

fn default_weights() -> BTreeMap<MetricKind, f64> {
    let mut map = BTreeMap::new();
    map.insert(MetricKind::Particulate, 0.23);
    map.insert(MetricKind::NitrogenOxide, 0.18);
    map.insert(MetricKind::Carbon, 0.001);
    map
}

fn default_composite() -> ThresholdTable {
    use SeverityBand::*;
    ThresholdTable::new(
        vec![(25.0, Good), (50.0, Moderate), (75.0, High)],
        Critical,
    )
}

fn default_projection() -> ProjectionConfig {
    ProjectionConfig {
        spread_ratio: 0.15,
        labels: ["00h", "04h", "08h", "12h", "16h", "20h", "24h"]
            .into_iter()
            .map(String::from)
            .collect(),
        lead: MetricKind::Particulate,
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            pollutants: default_pollutants(),
            weights: default_weights(),
            composite: default_composite(),
            projection: default_projection(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json(content: &str) -> EngineResult<Self> {
        let config: EngineConfig = serde_json::from_str(content)
            .map_err(|e| EngineError::Configuration(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file from `path`.
    pub fn from_file(path: &str) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Configuration(format!("cannot read config '{path}': {e}"))
        })?;
        Self::from_json(&content)
    }

    /// Returns the spec for `kind`, or a `Configuration` error if the kind
    /// has no entry.
    pub fn pollutant(&self, kind: MetricKind) -> EngineResult<&PollutantSpec> {
        self.pollutants.get(&kind).ok_or_else(|| {
            EngineError::Configuration(format!("no threshold configuration for kind '{kind}'"))
        })
    }

    /// Checks the whole configuration for ordering and range violations.
    pub fn validate(&self) -> EngineResult<()> {
        for (kind, spec) in &self.pollutants {
            spec.thresholds.validate(kind.as_str())?;
            if !spec.limit.is_finite() || spec.limit <= 0.0 {
                return Err(EngineError::Configuration(format!(
                    "limit for kind '{kind}' must be a positive finite number"
                )));
            }
        }
        for (kind, weight) in &self.weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(EngineError::Configuration(format!(
                    "weight for kind '{kind}' must be a non-negative finite number"
                )));
            }
        }
        self.composite.validate("composite")?;

        let projection = &self.projection;
        if !projection.spread_ratio.is_finite()
            || !(0.0..=1.0).contains(&projection.spread_ratio)
        {
            return Err(EngineError::Configuration(
                "projection spread_ratio must lie in [0, 1]".to_string(),
            ));
        }
        if projection.labels.is_empty() {
            return Err(EngineError::Configuration(
                "projection label set is empty".to_string(),
            ));
        }
        if !self.pollutants.contains_key(&projection.lead) {
            return Err(EngineError::Configuration(format!(
                "projection lead kind '{}' has no pollutant entry",
                projection.lead
            )));
        }
        Ok(())
    }
}
