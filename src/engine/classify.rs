//! Severity classification against configured threshold tables.
//!
//! The dashboards this engine feeds used to re-implement the same
//! `if/else` cascade per view and per metric; here a single scan over a
//! declarative [`ThresholdTable`] replaces all of them.

use crate::config::EngineConfig;
use crate::engine::types::SeverityBand;
use crate::error::{EngineError, EngineResult};
use crate::reading::MetricKind;

/// Classifies `value` for `kind` against the configured thresholds.
///
/// With the default tables:
///
/// | Kind | Range        | Band     |
/// |------|--------------|----------|
/// | pmx  | <= 25        | good     |
/// | pmx  | <= 50        | high     |
/// | pmx  | > 50         | critical |
/// | nox  | <= 60        | good     |
/// | nox  | <= 120       | high     |
/// | nox  | > 120        | critical |
/// | co2  | <= 2500      | good     |
/// | co2  | > 2500       | moderate |
///
/// A value exactly on a bound takes that bound's band. Deterministic and
/// side-effect free: the result depends only on `(kind, value)` and the
/// config.
///
/// # Errors
///
/// `Configuration` if `kind` has no threshold table; `Validation` if
/// `value` is negative or not finite.
pub fn classify(config: &EngineConfig, kind: MetricKind, value: f64) -> EngineResult<SeverityBand> {
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::Validation(format!(
            "cannot classify '{kind}' value {value}: expected a non-negative finite number"
        )));
    }
    let spec = config.pollutant(kind)?;
    Ok(spec.thresholds.band_for(value))
}
