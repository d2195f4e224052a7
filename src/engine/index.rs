//! Weighted composite index over raw pollutant loads.

use crate::error::{EngineError, EngineResult};
use crate::reading::MetricKind;
use std::collections::BTreeMap;

/// Computes `Σ loads[k] × weights[k]` over the kinds present in both maps,
/// rounded half-away-from-zero to an integer (`f64::round` semantics).
///
/// Kinds missing from `loads` are unmeasured and contribute zero; that is
/// not an error. The result is non-negative for valid input.
///
/// # Errors
///
/// `Validation` if any load in the map is negative or non-finite, or if the
/// weighted sum itself is non-finite.
pub fn compute_index(
    loads: &BTreeMap<MetricKind, f64>,
    weights: &BTreeMap<MetricKind, f64>,
) -> EngineResult<i64> {
    let mut sum = 0.0;
    for (kind, load) in loads {
        if !load.is_finite() || *load < 0.0 {
            return Err(EngineError::Validation(format!(
                "load for '{kind}' is {load}: expected a non-negative finite number"
            )));
        }
        if let Some(weight) = weights.get(kind) {
            sum += load * weight;
        }
    }
    if !sum.is_finite() {
        return Err(EngineError::Validation(format!(
            "composite sum is not finite ({sum})"
        )));
    }
    Ok(sum.round() as i64)
}
