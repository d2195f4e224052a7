use crate::config::EngineConfig;
use crate::engine::classify::classify;
use crate::engine::index::compute_index;
use crate::engine::series::project_series;
use crate::engine::types::{CompositeIndex, MetricBundle, PollutantMetric, TrendPoint};
use crate::error::{EngineError, EngineResult};
use crate::reading::ZoneReading;
use std::collections::BTreeMap;

/// Aggregates a single [`ZoneReading`] into a full [`MetricBundle`].
///
/// Composes the composite index, per-pollutant severity metrics, and the
/// synthetic trend series. Pure: the same reading and configuration always
/// produce an identical bundle, so callers may re-run it freely.
pub fn aggregate_reading(
    reading: &ZoneReading,
    config: &EngineConfig,
) -> EngineResult<MetricBundle> {
    if reading.vehicle_count < 0 {
        return Err(EngineError::Validation(format!(
            "vehicle count {} for zone '{}' is negative",
            reading.vehicle_count, reading.zone_name
        )));
    }

    let score = compute_index(&reading.loads, &config.weights)?;
    let composite = CompositeIndex {
        score,
        band: config.composite.band_for(score as f64),
    };

    let mut pollutants = BTreeMap::new();
    for (kind, value) in &reading.loads {
        let spec = config.pollutant(*kind)?;
        pollutants.insert(
            *kind,
            PollutantMetric {
                value: *value,
                unit: spec.unit.clone(),
                limit: spec.limit,
                ratio: *value / spec.limit,
                band: classify(config, *kind, *value)?,
            },
        );
    }

    let trend = build_trend(reading, config, score)?;

    Ok(MetricBundle {
        zone: reading.zone_name.clone(),
        vehicle_count: reading.vehicle_count,
        composite,
        pollutants,
        trend,
    })
}

/// Zips two synthetic series into trend points: the composite index ramp
/// and the lead pollutant's load ramp, one point per configured label.
fn build_trend(
    reading: &ZoneReading,
    config: &EngineConfig,
    score: i64,
) -> EngineResult<Vec<TrendPoint>> {
    let projection = &config.projection;

    let historical_score = compute_index(&reading.global_avg, &config.weights)?;
    let index_series = project_series(
        score as f64,
        historical_score as f64,
        &projection.labels,
        projection.spread_ratio,
    )?;

    let lead_now = reading.loads.get(&projection.lead).copied().unwrap_or(0.0);
    let lead_avg = reading
        .global_avg
        .get(&projection.lead)
        .copied()
        .unwrap_or(0.0);
    let load_series = project_series(
        lead_now,
        lead_avg,
        &projection.labels,
        projection.spread_ratio,
    )?;

    Ok(index_series
        .points()
        .zip(load_series.points())
        .map(|(index, load)| TrendPoint {
            label: index.label,
            index: index.value.round() as i64,
            load: load.value,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::SeverityBand;
    use crate::reading::MetricKind;

    fn maarif() -> ZoneReading {
        ZoneReading::new("Maarif", 450)
            .with_load(MetricKind::Particulate, 65.0)
            .with_load(MetricKind::NitrogenOxide, 52.0)
            .with_load(MetricKind::Carbon, 8000.0)
            .with_global_avg(MetricKind::Particulate, 45.0)
    }

    #[test]
    fn test_maarif_scenario() {
        let bundle = aggregate_reading(&maarif(), &EngineConfig::default()).unwrap();

        // 65×0.23 + 52×0.18 + 8000×0.001 = 32.31 → 32
        assert_eq!(bundle.composite.score, 32);
        assert_eq!(bundle.composite.band, SeverityBand::Moderate);
        assert_eq!(bundle.zone, "Maarif");
        assert_eq!(bundle.vehicle_count, 450);

        let pmx = &bundle.pollutants[&MetricKind::Particulate];
        assert_eq!(pmx.band, SeverityBand::Critical);
        assert_eq!(pmx.limit, 25.0);
        assert!((pmx.ratio - 2.6).abs() < 1e-9);

        let nox = &bundle.pollutants[&MetricKind::NitrogenOxide];
        assert_eq!(nox.band, SeverityBand::Good);

        let co2 = &bundle.pollutants[&MetricKind::Carbon];
        assert_eq!(co2.band, SeverityBand::Moderate);
    }

    #[test]
    fn test_maarif_trend_shape() {
        let bundle = aggregate_reading(&maarif(), &EngineConfig::default()).unwrap();

        assert_eq!(bundle.trend.len(), 7);
        assert_eq!(bundle.trend[0].label, "00h");

        // Load ramp starts at 45 - 0.15×45 = 38.25 and ends on the
        // measured particulate load.
        assert_eq!(bundle.trend[0].load, 38.25);
        let last = bundle.trend.last().unwrap();
        assert_eq!(last.label, "24h");
        assert_eq!(last.load, 65.0);
        assert_eq!(last.index, 32);
    }

    #[test]
    fn test_identical_runs_produce_identical_bundles() {
        let config = EngineConfig::default();
        let reading = maarif();

        let first = aggregate_reading(&reading, &config).unwrap();
        let second = aggregate_reading(&reading, &config).unwrap();
        assert_eq!(first, second);

        let first_json = serde_json::to_string(&first).unwrap();
        let second_json = serde_json::to_string(&second).unwrap();
        assert_eq!(first_json, second_json);
    }

    #[test]
    fn test_negative_vehicle_count_is_validation_error() {
        let reading = ZoneReading::new("Anfa", -1).with_load(MetricKind::Particulate, 10.0);
        let err = aggregate_reading(&reading, &EngineConfig::default()).unwrap_err();
        assert!(err.is_validation(), "got {err:?}");
    }

    #[test]
    fn test_measured_kind_without_pollutant_spec_is_configuration_error() {
        let mut config = EngineConfig::default();
        config.pollutants.remove(&MetricKind::Carbon);

        let reading = ZoneReading::new("Anfa", 10).with_load(MetricKind::Carbon, 100.0);
        let err = aggregate_reading(&reading, &config).unwrap_err();
        assert!(err.is_configuration(), "got {err:?}");
    }

    #[test]
    fn test_bad_load_propagates_validation_error() {
        let reading = ZoneReading::new("Anfa", 10).with_load(MetricKind::Particulate, f64::NAN);
        let err = aggregate_reading(&reading, &EngineConfig::default()).unwrap_err();
        assert!(err.is_validation(), "got {err:?}");
    }

    #[test]
    fn test_unmeasured_kinds_are_absent_from_pollutants() {
        let reading = ZoneReading::new("Anfa", 10).with_load(MetricKind::Particulate, 12.0);
        let bundle = aggregate_reading(&reading, &EngineConfig::default()).unwrap();

        assert_eq!(bundle.pollutants.len(), 1);
        assert!(bundle.pollutants.contains_key(&MetricKind::Particulate));
    }
}
