use zonewatch::config::EngineConfig;
use zonewatch::engine::aggregate::aggregate_reading;
use zonewatch::engine::types::SeverityBand;
use zonewatch::output::{BundleRow, append_record};
use zonewatch::parser::parse_rows;
use zonewatch::reading::MetricKind;
use zonewatch::summary::build_index;

#[test]
fn test_full_pipeline() {
    let bytes = include_bytes!("fixtures/sample_rows.json");
    let readings = parse_rows(bytes).expect("Failed to parse rows");
    assert_eq!(readings.len(), 2);

    let config = EngineConfig::default();
    let bundle = aggregate_reading(&readings[0], &config).expect("Failed to aggregate");

    assert_eq!(bundle.zone, "Maarif");
    assert_eq!(bundle.composite.score, 32);
    assert_eq!(bundle.composite.band, SeverityBand::Moderate);
    assert_eq!(bundle.trend.len(), 7);
    assert_eq!(bundle.trend.last().unwrap().load, 65.0);
}

#[test]
fn test_pipeline_with_unmeasured_kind() {
    let bytes = include_bytes!("fixtures/sample_rows.json");
    let readings = parse_rows(bytes).unwrap();

    // the second row carries no carbon column at all
    let config = EngineConfig::default();
    let bundle = aggregate_reading(&readings[1], &config).unwrap();

    assert_eq!(bundle.zone, "Anfa");
    assert_eq!(bundle.composite.score, 13);
    assert_eq!(bundle.composite.band, SeverityBand::Good);
    assert!(!bundle.pollutants.contains_key(&MetricKind::Carbon));
    assert_eq!(
        bundle.pollutants[&MetricKind::Particulate].band,
        SeverityBand::High
    );
}

#[test]
fn test_history_pipeline() {
    let base_dir = format!(
        "{}/zonewatch_it_history_{}",
        std::env::temp_dir().display(),
        std::process::id()
    );
    let zone_dir = format!("{}/zone=Maarif", base_dir);
    let _ = std::fs::remove_dir_all(&base_dir);
    std::fs::create_dir_all(&zone_dir).unwrap();

    let bytes = include_bytes!("fixtures/sample_rows.json");
    let readings = parse_rows(bytes).unwrap();
    let config = EngineConfig::default();
    let bundle = aggregate_reading(&readings[0], &config).unwrap();

    let csv_path = format!("{}/date=2026-08-23.csv", zone_dir);
    append_record(&csv_path, &BundleRow::from_bundle(&bundle)).unwrap();
    append_record(&csv_path, &BundleRow::from_bundle(&bundle)).unwrap();

    let index = build_index(&base_dir, &config).unwrap();
    assert_eq!(index.zones.len(), 1);
    assert_eq!(index.zones[0].zone, "Maarif");
    assert_eq!(index.zones[0].samples, 2);
    assert_eq!(index.zones[0].mean_score, 32.0);
    assert_eq!(index.zones[0].band, SeverityBand::Moderate);

    std::fs::remove_dir_all(&base_dir).unwrap();
}
