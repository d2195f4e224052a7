//! Fixed in-process provider, for demos and offline runs.

use anyhow::Result;
use async_trait::async_trait;

use crate::parser::parse_rows;
use crate::providers::ReadingProvider;
use crate::reading::{MetricKind, Zone, ZoneReading};

/// A provider backed by a fixed list of readings. Zone ids are assigned
/// by position, starting at 1.
pub struct StaticCatalog {
    readings: Vec<ZoneReading>,
}

impl StaticCatalog {
    pub fn new(readings: Vec<ZoneReading>) -> Self {
        Self { readings }
    }

    /// Loads a catalog from a JSON file of reading rows.
    pub fn from_file(path: &str) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::new(parse_rows(&bytes)?))
    }

    /// The built-in demo catalog: five Casablanca districts with plausible
    /// rush-hour loads.
    pub fn seeded() -> Self {
        let seed = [
            ("Maarif", 450, 65.0, 52.0, 8000.0),
            ("Anfa", 180, 28.0, 38.0, 5200.0),
            ("Ain Diab", 320, 42.0, 45.0, 6400.0),
            ("Bourgogne", 520, 58.0, 49.0, 8800.0),
            ("Hay Hassani", 220, 33.0, 40.0, 5600.0),
        ];
        let readings = seed
            .into_iter()
            .map(|(zone, vehicles, pmx, nox, co2)| {
                ZoneReading::new(zone, vehicles)
                    .with_load(MetricKind::Particulate, pmx)
                    .with_load(MetricKind::NitrogenOxide, nox)
                    .with_load(MetricKind::Carbon, co2)
                    .with_global_avg(MetricKind::Particulate, 45.0)
            })
            .collect();
        Self::new(readings)
    }
}

#[async_trait]
impl ReadingProvider for StaticCatalog {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        Ok(self
            .readings
            .iter()
            .enumerate()
            .map(|(i, reading)| Zone {
                id: i as i64 + 1,
                name: reading.zone_name.clone(),
            })
            .collect())
    }

    async fn latest_readings(&self) -> Result<Vec<ZoneReading>> {
        Ok(self.readings.clone())
    }

    async fn reading_for(&self, zone_name: &str) -> Result<Option<ZoneReading>> {
        Ok(self
            .readings
            .iter()
            .find(|reading| reading.zone_name == zone_name)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_catalog_lists_five_zones() {
        let catalog = StaticCatalog::seeded();
        let zones = catalog.list_zones().await.unwrap();
        assert_eq!(zones.len(), 5);
        assert_eq!(zones[0].id, 1);
        assert_eq!(zones[0].name, "Maarif");
        assert_eq!(zones[4].name, "Hay Hassani");
    }

    #[tokio::test]
    async fn test_reading_for_known_zone() {
        let catalog = StaticCatalog::seeded();
        let reading = catalog.reading_for("Maarif").await.unwrap().unwrap();
        assert_eq!(reading.vehicle_count, 450);
        assert_eq!(reading.load(MetricKind::Particulate), Some(65.0));
    }

    #[tokio::test]
    async fn test_reading_for_unknown_zone_is_none() {
        let catalog = StaticCatalog::seeded();
        assert!(catalog.reading_for("Atlantis").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_from_file() {
        let path = format!(
            "{}/zonewatch_test_catalog_{}.json",
            std::env::temp_dir().display(),
            std::process::id()
        );
        std::fs::write(
            &path,
            r#"[{"zone_name": "Anfa", "vehicle_count": 12, "total_load_pmx": 20.0}]"#,
        )
        .unwrap();

        let catalog = StaticCatalog::from_file(&path).unwrap();
        let readings = catalog.latest_readings().await.unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].zone_name, "Anfa");

        std::fs::remove_file(&path).unwrap();
    }
}
