//! Trait and types for sources of zones and readings.

pub mod catalog;
pub mod store;

pub use catalog::StaticCatalog;
pub use store::{RestStore, StoreConfig};

use anyhow::Result;

use crate::reading::{Zone, ZoneReading};

/// Describes how a row store expects its API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAuth {
    /// No authentication required.
    None,
    /// API key appended as a URL query parameter with the given name.
    UrlParam { param_name: String },
    /// API key sent as an HTTP header with the given name.
    Header { header_name: String },
}

impl StoreAuth {
    /// Returns `true` if an API key is needed.
    pub fn requires_key(&self) -> bool {
        !matches!(self, StoreAuth::None)
    }
}

/// Abstraction over a source of zones and their current readings (e.g. a
/// hosted row store, or the built-in catalog for offline use).
#[async_trait::async_trait]
pub trait ReadingProvider: Send + Sync {
    /// Returns all monitored zones.
    async fn list_zones(&self) -> Result<Vec<Zone>>;

    /// Returns the current reading for every zone that has one.
    async fn latest_readings(&self) -> Result<Vec<ZoneReading>>;

    /// Returns the current reading for one zone, or `None` if the zone
    /// has no rows.
    async fn reading_for(&self, zone_name: &str) -> Result<Option<ZoneReading>>;
}
