//! Provider backed by a hosted PostgREST-style row store.
//!
//! The store exposes two tables under `/rest/v1/`: `zones` (id, name) and
//! a readings table holding the current snapshot row for each zone. Both
//! are read with plain GETs; filters ride in the query string
//! (`zone_name=eq.<name>`).

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;

use crate::fetch::auth::{ApiKey, UrlParam};
use crate::fetch::{BasicClient, HttpClient};
use crate::parser::parse_rows;
use crate::providers::{ReadingProvider, StoreAuth};
use crate::reading::{Zone, ZoneReading};

/// Connection settings for a [`RestStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub readings_table: String,
    pub auth: StoreAuth,
}

impl StoreConfig {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let auth = if api_key.is_some() {
            StoreAuth::Header {
                header_name: "apikey".to_string(),
            }
        } else {
            StoreAuth::None
        };
        StoreConfig {
            base_url: base_url.into(),
            api_key,
            readings_table: "zone_readings".to_string(),
            auth,
        }
    }

    /// Reads the connection settings from the environment:
    /// `STORE_URL` (required), `STORE_KEY`, and `STORE_READINGS_TABLE`.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("STORE_URL").context("STORE_URL must be set")?;
        let api_key = std::env::var("STORE_KEY").ok();
        let mut config = Self::new(base_url, api_key);
        if let Ok(table) = std::env::var("STORE_READINGS_TABLE") {
            config.readings_table = table;
        }
        Ok(config)
    }
}

pub struct RestStore {
    config: StoreConfig,
    client: Box<dyn HttpClient>,
}

impl RestStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }

    fn rest_url(&self, path_and_query: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            path_and_query
        )
    }

    async fn get_bytes(&self, path_and_query: &str) -> Result<Vec<u8>> {
        let url = self.rest_url(path_and_query);
        let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

        let response = self
            .client
            .execute(req)
            .await
            .map_err(|e| anyhow!("Failed to send request: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Store returned status {}: {}", status, body));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Builds the auth wrapper stack for `config`. Stores that take a key
/// also get an `Authorization: Bearer` header, which PostgREST-style
/// stores require alongside the key itself.
fn build_client(config: &StoreConfig) -> Result<Box<dyn HttpClient>> {
    let basic = BasicClient::with_timeouts()?;

    let client: Box<dyn HttpClient> = match (&config.auth, &config.api_key) {
        (StoreAuth::None, None) => Box::new(basic),
        (StoreAuth::None, Some(key)) => Box::new(ApiKey::bearer(basic, key.clone())),
        (StoreAuth::Header { header_name }, Some(key)) => Box::new(ApiKey::bearer(
            ApiKey::header(basic, header_name, key),
            key.clone(),
        )),
        (StoreAuth::UrlParam { param_name }, Some(key)) => Box::new(ApiKey::bearer(
            UrlParam {
                inner: basic,
                param_name: param_name.clone(),
                key: key.clone(),
            },
            key.clone(),
        )),
        (auth, None) => {
            return Err(anyhow!("store auth {:?} requires an API key", auth));
        }
    };

    Ok(client)
}

#[async_trait]
impl ReadingProvider for RestStore {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        let bytes = self.get_bytes("zones?select=id,name").await?;
        let zones: Vec<Zone> = serde_json::from_slice(&bytes)
            .map_err(|e| anyhow!("Failed to parse zone list: {}", e))?;
        Ok(zones)
    }

    async fn latest_readings(&self) -> Result<Vec<ZoneReading>> {
        let query = format!("{}?select=*", self.config.readings_table);
        let bytes = self.get_bytes(&query).await?;
        parse_rows(&bytes)
    }

    async fn reading_for(&self, zone_name: &str) -> Result<Option<ZoneReading>> {
        let query = format!(
            "{}?select=*&zone_name=eq.{}&limit=1",
            self.config.readings_table, zone_name
        );
        let bytes = self.get_bytes(&query).await?;
        let rows = parse_rows(&bytes)?;
        Ok(rows.into_iter().next())
    }
}
