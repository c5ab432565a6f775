//! Provides a client for the pollenrapporten.se v1 API.
//!
//! This module defines the `PollenApi` struct: a caching client that fetches
//! the pollen type catalog, the region catalog and the current forecast for a
//! region, and merges them into a [`ForecastTable`]. Each resource is fetched
//! at most once per client instance; create a new instance to refresh.

use crate::error::{ApiError, ApiResult};
use crate::models::{CatalogItem, City, ForecastItem, ForecastTable, ItemsResponse, PollenType};
use reqwest::header::{self, HeaderMap};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::timeout;
use tracing::{debug, info};

/// Production endpoint of the Swedish pollen report service.
pub const BASE_URL: &str = "https://api.pollenrapporten.se";

const POLLEN_TYPES_PATH: &str = "/v1/pollen-types";
const REGIONS_PATH: &str = "/v1/regions";
const FORECASTS_PATH: &str = "/v1/forecasts";

/// Upper bound on any single network call.
const TIMEOUT: Duration = Duration::from_secs(10);

/// An asynchronous, caching client for the pollenrapporten.se API.
///
/// The three cache slots transition once from empty to populated. The
/// `OnceCell` initializers run single-flight, so concurrent first calls to the
/// same accessor perform exactly one fetch; a failed fetch leaves the slot
/// empty and a later call tries again.
///
/// The `reqwest::Client` is handed in by the host so its connection pool can
/// be shared across clients.
pub struct PollenApi {
    client: Client,
    base_url: String,
    timeout: Duration,
    pollen_types: OnceCell<Vec<PollenType>>,
    cities: OnceCell<Vec<City>>,
    forecast: OnceCell<ForecastTable>,
}

impl PollenApi {
    /// Creates a new `PollenApi` against the production base URL.
    pub fn new(client: Client) -> Self {
        Self::new_with_base_url(client, BASE_URL)
    }

    /// Creates a new `PollenApi` with a custom base URL, for a configured
    /// override or a mock server in tests.
    pub fn new_with_base_url(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: TIMEOUT,
            pollen_types: OnceCell::new(),
            cities: OnceCell::new(),
            forecast: OnceCell::new(),
        }
    }

    /// Shrinks the request guard so timeout behavior can be exercised quickly.
    #[cfg(test)]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the pollen type catalog, fetching it on first use.
    ///
    /// Corresponds to the `/v1/pollen-types` endpoint. Catalog order follows
    /// the response order.
    pub async fn get_pollen_types(&self) -> ApiResult<&[PollenType]> {
        let types = self
            .pollen_types
            .get_or_try_init(|| self.fetch_pollen_types())
            .await?;
        Ok(types.as_slice())
    }

    /// Returns the region catalog, fetching it on first use.
    ///
    /// Corresponds to the `/v1/regions` endpoint.
    pub async fn get_cities(&self) -> ApiResult<&[City]> {
        let cities = self.cities.get_or_try_init(|| self.fetch_cities()).await?;
        Ok(cities.as_slice())
    }

    /// Returns the current forecast table, fetching it on first use.
    ///
    /// Both catalogs are populated first if needed. Without an explicit
    /// `region_id` the first region of the catalog is used; that choice is
    /// arbitrary but deterministic. The table is cached once per instance
    /// regardless of region, so a later call with a different region returns
    /// the table already fetched.
    pub async fn get_forecast(&self, region_id: Option<&str>) -> ApiResult<&ForecastTable> {
        self.forecast
            .get_or_try_init(|| async {
                let pollen_types = self.get_pollen_types().await?.to_vec();
                let cities = self.get_cities().await?;
                let region = match region_id {
                    Some(id) if !id.is_empty() => id.to_string(),
                    _ => cities
                        .first()
                        .ok_or_else(|| ApiError::Unexpected {
                            url: format!("{}{}", self.base_url, FORECASTS_PATH),
                            message: "region catalog is empty, cannot resolve a default region"
                                .to_string(),
                        })?
                        .region_id
                        .clone(),
                };
                debug!("Resolved forecast region to '{}'", region);
                self.fetch_forecast(&region, &pollen_types).await
            })
            .await
    }

    async fn fetch_pollen_types(&self) -> ApiResult<Vec<PollenType>> {
        let url = format!("{}{}", self.base_url, POLLEN_TYPES_PATH);
        info!("Fetching pollen type catalog from {}", url);
        let body = self.get_json(&url).await?;
        let response: ItemsResponse<CatalogItem> = decode(&url, body)?;
        debug!("Received {} pollen types", response.items.len());
        Ok(response
            .items
            .into_iter()
            .map(|item| PollenType::new(item.id, item.name))
            .collect())
    }

    async fn fetch_cities(&self) -> ApiResult<Vec<City>> {
        let url = format!("{}{}", self.base_url, REGIONS_PATH);
        info!("Fetching region catalog from {}", url);
        let body = self.get_json(&url).await?;
        let response: ItemsResponse<CatalogItem> = decode(&url, body)?;
        debug!("Received {} regions", response.items.len());
        Ok(response
            .items
            .into_iter()
            .map(|item| City::new(item.id, item.name))
            .collect())
    }

    async fn fetch_forecast(
        &self,
        region_id: &str,
        pollen_types: &[PollenType],
    ) -> ApiResult<ForecastTable> {
        let url = format!(
            "{}{}?region_id={}&current=true",
            self.base_url, FORECASTS_PATH, region_id
        );
        info!("Fetching current forecast from {}", url);
        let body = self.get_json(&url).await?;
        let response: ItemsResponse<ForecastItem> = decode(&url, body)?;
        // Only the first (current) forecast item is consumed. No items at all
        // is a valid "no data for this region" answer and folds into a table
        // with empty level maps.
        let series = response
            .items
            .first()
            .map(|item| item.level_series.as_slice())
            .unwrap_or(&[]);
        Ok(ForecastTable::from_series(pollen_types, series))
    }

    /// Performs one HTTP call with the bounded timeout. The sole network
    /// boundary: every resource accessor routes through here.
    ///
    /// GET returns the parsed JSON body; PUT/PATCH/POST send the optional
    /// JSON body fire-and-forget and return `None`. A fixed
    /// `accept: application/json` header is always sent; `headers` is merged
    /// on top of it.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        headers: HeaderMap,
    ) -> ApiResult<Option<Value>> {
        let mut builder = self
            .client
            .request(method.clone(), url)
            .header(header::ACCEPT, "application/json")
            .headers(headers);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let call = async {
            let response = builder.send().await.map_err(|e| transport_error(url, e))?;
            let response = response
                .error_for_status()
                .map_err(|e| transport_error(url, e))?;
            if method == Method::GET {
                let text = response.text().await.map_err(|e| transport_error(url, e))?;
                let value: Value = serde_json::from_str(&text).map_err(|e| ApiError::Parse {
                    url: url.to_string(),
                    source: Arc::new(e),
                })?;
                Ok(Some(value))
            } else {
                Ok(None)
            }
        };

        match timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout {
                url: url.to_string(),
            }),
        }
    }

    async fn get_json(&self, url: &str) -> ApiResult<Value> {
        self.request(Method::GET, url, None, HeaderMap::new())
            .await?
            .ok_or_else(|| ApiError::Unexpected {
                url: url.to_string(),
                message: "GET request produced no response body".to_string(),
            })
    }
}

fn decode<T: DeserializeOwned>(url: &str, body: Value) -> ApiResult<T> {
    serde_json::from_value(body).map_err(|e| ApiError::Parse {
        url: url.to_string(),
        source: Arc::new(e),
    })
}

fn transport_error(url: &str, err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout {
            url: url.to_string(),
        }
    } else {
        ApiError::Transport {
            url: url.to_string(),
            source: Arc::new(err),
        }
    }
}
