//! REST data source.
//!
//! `GET {base}/api/v1/generations/{id}/items?shape=...` for listings and
//! `GET {base}/api/v1/items/{id}?shape=...` for single records. Ids are pushed
//! as single percent-encoded path segments.

use crate::config::ClientConfig;
use async_trait::async_trait;
use dexnav_core::{CatalogSource, FetchShape, Item, ItemId, PartitionId, TransportError};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

#[derive(Clone)]
pub struct RestCatalogSource {
    client: reqwest::Client,
    base_url: Url,
}

impl RestCatalogSource {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let base_url = Url::parse(&config.api_base_url).map_err(|e| {
            TransportError::unreachable(format!("invalid base url {}: {}", config.api_base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::unreachable(format!(
                "base url {} cannot carry a path",
                config.api_base_url
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TransportError::unreachable(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn list_url(&self, partition: PartitionId) -> Result<Url, TransportError> {
        let partition = partition.to_string();
        self.endpoint(&["api", "v1", "generations", &partition, "items"])
    }

    fn detail_url(&self, id: &ItemId) -> Result<Url, TransportError> {
        // Dot segments would be normalised away by the server.
        if matches!(id.as_str(), "" | "." | "..") {
            return Err(TransportError::not_found(format!("item {:?}", id.as_str())));
        }
        self.endpoint(&["api", "v1", "items", id.as_str()])
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|_| TransportError::unreachable(format!("base url {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        shape: FetchShape,
        what: String,
    ) -> Result<T, TransportError> {
        tracing::debug!(%url, %shape, "fetching");
        let response = self
            .client
            .get(url)
            .query(&[("shape", shape.as_str())])
            .send()
            .await
            .map_err(|e| TransportError::unreachable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TransportError::NotFound { what });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| TransportError::Decode {
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl CatalogSource for RestCatalogSource {
    async fn fetch_list(
        &self,
        partition: PartitionId,
        shape: FetchShape,
    ) -> Result<Vec<Item>, TransportError> {
        let url = self.list_url(partition)?;
        self.get_json(url, shape, format!("generation {}", partition))
            .await
    }

    async fn fetch_detail(&self, id: &ItemId, shape: FetchShape) -> Result<Item, TransportError> {
        let url = self.detail_url(id)?;
        self.get_json(url, shape, format!("item {}", id)).await
    }
}
