//! Google Books volumes API client.
//!
//! Anonymous access works for modest volumes; an API key raises the quota.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{SearchPage, VolumeItem, VolumesResponse};
use super::{BookCandidate, BookProvider, ProviderError};
use crate::query::{
    DEFAULT_COUNTRY, DEFAULT_LANG, DEFAULT_MAX_RESULTS, DEFAULT_ORDER_BY, DEFAULT_PRINT_TYPE,
};

/// Google Books client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleBooksConfig {
    /// API key (optional; anonymous calls are rate-limited harder).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL (default: https://www.googleapis.com/books/v1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Google Books API client.
pub struct GoogleBooksProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleBooksProvider {
    /// Create a new client.
    pub fn new(config: GoogleBooksConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://www.googleapis.com/books/v1".to_string());

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl BookProvider for GoogleBooksProvider {
    fn name(&self) -> &str {
        "google_books"
    }

    async fn search(&self, query: &str, start_index: u32) -> Result<SearchPage, ProviderError> {
        let url = format!("{}/volumes", self.base_url);

        debug!("volume search: query='{}', start_index={}", query, start_index);

        let max_results = DEFAULT_MAX_RESULTS.to_string();
        let mut request = self.client.get(&url).query(&[
            ("q", query),
            ("maxResults", max_results.as_str()),
            ("printType", DEFAULT_PRINT_TYPE),
            ("orderBy", DEFAULT_ORDER_BY),
            ("langRestrict", DEFAULT_LANG),
            ("country", DEFAULT_COUNTRY),
        ]);

        if start_index > 0 {
            request = request.query(&[("startIndex", start_index.to_string())]);
        }
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }

        let response = Self::check_status(request.send().await?).await?;

        let page: VolumesResponse = response.json().await.map_err(|e| {
            ProviderError::Parse(format!("Failed to parse search response: {}", e))
        })?;

        let total_items = page.total_items;
        let candidates = page
            .items
            .into_iter()
            .filter_map(VolumeItem::into_candidate)
            .collect();

        Ok(SearchPage {
            candidates,
            total_items,
        })
    }

    async fn volume_details(&self, volume_id: &str) -> Result<BookCandidate, ProviderError> {
        let url = format!("{}/volumes/{}", self.base_url, volume_id);

        debug!("volume details: id={}", volume_id);

        let mut request = self.client.get(&url).query(&[("country", DEFAULT_COUNTRY)]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }

        let response = Self::check_status(request.send().await?).await?;

        let item: VolumeItem = response.json().await.map_err(|e| {
            ProviderError::Parse(format!("Failed to parse volume response: {}", e))
        })?;

        item.into_candidate().ok_or_else(|| {
            ProviderError::Parse(format!("volume {} has no volumeInfo", volume_id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        let provider = GoogleBooksProvider::new(GoogleBooksConfig::default()).unwrap();
        assert_eq!(provider.base_url, "https://www.googleapis.com/books/v1");
        assert!(provider.api_key.is_none());
    }

    #[test]
    fn test_config_overrides() {
        let provider = GoogleBooksProvider::new(GoogleBooksConfig {
            api_key: Some("k".to_string()),
            base_url: Some("http://localhost:9999/v1".to_string()),
        })
        .unwrap();
        assert_eq!(provider.base_url, "http://localhost:9999/v1");
        assert_eq!(provider.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_config_deserializes_empty_table() {
        let config: GoogleBooksConfig = toml::from_str("").unwrap();
        assert!(config.api_key.is_none());
        assert!(config.base_url.is_none());
    }
}
