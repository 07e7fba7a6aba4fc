use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::RitmoError;

use super::parse::MAX_COVER_CANDIDATES;

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
}

/// Image-search lookup for cover candidates.
///
/// Only constructed when the optional credentials are present; without them
/// cover lookup goes straight to the generative path.
pub struct ImageSearchClient {
    client: Client,
    api_key: String,
    engine_id: String,
}

impl ImageSearchClient {
    pub fn new(api_key: String, engine_id: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RitmoError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(ImageSearchClient {
            client,
            api_key,
            engine_id,
        })
    }

    /// None when the optional credentials are not configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        match (&config.image_search_api_key, &config.image_search_engine_id) {
            (Some(api_key), Some(engine_id)) => Ok(Some(ImageSearchClient::new(
                api_key.clone(),
                engine_id.clone(),
                Duration::from_secs(config.request_timeout_secs),
            )?)),
            _ => Ok(None),
        }
    }

    pub async fn cover_urls(
        &self,
        title: &str,
        author: &str,
        year: Option<i32>,
    ) -> Result<Vec<String>> {
        let mut query = format!("\"{}\" \"{}\" book cover", title, author);
        if let Some(year) = year {
            query.push(' ');
            query.push_str(&year.to_string());
        }

        let response = self
            .client
            .get(SEARCH_ENDPOINT)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("searchType", "image"),
                ("num", "6"),
                ("q", query.as_str()),
            ])
            .send()
            .await
            .map_err(|e| RitmoError::ModelApi(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RitmoError::ModelApi(format!(
                "Image search API error ({}): {}",
                status, error_text
            )));
        }

        let results: SearchResponse = response
            .json()
            .await
            .map_err(|e| RitmoError::ModelApi(format!("Failed to parse response: {}", e)))?;

        Ok(results
            .items
            .into_iter()
            .map(|item| item.link)
            .take(MAX_COVER_CANDIDATES)
            .collect())
    }
}
