use async_trait::async_trait;
use bulkrooms_core::config::AutosuggestConfig;
use bulkrooms_core::domain::place::PlaceSuggestion;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::integrations::{http_client, LookupError};

pub const API_KEY_HEADER: &str = "x-api-key";

#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn suggest(&self, query: &str, region: &str)
        -> Result<Vec<PlaceSuggestion>, LookupError>;
}

#[derive(Clone)]
pub struct HttpPlaceSearch {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

/// Providers answer either with a bare array or wrapped in `suggestions`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SuggestPayload {
    Bare(Vec<PlaceSuggestion>),
    Wrapped { suggestions: Vec<PlaceSuggestion> },
}

impl HttpPlaceSearch {
    /// `None` when no endpoint is configured.
    pub fn from_config(config: &AutosuggestConfig) -> Result<Option<Self>, reqwest::Error> {
        let Some(base_url) = config.base_url.as_ref() else {
            return Ok(None);
        };
        Ok(Some(Self {
            client: http_client(Some(config.timeout_secs))?,
            base_url: base_url.clone(),
            api_key: config.api_key.clone(),
        }))
    }
}

#[async_trait]
impl PlaceSearch for HttpPlaceSearch {
    async fn suggest(
        &self,
        query: &str,
        region: &str,
    ) -> Result<Vec<PlaceSuggestion>, LookupError> {
        let mut request =
            self.client.get(&self.base_url).query(&[("q", query), ("region", region)]);
        if let Some(api_key) = &self.api_key {
            request = request.header(API_KEY_HEADER, api_key.expose_secret());
        }

        let response = request.send().await.map_err(reqwest::Error::without_url)?;
        if !response.status().is_success() {
            return Err(LookupError::Status(response.status()));
        }

        Ok(match response.json::<SuggestPayload>().await? {
            SuggestPayload::Bare(items) | SuggestPayload::Wrapped { suggestions: items } => items,
        })
    }
}
