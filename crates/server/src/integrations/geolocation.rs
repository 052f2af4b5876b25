use async_trait::async_trait;
use bulkrooms_core::config::GeolocationConfig;
use bulkrooms_core::domain::place::GeoInfo;
use reqwest::Client;
use serde_json::Value;

use crate::integrations::{http_client, LookupError};

#[async_trait]
pub trait Geolocator: Send + Sync {
    /// Resolves `client_ip`, or the caller's own address when it is unknown.
    async fn locate(&self, client_ip: Option<&str>) -> Result<GeoInfo, LookupError>;
}

/// ipapi.co style lookups: `{base}/{ip}/json/` or `{base}/json/`.
#[derive(Clone)]
pub struct HttpGeolocator {
    client: Client,
    base_url: String,
}

impl HttpGeolocator {
    pub fn new(config: &GeolocationConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: http_client(Some(config.timeout_secs))?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, client_ip: Option<&str>) -> String {
        match client_ip.map(str::trim).filter(|ip| !ip.is_empty()) {
            Some(ip) => format!("{}/{ip}/json/", self.base_url),
            None => format!("{}/json/", self.base_url),
        }
    }
}

#[async_trait]
impl Geolocator for HttpGeolocator {
    async fn locate(&self, client_ip: Option<&str>) -> Result<GeoInfo, LookupError> {
        let response = self.client.get(self.url_for(client_ip)).send().await?;
        if !response.status().is_success() {
            return Err(LookupError::Status(response.status()));
        }

        let payload: Value = response.json().await?;
        if payload.get("error").and_then(Value::as_bool).unwrap_or(false) {
            let reason = payload
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or("unspecified")
                .to_string();
            return Err(LookupError::Provider(reason));
        }

        serde_json::from_value(payload).map_err(|error| LookupError::Provider(error.to_string()))
    }
}
