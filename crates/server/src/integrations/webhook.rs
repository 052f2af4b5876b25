use async_trait::async_trait;
use bulkrooms_core::config::WebhookConfig;
use bulkrooms_core::submission::{Dispatcher, SubmissionRecord, TransportError};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use crate::integrations::http_client;

/// Posts records to the spreadsheet web app. Any HTTP response counts as
/// delivered; the body is never read.
#[derive(Clone)]
pub struct HttpDispatcher {
    client: Client,
    url: SecretString,
}

impl HttpDispatcher {
    pub fn new(config: &WebhookConfig) -> Result<Self, reqwest::Error> {
        Ok(Self { client: http_client(config.timeout_secs)?, url: config.url.clone() })
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    async fn dispatch(&self, record: &SubmissionRecord) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.url.expose_secret())
            .json(record)
            .send()
            .await
            .map_err(|error| {
                let error = error.without_url();
                warn!(
                    event_name = "integration.webhook.transport_failed",
                    record_kind = record.kind(),
                    sheet_name = record.sheet_name(),
                    error = %error,
                    "webhook request could not be delivered"
                );
                TransportError::new(error.to_string())
            })?;

        info!(
            event_name = "integration.webhook.delivered",
            record_kind = record.kind(),
            sheet_name = record.sheet_name(),
            status = %response.status(),
            "webhook request delivered"
        );
        Ok(())
    }
}
