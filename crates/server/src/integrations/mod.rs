//! Outbound HTTP clients: the spreadsheet webhook, IP geolocation and the
//! place autosuggest provider.

pub mod autosuggest;
pub mod geolocation;
pub mod webhook;

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("lookup endpoint returned {0}")]
    Status(reqwest::StatusCode),
    #[error("lookup endpoint reported an error: {0}")]
    Provider(String),
}

pub(crate) fn http_client(timeout_secs: Option<u64>) -> Result<Client, reqwest::Error> {
    let builder = Client::builder();
    let builder = match timeout_secs {
        Some(secs) => builder.timeout(Duration::from_secs(secs)),
        None => builder,
    };
    builder.build()
}
