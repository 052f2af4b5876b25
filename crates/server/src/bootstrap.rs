use std::sync::Arc;

use bulkrooms_core::config::{AppConfig, ConfigError, LoadOptions};
use bulkrooms_core::counters::CounterService;
use bulkrooms_core::errors::ApplicationError;
use chrono::Duration;
use thiserror::Error;
use tracing::info;

use crate::app::{AppState, SheetNames};
use crate::integrations::autosuggest::{HttpPlaceSearch, PlaceSearch};
use crate::integrations::geolocation::{Geolocator, HttpGeolocator};
use crate::integrations::webhook::HttpDispatcher;
use crate::pages::init_templates;
use crate::sessions::SessionStore;

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("counters could not be initialised: {0}")]
    Counters(#[source] ApplicationError),
    #[error("http client could not be built: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let counters = CounterService::init(&config.counters).map_err(BootstrapError::Counters)?;
    info!(
        event_name = "system.bootstrap.counters_loaded",
        correlation_id = "bootstrap",
        path = %counters.path().display(),
        quotes_submitted = counters.snapshot().quotes_submitted,
        "counters loaded"
    );

    let geolocator: Option<Arc<dyn Geolocator>> = if config.geolocation.enabled {
        Some(Arc::new(HttpGeolocator::new(&config.geolocation)?))
    } else {
        None
    };
    let places: Option<Arc<dyn PlaceSearch>> =
        match HttpPlaceSearch::from_config(&config.autosuggest)? {
            Some(search) => Some(Arc::new(search)),
            None => None,
        };
    info!(
        event_name = "system.bootstrap.integrations_ready",
        correlation_id = "bootstrap",
        geolocation_enabled = geolocator.is_some(),
        autosuggest_enabled = places.is_some(),
        webhook_timeout_secs = ?config.webhook.timeout_secs,
        "outbound integrations configured"
    );

    let ttl = Duration::seconds(i64::try_from(config.sessions.ttl_secs).unwrap_or(i64::MAX));
    let state = AppState {
        sessions: SessionStore::new(ttl),
        dispatcher: Arc::new(HttpDispatcher::new(&config.webhook)?),
        geolocator,
        places,
        counters,
        templates: init_templates(),
        sheets: SheetNames {
            quote: config.webhook.quote_sheet.clone(),
            contact: config.webhook.contact_sheet.clone(),
        },
        default_region: config.autosuggest.default_region.clone(),
    };

    Ok(Application { config, state })
}
