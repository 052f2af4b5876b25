use std::sync::Arc;

use axum::Router;
use bulkrooms_core::counters::CounterService;
use bulkrooms_core::submission::Dispatcher;
use tera::Tera;

use crate::integrations::autosuggest::PlaceSearch;
use crate::integrations::geolocation::Geolocator;
use crate::sessions::SessionStore;
use crate::{contact, health, lookups, pages, wizard};

#[derive(Clone, Debug)]
pub struct SheetNames {
    pub quote: String,
    pub contact: String,
}

/// Everything a handler can reach. Optional lookups are absent when disabled
/// in configuration.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub dispatcher: Arc<dyn Dispatcher>,
    pub geolocator: Option<Arc<dyn Geolocator>>,
    pub places: Option<Arc<dyn PlaceSearch>>,
    pub counters: CounterService,
    pub templates: Arc<Tera>,
    pub sheets: SheetNames,
    pub default_region: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(wizard::routes())
        .merge(contact::routes())
        .merge(lookups::routes())
        .merge(pages::routes())
        .merge(health::routes())
        .with_state(state)
}
