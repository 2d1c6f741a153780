//! The surface a front end talks to: forecast state, city search and the
//! saved-city list, owned together for one screen or command run.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

use crate::{
    directory::CityDirectory,
    error::Result,
    model::{CityRecord, Coordinate, SavedCity},
    normalize::NormalizeOptions,
    provider::WeatherProvider,
    service::{RefreshOutcome, WeatherService, WeatherState},
    store::{SaveOutcome, SavedCityStore},
};

pub struct ClimateSession {
    service: WeatherService,
    directory: CityDirectory,
    store: SavedCityStore,
}

impl ClimateSession {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        options: NormalizeOptions,
        directory: CityDirectory,
        store: SavedCityStore,
    ) -> Self {
        Self { service: WeatherService::new(provider, options), directory, store }
    }

    pub fn directory(&self) -> &CityDirectory {
        &self.directory
    }

    pub async fn refresh(&self, latitude: f64, longitude: f64) -> Result<RefreshOutcome> {
        self.service.refresh(Coordinate::new(latitude, longitude)).await
    }

    pub async fn refresh_city(&self, city: &CityRecord) -> Result<RefreshOutcome> {
        self.service.refresh(city.coordinate()).await
    }

    pub async fn refresh_saved(&self, city: &SavedCity) -> Result<RefreshOutcome> {
        self.service.refresh(city.coordinate()).await
    }

    pub fn state(&self) -> WeatherState {
        self.service.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<WeatherState> {
        self.service.subscribe()
    }

    pub fn search(&self, query: &str) -> Vec<&CityRecord> {
        self.directory.search(query)
    }

    pub fn saved_cities(&self) -> Result<Vec<SavedCity>> {
        self.store.list()
    }

    pub fn subscribe_saved(&self) -> watch::Receiver<Vec<SavedCity>> {
        self.store.subscribe()
    }

    pub fn find_saved(&self, name: &str, state: &str) -> Result<Option<SavedCity>> {
        self.store.exists(name, state)
    }

    pub fn save(
        &self,
        name: &str,
        state: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<SaveOutcome> {
        self.store
            .save(name, state, latitude, longitude)
            .inspect_err(|e| self.storage_failed("save", e))
    }

    pub fn save_city(&self, city: &CityRecord) -> Result<SaveOutcome> {
        self.save(&city.name, &city.state, city.latitude, city.longitude)
    }

    pub fn delete(&self, city: &SavedCity) -> Result<bool> {
        self.store.delete(city).inspect_err(|e| self.storage_failed("delete", e))
    }

    pub fn clear_error(&self) {
        self.service.clear_error();
    }

    fn storage_failed(&self, action: &str, e: &crate::ClimateError) {
        warn!(action, error = %e, "saved city update failed");
        self.service.report_error(e.user_message());
    }
}
