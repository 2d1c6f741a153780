//! Core library for the `climate` app.
//!
//! This crate defines:
//! - The Weatherbit client and the mapping of its payloads into one forecast model
//! - A searchable, bundled city directory
//! - Durable storage for the user's saved cities
//! - A refresh service that publishes forecast snapshots to an observer
//!
//! It is used by `climate-cli`, but any front end can drive [`ClimateSession`].

pub mod config;
pub mod directory;
pub mod error;
pub mod icon;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod service;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use directory::CityDirectory;
pub use error::ClimateError;
pub use icon::WeatherIcon;
pub use model::{
    CityRecord, Coordinate, CurrentConditions, DailyEntry, HourlyEntry, SavedCity, WeatherSnapshot,
};
pub use normalize::{LabelZone, NormalizeOptions};
pub use provider::{WeatherProvider, WeatherbitClient, provider_from_config};
pub use service::{RefreshOutcome, Status, WeatherService, WeatherState};
pub use session::ClimateSession;
pub use store::{SaveOutcome, SavedCityStore};
