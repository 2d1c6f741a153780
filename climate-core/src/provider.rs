use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;

use crate::{Config, error::Result, model::Coordinate};

pub mod weatherbit;

pub use weatherbit::{
    WbCurrentResponse, WbDailyResponse, WbHourlyResponse, WeatherbitClient,
};

/// Remote source of weather data. Each call is one request; nothing is
/// cached or retried at this layer.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_current(&self, at: Coordinate) -> Result<WbCurrentResponse>;

    async fn fetch_hourly(&self, at: Coordinate) -> Result<WbHourlyResponse>;

    async fn fetch_daily(&self, at: Coordinate) -> Result<WbDailyResponse>;
}

/// Construct the Weatherbit provider from config.
pub fn provider_from_config(config: &Config) -> Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        crate::ClimateError::Config(
            "No Weatherbit API key configured.\n\
             Hint: run `climate configure` or set WEATHERBIT_API_KEY."
                .to_string(),
        )
    })?;

    let client = WeatherbitClient::from_config(api_key, config)?;
    Ok(Arc::new(client))
}
