use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use crate::{
    config::Config,
    error::{ClimateError, Result},
    model::Coordinate,
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.weatherbit.io/v2.0";
pub const DEFAULT_LANG: &str = "pt";
pub const DEFAULT_HOURLY_HOURS: u32 = 24;
pub const DEFAULT_DAILY_DAYS: u32 = 7;

const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct WeatherbitClient {
    api_key: String,
    base_url: String,
    lang: String,
    hourly_hours: u32,
    daily_days: u32,
    http: Client,
}

impl WeatherbitClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            lang: DEFAULT_LANG.to_string(),
            hourly_hours: DEFAULT_HOURLY_HOURS,
            daily_days: DEFAULT_DAILY_DAYS,
            http,
        })
    }

    /// Client configured from the on-disk settings.
    pub fn from_config(api_key: &str, config: &Config) -> Result<Self> {
        Ok(Self::new(api_key)?
            .with_base_url(config.base_url())
            .with_lang(config.lang())
            .with_windows(config.hourly_hours(), config.daily_days()))
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_lang(mut self, lang: &str) -> Self {
        self.lang = lang.to_string();
        self
    }

    pub fn with_windows(mut self, hourly_hours: u32, daily_days: u32) -> Self {
        self.hourly_hours = hourly_hours;
        self.daily_days = daily_days;
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        what: &str,
        at: Coordinate,
        extra: (&str, String),
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%url, %at, what, "requesting Weatherbit data");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", at.latitude.to_string()),
                ("lon", at.longitude.to_string()),
                ("key", self.api_key.clone()),
                (extra.0, extra.1),
            ])
            .send()
            .await?;

        let status = res.status();

        // Weatherbit answers 204 when it has nothing for the location.
        if status == StatusCode::NO_CONTENT {
            return Err(ClimateError::EmptyResult);
        }

        let body = res.text().await?;

        if !status.is_success() {
            return Err(ClimateError::Provider(format!(
                "Weatherbit {what} request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            ClimateError::Provider(format!("Failed to parse Weatherbit {what} JSON: {e}"))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WbWeather {
    #[serde(default)]
    pub description: String,
    pub icon: String,
    #[serde(default)]
    pub code: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WbCurrent {
    #[serde(default)]
    pub city_name: String,
    pub temp: f64,
    #[serde(default)]
    pub app_temp: f64,
    #[serde(default)]
    pub rh: f64,
    #[serde(default)]
    pub wind_spd: f64,
    #[serde(default)]
    pub precip: Option<f64>,
    pub weather: WbWeather,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WbCurrentResponse {
    #[serde(default)]
    pub data: Vec<WbCurrent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WbHourly {
    pub timestamp_utc: String,
    pub temp: f64,
    pub weather: WbWeather,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WbHourlyResponse {
    #[serde(default)]
    pub city_name: String,
    #[serde(default)]
    pub data: Vec<WbHourly>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WbDaily {
    pub valid_date: String,
    pub max_temp: f64,
    pub min_temp: f64,
    pub weather: WbWeather,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WbDailyResponse {
    #[serde(default)]
    pub city_name: String,
    #[serde(default)]
    pub data: Vec<WbDaily>,
}

#[async_trait]
impl WeatherProvider for WeatherbitClient {
    #[instrument(skip(self), level = "debug")]
    async fn fetch_current(&self, at: Coordinate) -> Result<WbCurrentResponse> {
        self.get_json("current", "current", at, ("lang", self.lang.clone()))
            .await
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch_hourly(&self, at: Coordinate) -> Result<WbHourlyResponse> {
        self.get_json(
            "forecast/hourly",
            "hourly forecast",
            at,
            ("hours", self.hourly_hours.to_string()),
        )
        .await
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch_daily(&self, at: Coordinate) -> Result<WbDailyResponse> {
        self.get_json(
            "forecast/daily",
            "daily forecast",
            at,
            ("days", self.daily_days.to_string()),
        )
        .await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
