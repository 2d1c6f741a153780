//! In-process provider used by the service and session tests.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::{
    error::{ClimateError, Result},
    model::Coordinate,
    provider::{
        WbCurrentResponse, WbDailyResponse, WbHourlyResponse, WeatherProvider,
        weatherbit::{WbCurrent, WbDaily, WbHourly, WbWeather},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Current,
    Hourly,
    Daily,
}

#[derive(Debug, Default)]
pub struct FakeProvider {
    failing: Mutex<Vec<Endpoint>>,
    empty_current: Mutex<bool>,
    gate: Mutex<Option<(f64, Arc<Notify>)>>,
    pub calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, endpoint: Endpoint) {
        self.failing.lock().push(endpoint);
    }

    pub fn recover(&self) {
        self.failing.lock().clear();
        *self.empty_current.lock() = false;
    }

    pub fn return_no_current_data(&self) {
        *self.empty_current.lock() = true;
    }

    /// Hold current-condition requests for `latitude` until the returned
    /// handle is notified.
    pub fn hold(&self, latitude: f64) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock() = Some((latitude, Arc::clone(&notify)));
        notify
    }

    fn check(&self, endpoint: Endpoint) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().contains(&endpoint) {
            return Err(ClimateError::Provider(format!("{endpoint:?} unavailable")));
        }
        Ok(())
    }
}

pub fn weather(icon: &str) -> WbWeather {
    WbWeather { description: "Céu limpo".into(), icon: icon.into(), code: 800 }
}

/// Current conditions whose temperature equals the latitude, so tests can
/// tell which request produced a snapshot.
pub fn current_for(at: Coordinate) -> WbCurrentResponse {
    WbCurrentResponse {
        data: vec![WbCurrent {
            city_name: format!("City {}", at.latitude),
            temp: at.latitude,
            app_temp: at.latitude,
            rh: 60.0,
            wind_spd: 2.0,
            precip: None,
            weather: weather("c01d"),
        }],
    }
}

pub fn hourly_for(hours: usize) -> WbHourlyResponse {
    WbHourlyResponse {
        city_name: "City".into(),
        data: (0..hours)
            .map(|h| WbHourly {
                timestamp_utc: format!("2024-05-{:02}T{:02}:00:00", 1 + h / 24, h % 24),
                temp: 20.0,
                weather: weather("c01n"),
            })
            .collect(),
    }
}

pub fn daily_for(days: usize) -> WbDailyResponse {
    WbDailyResponse {
        city_name: "City".into(),
        data: (0..days)
            .map(|d| WbDaily {
                valid_date: format!("2024-05-{:02}", 1 + d),
                max_temp: 30.0,
                min_temp: 20.0,
                weather: weather("r01d"),
            })
            .collect(),
    }
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn fetch_current(&self, at: Coordinate) -> Result<WbCurrentResponse> {
        let gate = self
            .gate
            .lock()
            .as_ref()
            .filter(|(lat, _)| *lat == at.latitude)
            .map(|(_, n)| Arc::clone(n));
        if let Some(notify) = gate {
            notify.notified().await;
        }

        self.check(Endpoint::Current)?;
        if *self.empty_current.lock() {
            return Ok(WbCurrentResponse { data: Vec::new() });
        }
        Ok(current_for(at))
    }

    async fn fetch_hourly(&self, _at: Coordinate) -> Result<WbHourlyResponse> {
        self.check(Endpoint::Hourly)?;
        Ok(hourly_for(48))
    }

    async fn fetch_daily(&self, _at: Coordinate) -> Result<WbDailyResponse> {
        self.check(Endpoint::Daily)?;
        Ok(daily_for(16))
    }
}
