use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A WGS84 point. Range checks are left to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub apparent_temperature: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub precipitation: f64,
    pub condition: String,
    /// Provider weather code, e.g. 800 for clear sky.
    pub condition_code: i32,
    pub icon_code: String,
    pub is_daytime: bool,
    pub location_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyEntry {
    /// "HH:MM", or "--:--" when the provider timestamp could not be read.
    pub time_label: String,
    pub temperature: f64,
    pub icon_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    /// Short weekday name, or "Dia" when the provider date could not be read.
    pub day_label: String,
    pub max_temperature: f64,
    pub min_temperature: f64,
    pub icon_code: String,
}

/// Everything one refresh produced, published as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub coordinate: Coordinate,
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyEntry>,
    pub daily: Vec<DailyEntry>,
    pub fetched_at: DateTime<Utc>,
}

/// Entry of the bundled city dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    #[serde(rename = "city_id", default)]
    pub id: Option<String>,
    #[serde(rename = "city_name")]
    pub name: String,
    #[serde(rename = "state_code", alias = "state")]
    pub state: String,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(rename = "country_full", default)]
    pub country: Option<String>,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
}

impl CityRecord {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// A city pinned by the user. Unique on `(name, state)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCity {
    pub id: i64,
    pub name: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl SavedCity {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}
