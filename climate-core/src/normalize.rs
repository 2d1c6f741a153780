//! Conversion of Weatherbit records into the unified forecast model.
//!
//! Current conditions are all-or-nothing. Hourly and daily entries recover
//! individually from unreadable timestamps by using a placeholder label, so
//! one bad row never drops the rest of the batch.

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    error::{ClimateError, Result},
    icon::{WeatherIcon, is_daytime_code},
    model::{Coordinate, CurrentConditions, DailyEntry, HourlyEntry, WeatherSnapshot},
    provider::{WbCurrentResponse, WbDailyResponse, WbHourlyResponse},
};

pub const DEFAULT_HOURLY_WINDOW: usize = 24;
pub const MAX_DAILY_ENTRIES: usize = 7;

pub const TIME_PLACEHOLDER: &str = "--:--";
pub const DAY_PLACEHOLDER: &str = "Dia";

/// Weekday abbreviations indexed from Sunday.
pub const DAY_NAMES: [&str; 7] = ["Dom", "Seg", "Ter", "Qua", "Qui", "Sex", "Sáb"];

const PROVIDER_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const PROVIDER_DATE_FORMAT: &str = "%Y-%m-%d";

/// Clock used for hourly labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelZone {
    Utc,
    /// Approximate local time at the forecast location.
    #[default]
    Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub hourly_window: usize,
    pub label_zone: LabelZone,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self { hourly_window: DEFAULT_HOURLY_WINDOW, label_zone: LabelZone::default() }
    }
}

/// Build a snapshot from the three provider responses.
pub fn snapshot(
    at: Coordinate,
    current: &WbCurrentResponse,
    hourly: &WbHourlyResponse,
    daily: &WbDailyResponse,
    options: NormalizeOptions,
) -> Result<WeatherSnapshot> {
    Ok(WeatherSnapshot {
        coordinate: at,
        current: current_conditions(current)?,
        hourly: hourly_entries(hourly, at, options)?,
        daily: daily_entries(daily)?,
        fetched_at: Utc::now(),
    })
}

pub fn current_conditions(response: &WbCurrentResponse) -> Result<CurrentConditions> {
    let record = response.data.first().ok_or(ClimateError::EmptyResult)?;
    WeatherIcon::parse(&record.weather.icon)?;

    Ok(CurrentConditions {
        temperature: record.temp,
        apparent_temperature: record.app_temp,
        humidity: record.rh.round().clamp(0.0, 100.0) as u8,
        wind_speed: record.wind_spd,
        precipitation: record.precip.unwrap_or(0.0),
        condition: record.weather.description.clone(),
        condition_code: record.weather.code,
        icon_code: record.weather.icon.clone(),
        is_daytime: is_daytime_code(&record.weather.icon),
        location_name: record.city_name.clone(),
    })
}

pub fn hourly_entries(
    response: &WbHourlyResponse,
    at: Coordinate,
    options: NormalizeOptions,
) -> Result<Vec<HourlyEntry>> {
    let offset = match options.label_zone {
        LabelZone::Utc => Utc.fix(),
        LabelZone::Location => approximate_utc_offset(at),
    };

    response
        .data
        .iter()
        .take(options.hourly_window)
        .map(|record| -> Result<HourlyEntry> {
            WeatherIcon::parse(&record.weather.icon)?;
            Ok(HourlyEntry {
                time_label: time_label(&record.timestamp_utc, offset),
                temperature: record.temp,
                icon_code: record.weather.icon.clone(),
            })
        })
        .collect()
}

pub fn daily_entries(response: &WbDailyResponse) -> Result<Vec<DailyEntry>> {
    response
        .data
        .iter()
        .take(MAX_DAILY_ENTRIES)
        .map(|record| -> Result<DailyEntry> {
            WeatherIcon::parse(&record.weather.icon)?;
            Ok(DailyEntry {
                day_label: day_label(&record.valid_date),
                max_temperature: record.max_temp,
                min_temperature: record.min_temp,
                icon_code: record.weather.icon.clone(),
            })
        })
        .collect()
}

/// Render a provider UTC timestamp as "HH:MM" in `offset`.
pub fn time_label(timestamp_utc: &str, offset: FixedOffset) -> String {
    match parse_utc_timestamp(timestamp_utc) {
        Some(utc) => offset.from_utc_datetime(&utc).format("%H:%M").to_string(),
        None => {
            warn!(timestamp = timestamp_utc, "unreadable hourly timestamp");
            TIME_PLACEHOLDER.to_string()
        }
    }
}

fn parse_utc_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, PROVIDER_TIMESTAMP_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_utc()))
}

/// Weekday abbreviation for a provider date ("YYYY-MM-DD").
pub fn day_label(valid_date: &str) -> String {
    match NaiveDate::parse_from_str(valid_date.trim(), PROVIDER_DATE_FORMAT) {
        Ok(date) => DAY_NAMES[date.weekday().num_days_from_sunday() as usize].to_string(),
        Err(e) => {
            warn!(date = valid_date, error = %e, "unreadable daily date");
            DAY_PLACEHOLDER.to_string()
        }
    }
}

/// Rough UTC offset for a location.
///
/// Inside Brazil the west (longitude <= -56) is UTC-4 and the rest UTC-3.
/// Elsewhere the offset is longitude / 15 hours, truncated toward zero.
/// No tz database and no daylight saving.
pub fn approximate_utc_offset(at: Coordinate) -> FixedOffset {
    let hours = if in_brazil(at) {
        if at.longitude <= -56.0 { -4 } else { -3 }
    } else {
        (at.longitude / 15.0).trunc() as i32
    };

    FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix())
}

fn in_brazil(at: Coordinate) -> bool {
    (-33.0..=5.0).contains(&at.latitude) && (-74.0..=-34.0).contains(&at.longitude)
}
