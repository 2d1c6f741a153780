use chrono::Local;

use climate_core::{
    CityRecord, SavedCity, WeatherIcon, WeatherSnapshot, WeatherState, icon::IconKind,
};

pub fn print_state(state: &WeatherState) {
    match &state.snapshot {
        Some(snapshot) => print_snapshot(snapshot),
        None => println!("No weather data yet."),
    }
    if let Some(error) = &state.error {
        eprintln!("{error}");
    }
}

fn print_snapshot(snapshot: &WeatherSnapshot) {
    let current = &snapshot.current;

    println!("{} ({})", current.location_name, snapshot.coordinate);
    println!(
        "{} {:.1}°C, feels like {:.1}°C - {}",
        glyph(&current.icon_code),
        current.temperature,
        current.apparent_temperature,
        current.condition,
    );
    println!(
        "Humidity {}% | Wind {:.1} | Precipitation {:.1} mm | {}",
        current.humidity,
        current.wind_speed,
        current.precipitation,
        if current.is_daytime { "day" } else { "night" },
    );

    if !snapshot.hourly.is_empty() {
        println!();
        println!("Next hours:");
        for entry in &snapshot.hourly {
            let icon = glyph(&entry.icon_code);
            println!("  {}  {} {:>5.1}°C", entry.time_label, icon, entry.temperature);
        }
    }

    if !snapshot.daily.is_empty() {
        println!();
        println!("Next days:");
        for entry in &snapshot.daily {
            println!(
                "  {:<4} {} {:>5.1}°C / {:>5.1}°C",
                entry.day_label,
                glyph(&entry.icon_code),
                entry.max_temperature,
                entry.min_temperature,
            );
        }
    }

    println!();
    println!(
        "Updated at {}",
        snapshot.fetched_at.with_timezone(&Local).format("%H:%M")
    );
}

pub fn print_cities(cities: &[&CityRecord]) {
    if cities.is_empty() {
        println!("No matching cities (type at least two letters).");
        return;
    }
    for city in cities {
        println!(
            "{} - {}  ({:.4}, {:.4})",
            city.name, city.state, city.latitude, city.longitude
        );
    }
}

pub fn print_saved(cities: &[SavedCity]) {
    if cities.is_empty() {
        println!("No saved cities.");
        return;
    }
    for city in cities {
        println!("{} - {}  ({:.4}, {:.4})", city.name, city.state, city.latitude, city.longitude);
    }
}

fn glyph(icon_code: &str) -> &'static str {
    let Ok(icon) = WeatherIcon::parse(icon_code) else {
        return "?";
    };
    match (icon.kind(), icon.is_daytime()) {
        (IconKind::Clear, true) => "☀",
        (IconKind::Clear, false) => "☾",
        (IconKind::FewClouds, true) => "⛅",
        (IconKind::FewClouds, false) => "☁",
        (IconKind::BrokenClouds | IconKind::Overcast, _) => "☁",
        (IconKind::Thunderstorm, _) => "⛈",
        (IconKind::Drizzle | IconKind::Rain | IconKind::UnknownPrecipitation, _) => "🌧",
        (IconKind::FreezingRain | IconKind::Sleet, _) => "🌨",
        (IconKind::Snow | IconKind::Flurries, _) => "❄",
        (IconKind::Fog, _) => "🌫",
    }
}
