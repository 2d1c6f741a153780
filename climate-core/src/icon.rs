//! Weatherbit icon codes.
//!
//! Icon codes look like `r01d`: a three character pictogram id followed by
//! `d` (day) or `n` (night). Codes are checked against the table below when a
//! forecast is normalized, so an unknown code is reported as a provider error
//! instead of turning into a missing image later on.

use serde::{Deserialize, Serialize};

use crate::error::{ClimateError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconKind {
    Thunderstorm,
    Drizzle,
    Rain,
    FreezingRain,
    Snow,
    Sleet,
    Flurries,
    Fog,
    Clear,
    FewClouds,
    BrokenClouds,
    Overcast,
    UnknownPrecipitation,
}

const ICONS: &[(&str, IconKind)] = &[
    ("t01", IconKind::Thunderstorm),
    ("t02", IconKind::Thunderstorm),
    ("t03", IconKind::Thunderstorm),
    ("t04", IconKind::Thunderstorm),
    ("t05", IconKind::Thunderstorm),
    ("d01", IconKind::Drizzle),
    ("d02", IconKind::Drizzle),
    ("d03", IconKind::Drizzle),
    ("r01", IconKind::Rain),
    ("r02", IconKind::Rain),
    ("r03", IconKind::Rain),
    ("r04", IconKind::Rain),
    ("r05", IconKind::Rain),
    ("r06", IconKind::Rain),
    ("f01", IconKind::FreezingRain),
    ("s01", IconKind::Snow),
    ("s02", IconKind::Snow),
    ("s03", IconKind::Snow),
    ("s04", IconKind::Sleet),
    ("s05", IconKind::Sleet),
    ("s06", IconKind::Flurries),
    ("a01", IconKind::Fog),
    ("a02", IconKind::Fog),
    ("a03", IconKind::Fog),
    ("a04", IconKind::Fog),
    ("a05", IconKind::Fog),
    ("a06", IconKind::Fog),
    ("c01", IconKind::Clear),
    ("c02", IconKind::FewClouds),
    ("c03", IconKind::BrokenClouds),
    ("c04", IconKind::Overcast),
    ("u00", IconKind::UnknownPrecipitation),
];

/// A validated icon code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeatherIcon {
    kind: IconKind,
    daytime: bool,
}

impl WeatherIcon {
    pub fn parse(code: &str) -> Result<Self> {
        let unknown = || ClimateError::Provider(format!("Unknown weather icon code '{code}'"));

        if !code.is_ascii() || code.len() != 4 {
            return Err(unknown());
        }
        let (base, suffix) = code.split_at(3);

        let daytime = match suffix {
            "d" => true,
            "n" => false,
            _ => return Err(unknown()),
        };

        let kind = ICONS
            .iter()
            .find(|(b, _)| *b == base)
            .map(|(_, kind)| *kind)
            .ok_or_else(unknown)?;

        Ok(Self { kind, daytime })
    }

    pub fn kind(&self) -> IconKind {
        self.kind
    }

    pub fn is_daytime(&self) -> bool {
        self.daytime
    }
}

/// Day/night flag carried by the icon's last character.
pub fn is_daytime_code(code: &str) -> bool {
    code.ends_with('d')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_day_and_night_variants() {
        let day = WeatherIcon::parse("c01d").expect("known code");
        assert_eq!(day.kind(), IconKind::Clear);
        assert!(day.is_daytime());

        let night = WeatherIcon::parse("r03n").expect("known code");
        assert_eq!(night.kind(), IconKind::Rain);
        assert!(!night.is_daytime());
    }

    #[test]
    fn rejects_unknown_codes() {
        for code in ["", "c01", "c01x", "z99d", "c01dd", "çç1d"] {
            let err = WeatherIcon::parse(code).unwrap_err();
            assert!(err.to_string().contains("Unknown weather icon code"), "{code}");
        }
    }

    #[test]
    fn every_table_entry_parses() {
        for (base, kind) in ICONS {
            let icon = WeatherIcon::parse(&format!("{base}n")).expect("table entry");
            assert_eq!(icon.kind(), *kind);
        }
    }

    #[test]
    fn daytime_follows_suffix() {
        assert!(is_daytime_code("c02d"));
        assert!(!is_daytime_code("c02n"));
    }
}
