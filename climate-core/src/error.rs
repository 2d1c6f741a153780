use thiserror::Error;

/// Errors surfaced by the forecast layer.
///
/// Timestamp and date parse failures are not represented here: the
/// normalizer recovers them per entry with a placeholder label.
#[derive(Debug, Error)]
pub enum ClimateError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("No weather data returned by the provider")]
    EmptyResult,

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("City directory error: {0}")]
    Directory(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClimateError {
    /// Message suitable for showing to the person using the app.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Network error. Check your connection.".to_string(),
            Self::Provider(msg) => format!("Weather service error: {msg}"),
            Self::EmptyResult => "The weather service returned no data.".to_string(),
            Self::Storage(e) => format!("Could not update saved cities: {e}"),
            Self::Directory(msg) => format!("City list unavailable: {msg}"),
            Self::Config(msg) => msg.clone(),
        }
    }
}

pub type Result<T, E = ClimateError> = std::result::Result<T, E>;
