//! Searchable list of cities bundled with the application.
//!
//! The dataset is read once and kept for the lifetime of the directory.
//! Matching ignores case and accents, so "sao" finds "São Paulo".

use std::{fs, path::Path};

use tracing::info;
use unicode_normalization::UnicodeNormalization;

use crate::{
    error::{ClimateError, Result},
    model::CityRecord,
};

pub const MAX_RESULTS: usize = 10;
pub const MIN_QUERY_CHARS: usize = 2;

const BUNDLED_DATASET: &str = include_str!("../data/municipios.json");

#[derive(Debug, Clone)]
struct Entry {
    city: CityRecord,
    name_key: String,
    state_key: String,
}

#[derive(Debug, Clone, Default)]
pub struct CityDirectory {
    entries: Vec<Entry>,
}

impl CityDirectory {
    /// Directory backed by the dataset compiled into the crate.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_DATASET)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            ClimateError::Directory(format!("Failed to read {}: {e}", path.display()))
        })?;
        let directory = Self::from_json(&json)?;
        info!(path = %path.display(), cities = directory.len(), "loaded city directory");
        Ok(directory)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let cities: Vec<CityRecord> = serde_json::from_str(json)
            .map_err(|e| ClimateError::Directory(format!("Invalid city dataset: {e}")))?;
        Ok(Self::from_cities(cities))
    }

    pub fn from_cities(cities: Vec<CityRecord>) -> Self {
        let entries = cities
            .into_iter()
            .map(|city| Entry {
                name_key: fold(&city.name),
                state_key: fold(&city.state),
                city,
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CityRecord> {
        self.entries
            .iter()
            .map(|e| &e.city)
            .find(|c| c.id.as_deref() == Some(id))
    }

    /// Cities whose name or state contains `query`, at most [`MAX_RESULTS`],
    /// in dataset order.
    pub fn search(&self, query: &str) -> Vec<&CityRecord> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Vec::new();
        }

        let needle = fold(query);
        if needle.is_empty() {
            return Vec::new();
        }

        self.entries
            .iter()
            .filter(|e| e.name_key.contains(&needle) || e.state_key.contains(&needle))
            .map(|e| &e.city)
            .take(MAX_RESULTS)
            .collect()
    }
}

/// Lower-case ASCII form of `text` with diacritics removed.
pub fn fold(text: &str) -> String {
    text.nfd().filter(char::is_ascii).collect::<String>().to_lowercase()
}
