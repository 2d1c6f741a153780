use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use std::fs;
use tracing::debug;

use climate_core::{
    CityDirectory, CityRecord, ClimateSession, Config, LabelZone, SaveOutcome, SavedCityStore,
    provider_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "climate", version, about = "Current, hourly and daily weather")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the Weatherbit API key and display preferences.
    Configure,

    /// Show weather for a coordinate.
    Now {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },

    /// Show weather for the first city matching a name.
    City {
        /// City or state name; accents are optional.
        query: String,

        /// Also add the city to the saved list.
        #[arg(long)]
        save: bool,
    },

    /// List cities matching a name.
    Search { query: String },

    /// Manage saved cities.
    Saved {
        #[command(subcommand)]
        command: SavedCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum SavedCommand {
    /// List saved cities.
    List,

    /// Save the first city matching a name.
    Add { query: String },

    /// Remove a saved city.
    Remove { name: String, state: String },

    /// Show weather for a saved city.
    Show { name: String, state: String },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        debug!(command = ?self.command, "running command");
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config),
            Command::Now { lat, lon } => {
                let session = open_session(&config)?;
                let refreshed = session.refresh(lat, lon).await;
                show_weather(&session, refreshed)
            }
            Command::City { query, save } => {
                let session = open_session(&config)?;
                let city = first_match(session.directory(), &query)?;
                let refreshed = session.refresh_city(&city).await;
                show_weather(&session, refreshed)?;
                if save {
                    report_save(&session.save_city(&city)?);
                }
                Ok(())
            }
            Command::Search { query } => {
                let directory = open_directory(&config)?;
                render::print_cities(&directory.search(&query));
                Ok(())
            }
            Command::Saved { command } => run_saved(&config, command).await,
        }
    }
}

async fn run_saved(config: &Config, command: SavedCommand) -> Result<()> {
    match command {
        SavedCommand::List => {
            let store = open_store(config)?;
            render::print_saved(&store.list()?);
        }
        SavedCommand::Add { query } => {
            let directory = open_directory(config)?;
            let city = first_match(&directory, &query)?;
            let store = open_store(config)?;
            report_save(&store.save(&city.name, &city.state, city.latitude, city.longitude)?);
        }
        SavedCommand::Remove { name, state } => {
            let store = open_store(config)?;
            if store.delete_by_key(&name, &state)? {
                println!("Removed {name} - {state}");
            } else {
                println!("{name} - {state} was not saved");
            }
        }
        SavedCommand::Show { name, state } => {
            let session = open_session(config)?;
            let city = session
                .find_saved(&name, &state)?
                .ok_or_else(|| anyhow!("{name} - {state} is not in the saved list"))?;
            let refreshed = session.refresh_saved(&city).await;
            show_weather(&session, refreshed)?;
        }
    }
    Ok(())
}

fn configure(mut config: Config) -> Result<()> {
    let api_key = inquire::Password::new("Weatherbit API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key cannot be empty");
    }
    config.set_api_key(api_key.trim().to_string());

    let lang = inquire::Text::new("Language for descriptions:")
        .with_default(config.lang())
        .prompt()
        .context("Failed to read language")?;
    config.lang = Some(lang.trim().to_string());

    let zones = vec!["location", "utc"];
    let zone = inquire::Select::new("Hourly times shown in:", zones)
        .prompt()
        .context("Failed to read hourly label preference")?;
    config.hourly_labels = Some(if zone == "utc" { LabelZone::Utc } else { LabelZone::Location });

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn open_directory(config: &Config) -> Result<CityDirectory> {
    let directory = match &config.cities_path {
        Some(path) => CityDirectory::load(path)?,
        None => CityDirectory::bundled()?,
    };
    Ok(directory)
}

fn open_store(config: &Config) -> Result<SavedCityStore> {
    let path = config.database_file_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
    }
    SavedCityStore::open(&path)
        .with_context(|| format!("Failed to open saved cities at {}", path.display()))
}

fn open_session(config: &Config) -> Result<ClimateSession> {
    let provider = provider_from_config(config)?;
    Ok(ClimateSession::new(
        provider,
        config.normalize_options(),
        open_directory(config)?,
        open_store(config)?,
    ))
}

fn first_match(directory: &CityDirectory, query: &str) -> Result<CityRecord> {
    directory
        .search(query)
        .first()
        .map(|city| (*city).clone())
        .ok_or_else(|| anyhow!("No city matches '{query}'"))
}

fn show_weather(
    session: &ClimateSession,
    refreshed: climate_core::error::Result<climate_core::RefreshOutcome>,
) -> Result<()> {
    let state = session.state();
    if let Err(e) = refreshed {
        bail!(state.error.unwrap_or_else(|| e.user_message()));
    }
    render::print_state(&state);
    Ok(())
}

fn report_save(outcome: &SaveOutcome) {
    let city = outcome.city();
    match outcome {
        SaveOutcome::Inserted(_) => println!("Saved {} - {}", city.name, city.state),
        SaveOutcome::AlreadySaved(_) => println!("{} - {} is already saved", city.name, city.state),
    }
}
