use std::{fs, net::SocketAddr, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use weather_core::{
    Config, GatewayRequest, ProviderId, SqliteWeatherStore, WeatherService, handle,
};

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-service", version, about = "Weather lookup with provider failover")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "weatherstack" or "openweather".
        provider: String,
    },

    /// Create the weather table in the configured database.
    SetupDb,

    /// Resolve the weather for a city once and print the response.
    Get {
        /// City name, passed to the providers as-is.
        city: String,
    },

    /// Serve `GET /weather?city=...` over HTTP.
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::SetupDb => setup_db(),
            Command::Get { city } => {
                let config = Config::load_with_env()?;
                let service = WeatherService::from_config(&config)?;

                let response = handle(&service, &GatewayRequest::for_city(city)).await;
                println!("{}", response.body);

                if !response.is_success() {
                    anyhow::bail!("request failed with status {}", response.status_code);
                }
                Ok(())
            }
            Command::Serve { addr } => {
                let config = Config::load_with_env()?;
                let service = WeatherService::from_config(&config)?;
                server::serve(Arc::new(service), addr).await
            }
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    if let Some(notice) = existing_key_notice(&config, id) {
        println!("{notice}");
    }

    let api_key = Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        anyhow::bail!("API key for '{id}' must not be empty");
    }
    config.upsert_provider_api_key(id, api_key.trim().to_string());

    let base_url = Text::new("Base URL (leave empty for the public endpoint):")
        .prompt()
        .context("Failed to read base URL")?;
    if !base_url.trim().is_empty() {
        config.set_provider_base_url(id, base_url.trim().to_string());
    }

    config.save()?;
    println!("Saved credentials for {id} to {}", Config::config_file_path()?.display());
    Ok(())
}

fn existing_key_notice(config: &Config, id: ProviderId) -> Option<String> {
    config
        .is_provider_configured(id)
        .then(|| format!("An API key for {id} is already configured; entering a new one replaces it."))
}

fn setup_db() -> anyhow::Result<()> {
    let config = Config::load_with_env()?;
    let path = config.database_path()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }

    let store = SqliteWeatherStore::open(&path)?;
    store.init_schema()?;

    println!("Weather table ready in {}", path.display());
    Ok(())
}
