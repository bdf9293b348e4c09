use crate::{
    Config, Observation,
    provider::{openweather::OpenWeatherProvider, weatherstack::WeatherStackProvider},
};
use async_trait::async_trait;
use reqwest::Client;
use std::{convert::TryFrom, fmt::Debug, sync::Arc, time::Duration};

pub mod openweather;
pub mod weatherstack;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    WeatherStack,
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::WeatherStack => "weatherstack",
            ProviderId::OpenWeather => "openweather",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "weatherstack" => Ok(ProviderId::WeatherStack),
            "openweather" | "openweathermap" => Ok(ProviderId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: weatherstack, openweather."
            )),
        }
    }
}

/// A source of current conditions for a city.
///
/// Implementations return readings in degrees Celsius and km/h so results
/// from different providers are interchangeable. Every failure (transport,
/// status, payload) is reported as one opaque error.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn get_weather(&self, city: &str) -> anyhow::Result<Observation>;
}

pub(crate) fn http_client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let provider = config.provider_config(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `weather-service configure {id}` and enter your API key."
        )
    })?;

    let api_key = provider.api_key.clone();
    let timeout = config.http_timeout();

    let arc: Arc<dyn WeatherProvider> = match id {
        ProviderId::WeatherStack => Arc::new(WeatherStackProvider::with_base_url(
            api_key,
            provider.base_url.as_deref().unwrap_or(weatherstack::DEFAULT_BASE_URL),
            timeout,
        )?),
        ProviderId::OpenWeather => Arc::new(OpenWeatherProvider::with_base_url(
            api_key,
            provider.base_url.as_deref().unwrap_or(openweather::DEFAULT_BASE_URL),
            timeout,
        )?),
    };

    Ok(arc)
}
