use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::{
    Config,
    error::WeatherError,
    model::{DataSource, WeatherRecord, WeatherReport},
    provider::{ProviderId, WeatherProvider, provider_from_config},
    store::{SqliteWeatherStore, WeatherStore},
};

/// Source of "now" for freshness decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A record is fresh while its age does not exceed `window`. The boundary
/// itself counts as fresh.
pub fn is_fresh(record: &WeatherRecord, now: DateTime<Utc>, window: Duration) -> bool {
    now.signed_duration_since(record.updated_at) <= window
}

/// Resolves current weather for a city: serve a fresh cached record, or
/// fetch from the primary provider, falling back to the secondary, and
/// write the result through to the store.
pub struct WeatherService {
    primary: Arc<dyn WeatherProvider>,
    secondary: Arc<dyn WeatherProvider>,
    store: Arc<dyn WeatherStore>,
    freshness_window: Duration,
    clock: Arc<dyn Clock>,
}

impl WeatherService {
    pub fn new(
        primary: Arc<dyn WeatherProvider>,
        secondary: Arc<dyn WeatherProvider>,
        store: Arc<dyn WeatherStore>,
    ) -> Self {
        Self {
            primary,
            secondary,
            store,
            freshness_window: Config::default().freshness_window(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Wire both providers and the SQLite store from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let primary = provider_from_config(ProviderId::WeatherStack, config)?;
        let secondary = provider_from_config(ProviderId::OpenWeather, config)?;

        let db_path = config.database_path()?;
        let store = SqliteWeatherStore::open(&db_path)
            .with_context(|| format!("Failed to open weather store at {}", db_path.display()))?;

        Ok(Self::new(primary, secondary, Arc::new(store))
            .with_freshness_window(config.freshness_window()))
    }

    pub async fn get_weather(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        if city.trim().is_empty() {
            return Err(WeatherError::InvalidInput("Missing city in query parameter".to_string()));
        }

        let now = self.clock.now();

        if let Some(record) = self.cached(city).await {
            if is_fresh(&record, now, self.freshness_window) {
                debug!(city, source = %record.data_source, "serving cached weather");
                return Ok(record.report());
            }
            debug!(city, updated_at = %record.updated_at, "cached weather is stale");
        }

        let record = self.fetch(city).await?;
        self.persist(&record).await;

        Ok(record.report())
    }

    /// Latest stored record, with read failures treated as a miss.
    async fn cached(&self, city: &str) -> Option<WeatherRecord> {
        match self.store.get_latest(city).await {
            Ok(record) => record,
            Err(e) => {
                let err = WeatherError::StoreRead(e);
                warn!(city, error = %err.describe(), "treating as cache miss");
                None
            }
        }
    }

    async fn fetch(&self, city: &str) -> Result<WeatherRecord, WeatherError> {
        let primary_err = match self.fetch_from(&self.primary, DataSource::Primary, city).await {
            Ok(record) => return Ok(record),
            Err(e) => e,
        };
        warn!(city, error = %format!("{primary_err:#}"), "primary provider failed, trying secondary");

        match self.fetch_from(&self.secondary, DataSource::Secondary, city).await {
            Ok(record) => Ok(record),
            Err(secondary_err) => {
                warn!(city, error = %format!("{secondary_err:#}"), "secondary provider failed");
                Err(WeatherError::UpstreamUnavailable(
                    secondary_err.context(format!("primary provider: {primary_err:#}")),
                ))
            }
        }
    }

    async fn fetch_from(
        &self,
        provider: &Arc<dyn WeatherProvider>,
        source: DataSource,
        city: &str,
    ) -> anyhow::Result<WeatherRecord> {
        let observation = provider.get_weather(city).await?;
        // Stamped when produced, not when the request started.
        let record =
            WeatherRecord::from_observation(source, city, observation, self.clock.now())?;
        info!(
            city,
            source = %source,
            temperature = record.temperature,
            wind_speed = record.wind_speed,
            "fetched weather"
        );
        Ok(record)
    }

    /// Best-effort write-through; a failure only gets logged.
    async fn persist(&self, record: &WeatherRecord) {
        if let Err(e) = self.store.insert(record).await {
            let err = WeatherError::StoreWrite(e);
            warn!(city = %record.city, error = %err.describe(), "weather not cached");
        }
    }
}
