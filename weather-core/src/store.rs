//! Append-only weather history.
//!
//! Every successful provider lookup adds a row; nothing is updated or
//! deleted. The "latest" record for a city is whichever row has the greatest
//! `updated_at`, with the row id breaking ties.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::{path::Path, sync::Arc};

use crate::model::{DataSource, WeatherRecord};

/// Persistence used by the weather service as its cache.
#[async_trait]
pub trait WeatherStore: Send + Sync {
    /// Most recent record for `city`, or `None` if the city was never stored.
    async fn get_latest(&self, city: &str) -> Result<Option<WeatherRecord>>;

    /// Append a record. Several records per city are expected.
    async fn insert(&self, record: &WeatherRecord) -> Result<()>;
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS weather (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    data_source TEXT NOT NULL,
    city TEXT NOT NULL,
    temperature INTEGER NOT NULL,
    wind_speed INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_weather_city_updated ON weather(city, updated_at DESC);
"#;

/// Raw column values, converted to a [`WeatherRecord`] outside the row callback.
type RawRow = (String, String, i64, i64, i64);

/// SQLite-backed [`WeatherStore`]. `updated_at` is kept as UTC microseconds.
///
/// Trait methods run their statement on the blocking pool so the connection
/// lock and disk I/O never stall a runtime worker.
pub struct SqliteWeatherStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteWeatherStore {
    /// Open an existing database. The schema is not created here; run
    /// [`SqliteWeatherStore::init_schema`] once (the `setup-db` command).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open weather database: {}", path.display()))?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Create an in-memory store with the schema already in place.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let store = Self { conn: Arc::new(Mutex::new(conn)) };
        store.init_schema()?;
        Ok(store)
    }

    /// Create the weather table if it is missing. Safe to run repeatedly.
    pub fn init_schema(&self) -> Result<()> {
        self.conn
            .lock()
            .execute_batch(SCHEMA)
            .context("Failed to create weather table")?;
        Ok(())
    }

    /// All stored records for `city`, newest first.
    pub fn history(&self, city: &str, limit: usize) -> Result<Vec<WeatherRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT data_source, city, temperature, wind_speed, updated_at
             FROM weather
             WHERE city = ?1
             ORDER BY updated_at DESC, id DESC
             LIMIT ?2",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![city, limit], Self::raw_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read weather history")?;

        rows.into_iter().map(Self::to_record).collect()
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || f(&conn.lock()))
            .await
            .context("Weather store task panicked")?
    }

    fn raw_row(row: &rusqlite::Row) -> rusqlite::Result<RawRow> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
    }

    fn to_record(row: RawRow) -> Result<WeatherRecord> {
        let (data_source, city, temperature, wind_speed, updated_at) = row;
        let updated_at = DateTime::<Utc>::from_timestamp_micros(updated_at)
            .with_context(|| format!("Stored timestamp out of range: {updated_at}"))?;

        Ok(WeatherRecord {
            data_source: DataSource::try_from(data_source.as_str())?,
            city,
            temperature,
            wind_speed,
            updated_at,
        })
    }
}

#[async_trait]
impl WeatherStore for SqliteWeatherStore {
    async fn get_latest(&self, city: &str) -> Result<Option<WeatherRecord>> {
        let city = city.to_string();
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    "SELECT data_source, city, temperature, wind_speed, updated_at
                     FROM weather
                     WHERE city = ?1
                     ORDER BY updated_at DESC, id DESC
                     LIMIT 1",
                    params![city],
                    Self::raw_row,
                )
                .optional()
                .with_context(|| format!("Failed to query latest weather for {city}"))?;

            row.map(Self::to_record).transpose()
        })
        .await
    }

    async fn insert(&self, record: &WeatherRecord) -> Result<()> {
        let record = record.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO weather (data_source, city, temperature, wind_speed, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.data_source.as_str(),
                    record.city,
                    record.temperature,
                    record.wind_speed,
                    record.updated_at.timestamp_micros(),
                ],
            )
            .with_context(|| format!("Failed to insert weather for {}", record.city))?;
            Ok(())
        })
        .await
    }
}
