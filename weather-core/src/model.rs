use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Which provider produced a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Primary,
    Secondary,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Primary => "primary",
            DataSource::Secondary => "secondary",
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for DataSource {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "primary" => Ok(DataSource::Primary),
            "secondary" => Ok(DataSource::Secondary),
            _ => Err(anyhow::anyhow!("Unknown data source '{value}'")),
        }
    }
}

/// Current conditions as reported by a provider, already normalized to
/// degrees Celsius and kilometres per hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub temperature_c: f64,
    pub wind_speed_kmh: f64,
}

/// One stored observation for one city. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub data_source: DataSource,
    pub city: String,
    pub temperature: i64,
    pub wind_speed: i64,
    pub updated_at: DateTime<Utc>,
}

impl WeatherRecord {
    /// Build a record from a provider observation, rounding both readings
    /// half away from zero. Non-finite readings are rejected. `updated_at`
    /// is truncated to microseconds, the precision the store keeps.
    pub fn from_observation(
        data_source: DataSource,
        city: &str,
        observation: Observation,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            data_source,
            city: city.to_owned(),
            temperature: round_reading(observation.temperature_c)?,
            wind_speed: round_reading(observation.wind_speed_kmh)?,
            updated_at: updated_at.trunc_subsecs(6),
        })
    }

    pub fn report(&self) -> WeatherReport {
        WeatherReport { temperature: self.temperature, wind_speed: self.wind_speed }
    }
}

/// What the caller gets back. Field names on the wire are fixed by the
/// gateway contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReport {
    #[serde(rename = "wind_speed")]
    pub wind_speed: i64,
    #[serde(rename = "temperature_degrees")]
    pub temperature: i64,
}

/// Round to the nearest whole number, halves away from zero.
pub fn round_reading(value: f64) -> anyhow::Result<i64> {
    if !value.is_finite() {
        return Err(anyhow::anyhow!("Provider returned a non-finite reading: {value}"));
    }
    Ok(value.round() as i64)
}
