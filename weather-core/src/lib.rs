//! Core library for the `weather-service` gateway.
//!
//! This crate defines:
//! - The resolution service: cache freshness check, primary/secondary
//!   provider failover, best-effort write-through
//! - Weather providers (Weatherstack, OpenWeatherMap)
//! - The SQLite weather store
//! - Gateway request handling and response formatting
//! - Configuration & credentials handling
//!
//! It is used by the `weather-service` binary, but the handler is transport
//! neutral and can be mounted behind any HTTP-style trigger.

pub mod config;
pub mod error;
pub mod gateway;
pub mod model;
pub mod provider;
pub mod response;
pub mod service;
pub mod store;

pub use config::{Config, DatabaseConfig, ProviderConfig};
pub use error::WeatherError;
pub use gateway::{GatewayRequest, handle};
pub use model::{DataSource, Observation, WeatherRecord, WeatherReport};
pub use provider::{ProviderId, WeatherProvider};
pub use response::GatewayResponse;
pub use service::{Clock, SystemClock, WeatherService};
pub use store::{SqliteWeatherStore, WeatherStore};
