use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    model::Observation,
    provider::{http_client, truncate_body},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "http://api.weatherstack.com";

/// Primary provider. Reports metric units by default: °C and km/h.
#[derive(Debug, Clone)]
pub struct WeatherStackProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherStackProvider {
    pub fn with_base_url(api_key: String, base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: http_client(timeout)?,
        })
    }

    async fn fetch_current(&self, city: &str) -> Result<Observation> {
        let url = format!("{}/current", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("access_key", self.api_key.as_str()), ("query", city)])
            .send()
            .await
            .context("Failed to send request to Weatherstack (current)")?;

        let status = res.status();
        let body = res.text().await.context("Failed to read Weatherstack current response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Weatherstack current request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: WsResponse =
            serde_json::from_str(&body).context("Failed to parse Weatherstack current JSON")?;

        // Weatherstack signals API errors with a 200 and `success: false`.
        if let Some(error) = parsed.error {
            return Err(anyhow!(
                "Weatherstack returned error {} ({}): {}",
                error.code,
                error.kind,
                error.info
            ));
        }

        let current = parsed
            .current
            .ok_or_else(|| anyhow!("Weatherstack response contained no current conditions"))?;

        Ok(Observation { temperature_c: current.temperature, wind_speed_kmh: current.wind_speed })
    }
}

#[derive(Debug, Deserialize)]
struct WsCurrent {
    temperature: f64,
    wind_speed: f64,
}

#[derive(Debug, Deserialize)]
struct WsError {
    code: i64,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct WsResponse {
    current: Option<WsCurrent>,
    error: Option<WsError>,
}

#[async_trait]
impl WeatherProvider for WeatherStackProvider {
    async fn get_weather(&self, city: &str) -> Result<Observation> {
        self.fetch_current(city).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SYDNEY: &str = r#"{"request":{"type":"City","query":"Sydney, Australia","language":"en","unit":"m"},"location":{"name":"Sydney","country":"Australia","region":"New South Wales","lat":"-33.883","lon":"151.217","timezone_id":"Australia/Sydney","localtime":"2021-05-16 11:37","localtime_epoch":1621165020,"utc_offset":"10.0"},"current":{"observation_time":"01:37 AM","temperature":15,"weather_code":113,"weather_descriptions":["Sunny"],"wind_speed":24,"wind_degree":250,"wind_dir":"WSW","pressure":1021,"precip":0,"humidity":39,"cloudcover":0,"feelslike":14,"uv_index":4,"visibility":10,"is_day":"yes"}}"#;

    fn provider(server: &MockServer) -> WeatherStackProvider {
        WeatherStackProvider::with_base_url(
            "dummykey".to_string(),
            &server.uri(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn parses_current_conditions() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .and(query_param("access_key", "dummykey"))
            .and(query_param("query", "Sydney"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SYDNEY))
            .expect(1)
            .mount(&server)
            .await;

        let obs = provider(&server).get_weather("Sydney").await.unwrap();

        assert_eq!(obs.temperature_c, 15.0);
        assert_eq!(obs.wind_speed_kmh, 24.0);
    }

    #[tokio::test]
    async fn api_error_in_success_body_is_a_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "error": {"code": 101, "type": "invalid_access_key", "info": "You have not supplied a valid API Access Key."}
            })))
            .mount(&server)
            .await;

        let err = provider(&server).get_weather("Sydney").await.unwrap_err();
        assert!(err.to_string().contains("invalid_access_key"), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn non_success_status_is_a_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = provider(&server).get_weather("Sydney").await.unwrap_err();
        assert!(err.to_string().contains("503"), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn malformed_payload_is_a_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/current"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        assert!(provider(&server).get_weather("Sydney").await.is_err());
    }
}
