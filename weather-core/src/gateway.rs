//! Request/response boundary. Whatever happens inside, callers always get a
//! well-formed [`GatewayResponse`].

use std::collections::HashMap;

use tracing::{info, warn};

use crate::{
    response::{GatewayResponse, format_result},
    service::WeatherService,
};

pub const CITY_PARAM: &str = "city";

/// Inbound trigger. Only the `city` query parameter is recognized.
#[derive(Debug, Clone, Default)]
pub struct GatewayRequest {
    pub query_string_parameters: HashMap<String, String>,
}

impl GatewayRequest {
    pub fn for_city(city: impl Into<String>) -> Self {
        Self {
            query_string_parameters: HashMap::from([(CITY_PARAM.to_string(), city.into())]),
        }
    }

    pub fn city(&self) -> Option<&str> {
        self.query_string_parameters.get(CITY_PARAM).map(String::as_str)
    }
}

pub async fn handle(service: &WeatherService, request: &GatewayRequest) -> GatewayResponse {
    let city = request.city().unwrap_or_default();
    let result = service.get_weather(city).await;

    if let Err(err) = &result {
        warn!(city, status = err.status_code(), error = %err.describe(), "weather request failed");
    }

    let response = format_result(result);
    info!(city, status = response.status_code, "weather request handled");
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::DataSource,
        response::INTERNAL_ERROR_BODY,
        service::tests::{MemoryStore, StubProvider, cached, service},
    };
    use chrono::Duration;

    #[tokio::test]
    async fn scenario_no_cache_primary_succeeds() {
        let primary = StubProvider::ok(10.0, 11.0);
        let secondary = StubProvider::failing("openweathermap error");
        let store = MemoryStore::empty();
        let svc = service(&primary, &secondary, &store);

        let resp = handle(&svc, &GatewayRequest::for_city("Sydney")).await;

        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body, r#"{"wind_speed":11,"temperature_degrees":10}"#);
    }

    #[tokio::test]
    async fn scenario_fresh_cache() {
        let primary = StubProvider::ok(10.0, 11.0);
        let secondary = StubProvider::ok(10.0, 11.0);
        let store = MemoryStore::with_latest(cached(Duration::zero(), 1, 2));
        let svc = service(&primary, &secondary, &store);

        let resp = handle(&svc, &GatewayRequest::for_city("Sydney")).await;

        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body, r#"{"wind_speed":2,"temperature_degrees":1}"#);
        assert_eq!(primary.calls() + secondary.calls(), 0);
    }

    #[tokio::test]
    async fn scenario_stale_cache_secondary_succeeds() {
        let primary = StubProvider::failing("weatherstack error");
        let secondary = StubProvider::ok(10.0, 11.0);
        let store = MemoryStore::with_latest(cached(Duration::hours(1), 1, 2));
        let svc = service(&primary, &secondary, &store);

        let resp = handle(&svc, &GatewayRequest::for_city("Sydney")).await;

        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body, r#"{"wind_speed":11,"temperature_degrees":10}"#);
        assert_eq!(store.inserts()[0].data_source, DataSource::Secondary);
    }

    #[tokio::test]
    async fn scenario_missing_or_empty_city() {
        let primary = StubProvider::ok(10.0, 11.0);
        let secondary = StubProvider::ok(10.0, 11.0);
        let store = MemoryStore::empty();
        let svc = service(&primary, &secondary, &store);

        let mut other_params = GatewayRequest::default();
        other_params.query_string_parameters.insert("town".into(), "Sydney".into());

        for request in [GatewayRequest::default(), GatewayRequest::for_city(""), other_params] {
            let resp = handle(&svc, &request).await;
            assert_eq!(resp.status_code, 400);
            assert_eq!(resp.body, "Missing city in query parameter");
        }

        assert_eq!(store.reads(), 0);
        assert_eq!(primary.calls() + secondary.calls(), 0);
    }

    #[tokio::test]
    async fn scenario_both_providers_fail() {
        let primary = StubProvider::failing("weatherstack error");
        let secondary = StubProvider::failing("openweathermap error");
        let store = MemoryStore::empty();
        let svc = service(&primary, &secondary, &store);

        let resp = handle(&svc, &GatewayRequest::for_city("Sydney")).await;

        assert_eq!(resp.status_code, 500);
        assert_eq!(resp.body, INTERNAL_ERROR_BODY);
        assert!(store.inserts().is_empty());
    }

    #[tokio::test]
    async fn store_write_failure_still_200() {
        let primary = StubProvider::ok(10.0, 11.0);
        let secondary = StubProvider::ok(0.0, 0.0);
        let store = MemoryStore::failing_writes();
        let svc = service(&primary, &secondary, &store);

        let resp = handle(&svc, &GatewayRequest::for_city("Sydney")).await;

        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body, r#"{"wind_speed":11,"temperature_degrees":10}"#);
    }
}
