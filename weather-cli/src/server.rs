use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use weather_core::{GatewayRequest, GatewayResponse, WeatherService, handle};

pub fn router(service: Arc<WeatherService>) -> Router {
    Router::new().route("/weather", get(get_weather)).with_state(service)
}

async fn get_weather(
    State(service): State<Arc<WeatherService>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let request = GatewayRequest { query_string_parameters: params };
    into_http(handle(&service, &request).await)
}

fn into_http(response: GatewayResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, response.content_type)], response.body).into_response()
}

pub async fn serve(service: Arc<WeatherService>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use weather_core::{Observation, SqliteWeatherStore, WeatherProvider};

    #[derive(Debug)]
    struct Fixed(Option<Observation>);

    #[async_trait]
    impl WeatherProvider for Fixed {
        async fn get_weather(&self, _city: &str) -> anyhow::Result<Observation> {
            self.0.ok_or_else(|| anyhow::anyhow!("provider down"))
        }
    }

    fn app(primary: Option<Observation>, secondary: Option<Observation>) -> Router {
        let store = SqliteWeatherStore::open_in_memory().unwrap();
        let service =
            WeatherService::new(Arc::new(Fixed(primary)), Arc::new(Fixed(secondary)), Arc::new(store));
        router(Arc::new(service))
    }

    async fn call(app: Router, uri: &str) -> (StatusCode, String, String) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn obs(temperature_c: f64, wind_speed_kmh: f64) -> Option<Observation> {
        Some(Observation { temperature_c, wind_speed_kmh })
    }

    #[tokio::test]
    async fn returns_json_on_success() {
        let (status, content_type, body) =
            call(app(obs(10.0, 11.0), None), "/weather?city=Sydney").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/json");
        assert_eq!(body, r#"{"wind_speed":11,"temperature_degrees":10}"#);
    }

    #[tokio::test]
    async fn decodes_url_encoded_city() {
        let (status, _, _) = call(app(obs(1.0, 2.0), None), "/weather?city=New%20York").await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_city_is_bad_request() {
        let (status, _, body) = call(app(obs(10.0, 11.0), None), "/weather").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Missing city in query parameter");
    }

    #[tokio::test]
    async fn both_providers_down_is_internal_error() {
        let (status, _, body) = call(app(None, None), "/weather?city=Sydney").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Something has gone wrong");
    }
}
