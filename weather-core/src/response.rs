use serde::Serialize;

use crate::{error::WeatherError, model::WeatherReport};

pub const INTERNAL_ERROR_BODY: &str = "Something has gone wrong";

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// Transport-neutral response produced by the gateway handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayResponse {
    pub status_code: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl GatewayResponse {
    pub fn success(body: String) -> Self {
        Self { status_code: 200, content_type: CONTENT_TYPE_JSON, body }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status_code: 400, content_type: CONTENT_TYPE_TEXT, body: message.into() }
    }

    pub fn internal_server_error() -> Self {
        Self {
            status_code: 500,
            content_type: CONTENT_TYPE_TEXT,
            body: INTERNAL_ERROR_BODY.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Map a lookup outcome to its response.
pub fn format_result(result: Result<WeatherReport, WeatherError>) -> GatewayResponse {
    match result.and_then(|report| serde_json::to_string(&report).map_err(WeatherError::from)) {
        Ok(body) => GatewayResponse::success(body),
        Err(err) => from_error(&err),
    }
}

pub fn from_error(err: &WeatherError) -> GatewayResponse {
    match err {
        WeatherError::InvalidInput(message) => GatewayResponse::bad_request(message.clone()),
        _ => GatewayResponse::internal_server_error(),
    }
}
