//! HTTP helpers for Spotwego functions.

use lambda_http::{Body, Response};
use serde::Serialize;
use tracing::error;

use crate::config::RuntimeMode;
use crate::Error;

/// Standard API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Body>, lambda_http::Error> {
    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(data)?))
        .map_err(Box::new)?)
}

/// Message shown to clients for an error.
///
/// Production hides internals behind a generic message; development passes
/// the full error text through.
pub fn public_message(runtime: RuntimeMode, err: &Error) -> String {
    match runtime {
        RuntimeMode::Development => err.to_string(),
        RuntimeMode::Production => match err.status_code() {
            503 => "Service temporarily unavailable".to_string(),
            _ => "Internal server error".to_string(),
        },
    }
}

/// Log an error and turn it into a JSON error response.
pub fn error_response(runtime: RuntimeMode, err: &Error) -> Result<Response<Body>, lambda_http::Error> {
    error!(error = %err, status = err.status_code(), "Request failed");
    json_response(err.status_code(), &ApiResponse::<()>::error(public_message(runtime, err)))
}
