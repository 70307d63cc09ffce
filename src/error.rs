// src/error.rs

//! Error taxonomy.
//!
//! Two layers:
//! - `ProxyError` is what a caller of a proxy can see. It maps onto an HTTP
//!   response at the boundary.
//! - `ProviderError` is a single provider's failure. It never leaves the
//!   provider chain: the chain logs it and moves on to the next provider.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Unsupported language: {language}")]
    UnsupportedLanguage {
        language: String,
        supported: Vec<&'static str>,
    },

    #[error("All code execution services are currently unavailable")]
    AllProvidersUnavailable,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            ProxyError::InvalidRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response(),

            ProxyError::UnsupportedLanguage {
                language,
                supported,
            } => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "Unsupported language",
                    "language": language,
                    "supported": supported.join(", "),
                })),
            )
                .into_response(),

            ProxyError::AllProvidersUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "error": "All code execution services are currently unavailable",
                    "message": "Please try again later or check your internet connection.",
                })),
            )
                .into_response(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("payload rejected: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Transport(format!("timed out: {}", e))
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}
