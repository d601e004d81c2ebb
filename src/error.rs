//! Error types for the load generator and its companion server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to encode envelope: {0}")]
    EncodeError(#[source] serde_json::Error),

    #[error("Failed to build HTTP client: {0}")]
    ClientError(#[source] reqwest::Error),

    #[error("Failed to build request: {0}")]
    RequestError(#[source] reqwest::Error),

    #[error("Transport failure: {0}")]
    TransportError(#[source] reqwest::Error),

    #[error("Failed to read response body: {0}")]
    BodyError(#[source] reqwest::Error),

    #[error("Failed to read request body: {0}")]
    ReadError(String),

    #[error("Failed to decode envelope: {0}")]
    DecodeError(#[source] serde_json::Error),

    #[error("Failed to bind {addr}: {source}")]
    BindError {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LoadError {
    /// Whether this failure ends the worker cycle as a transport failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, LoadError::TransportError(_) | LoadError::BodyError(_))
    }
}

impl IntoResponse for LoadError {
    // The acknowledgement protocol is plain text; a rejected request gets a
    // status code and nothing else.
    fn into_response(self) -> Response {
        let status = match &self {
            LoadError::ReadError(_) | LoadError::DecodeError(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        status.into_response()
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Interval must be greater than zero")]
    ZeroInterval,

    #[error("Invalid target url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid route prefix {0:?}: must be a single non-empty path segment")]
    InvalidPrefix(String),

    #[error("Backoff must satisfy 0 < restart ({restart}ms) <= max ({max}ms)")]
    InvalidBackoff { restart: u64, max: u64 },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}
