//! HTTP handlers for the acknowledgement server

use crate::error::LoadError;
use crate::payload::{decode_envelope, now_formatted};
use crate::state::AppState;
use crate::system::describe_system;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{Extensions, Method, StatusCode},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

pub const WELCOME: &str = "welcome to the load generator sample server\n";

/// Remote address of the caller, when the server was started with connect
/// info.
fn client_info(extensions: &Extensions) -> String {
    match extensions.get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => format!("client info:{}:{}", addr.ip(), addr.port()),
        None => "client info:unknown".to_string(),
    }
}

/// Static landing page; the body is ignored.
pub async fn welcome(request: Request) -> &'static str {
    info!(client = %client_info(request.extensions()), "Welcome page accessed");
    WELCOME
}

/// Acknowledge one envelope.
///
/// Decoding happens before counting: a body that is not a valid envelope
/// gets `400` with no body and leaves the success counter untouched.
#[instrument(skip_all, fields(method = %request.method()))]
pub async fn handle_request(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, LoadError> {
    let method = request.method().clone();
    if method != Method::GET && method != Method::POST {
        return Ok(StatusCode::METHOD_NOT_ALLOWED.into_response());
    }
    let client = client_info(request.extensions());

    let body = axum::body::to_bytes(request.into_body(), state.config.max_body_bytes)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to read request body");
            LoadError::ReadError(e.to_string())
        })?;

    let envelope = decode_envelope(&body).inspect_err(|e| {
        warn!(error = %e, %client, "Unmarshal failed");
    })?;

    let now = now_formatted();
    let success_count = state.record_success();

    let message = if method == Method::POST {
        format!("[finish worker {} task,time:{}]", envelope.id, now)
    } else {
        let info = tokio::task::spawn_blocking(describe_system)
            .await
            .map_err(|e| LoadError::Internal(e.to_string()))?;
        let info = serde_json::to_string(&info).map_err(LoadError::EncodeError)?;
        format!("[finish worker {} get:\n{}\ntime:{}]", envelope.id, info, now)
    };

    info!(
        success_count,
        id = envelope.id,
        time = %envelope.time,
        uid = %envelope.uid,
        %client,
        "Received request"
    );

    Ok((StatusCode::OK, message).into_response())
}
