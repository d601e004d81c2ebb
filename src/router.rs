use axum::{
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{request_id::MakeRequestUuid, timeout::TimeoutLayer, trace::TraceLayer, ServiceBuilderExt};

use crate::handlers::{handle_request, welcome};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let route = state.config.route();

    Router::new()
        .route("/", any(welcome))
        // GET and POST only; anything else gets 405 before the handler runs
        .route(&route, get(handle_request).post(handle_request))
        // Middleware
        .layer(
            ServiceBuilder::new()
                .set_x_request_id(MakeRequestUuid)
                .layer(TraceLayer::new_for_http())
                .propagate_x_request_id()
                .layer(TimeoutLayer::new(state.config.request_timeout)),
        )
        // Shared state
        .with_state(state)
}
