// src/routes.rs

use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{api, dashboard},
    state::AppState,
};

/// Assembles the dashboard router.
///
/// * `/` serves the HTML dashboard.
/// * `/api/*` exposes the same read paths as JSON.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let api_routes = Router::new()
        .route("/posts", get(api::list_posts))
        .route("/stats", get(api::stats))
        .route("/explain", post(api::explain));

    Router::new()
        .route("/", get(dashboard::index))
        .route("/health", get(api::health))
        .nest("/api", api_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
