//! Route definitions and router construction.

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::bootstrap::CorsConfig;
use crate::handlers;
use crate::state::AppState;

/// Build CORS layer from the allow-list.
///
/// Origins that are not valid header values, and the `*` wildcard, are
/// skipped with a warning.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let allowed: Vec<HeaderValue> = config
        .origins()
        .iter()
        .filter_map(|origin| {
            if origin == "*" {
                tracing::warn!("Ignoring wildcard CORS origin");
                return None;
            }
            match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
}

/// API routes, to be nested under `/api`.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/download", post(handlers::downloads::submit))
        .route("/download/{task_id}", get(handlers::downloads::status))
}

/// Create the full application router.
pub fn create_router(state: AppState, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health))
        .nest("/api", api_routes())
        .layer(build_cors_layer(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
