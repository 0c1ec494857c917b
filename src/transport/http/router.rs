use crate::transport::http::handlers::{health, ingest};
use axum::routing::{any, get};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(paths(
    health::ping_handler,
    health::healthcheck_handler,
    ingest::ingest_handler
))]
pub struct ApiDoc;

pub fn create_router(app_state: crate::transport::http::types::AppState) -> Router {
    Router::new()
        .route("/ping", any(health::ping_handler))
        .route("/health", get(health::healthcheck_handler))
        .route("/log", any(ingest::ingest_root_redirect_handler))
        .route("/log/", any(ingest::ingest_without_target_handler))
        .route("/log/*target", any(ingest::ingest_handler))
        .with_state(app_state)
}

/// Router plus API docs, CORS and request tracing.
pub fn build_app(app_state: crate::transport::http::types::AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);
    create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
