use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the main application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let data_quality_routes = Router::new()
        .route(
            "/api/data-quality/rules",
            get(handlers::data_quality::list_all_rules),
        )
        .route(
            "/api/data-quality/rules/page",
            get(handlers::data_quality::list_rules_paged),
        )
        .route(
            "/api/data-quality/rules/:id/form",
            get(handlers::data_quality::get_rule_form),
        )
        .route(
            "/api/data-quality/datasources/options",
            get(handlers::data_quality::datasource_options),
        );

    let ops_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::metrics_handler));

    Router::new()
        .merge(data_quality_routes)
        .merge(ops_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
