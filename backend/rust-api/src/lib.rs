use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod progression;
pub mod services;
pub mod store;
pub mod utils;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/metrics",
            get(handlers::metrics_handler).layer(middleware::from_fn_with_state(
                app_state.clone(),
                handlers::metrics_auth_middleware,
            )),
        )
        .nest("/api/v1", api_routes().layer(cors))
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(
                    middlewares::trace::trace_context_middleware,
                ))
                .layer(middleware::from_fn(
                    middlewares::metrics::metrics_middleware,
                ))
                .layer(CompressionLayer::new()),
        )
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/activity-kinds", get(handlers::catalog::list_activity_kinds))
        .route("/achievements", get(handlers::catalog::list_achievements))
        .route("/labs", get(handlers::catalog::list_labs))
        .route("/leaderboard", get(handlers::leaderboard::get_leaderboard))
        .route(
            "/learners/{learner_id}/stats",
            get(handlers::learners::get_stats).delete(handlers::learners::reset_stats),
        )
        .route(
            "/learners/{learner_id}/activities",
            get(handlers::learners::list_activities).post(handlers::learners::log_activity),
        )
        .route(
            "/learners/{learner_id}/achievements",
            get(handlers::learners::get_achievements),
        )
        .route(
            "/learners/{learner_id}/labs/{lab_id}/verify",
            post(handlers::learners::verify_lab),
        )
}
