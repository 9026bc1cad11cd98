use agora_core::AppError;
use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/api/users/{user_id}/roles",
            get(handlers::roles::list_user_roles_handler),
        )
        .route(
            "/api/users/{user_id}/effective-role",
            get(handlers::roles::user_effective_role_handler),
        )
        .route(
            "/api/communities/{community_id}/members/{user_id}/roles",
            get(handlers::roles::list_member_roles_handler),
        )
        .route(
            "/api/communities/{community_id}/members/{user_id}/effective-role",
            get(handlers::roles::member_effective_role_handler),
        )
        .route(
            "/api/follows/{follower_id}/{followee_id}",
            get(handlers::follows::follow_status_handler),
        )
        .route(
            "/api/follows/{follower_id}/{followee_id}/toggle",
            post(handlers::follows::toggle_follow_handler),
        )
        .layer(build_cors_layer(frontend_url)?)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state))
}

fn build_cors_layer(frontend_url: &str) -> Result<CorsLayer, AppError> {
    Ok(CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]))
}
