use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::features::auth::handlers;
use crate::features::auth::services::AuthService;

/// Public user routes (no authentication required)
pub fn public_routes(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/api/users", post(handlers::register))
        .route("/api/users/login", post(handlers::login))
        .with_state(service)
}

/// Protected user routes (require JWT authentication)
pub fn protected_routes(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/api/users/profile", get(handlers::get_profile))
        .route(
            "/api/users/photographers",
            get(handlers::list_photographers),
        )
        .route("/api/users/{id}", delete(handlers::delete_user))
        .with_state(service)
}
