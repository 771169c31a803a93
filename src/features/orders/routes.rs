use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::features::orders::handlers::order_handler;
use crate::features::orders::services::OrderService;
use crate::shared::constants::MAX_FILE_SIZE;

/// Public order routes: the QR landing page lookup only
pub fn public_routes(service: Arc<OrderService>) -> Router {
    Router::new()
        .route(
            "/api/orders/album/{id}",
            get(order_handler::get_public_album),
        )
        .with_state(service)
}

/// Protected order routes (require JWT authentication)
pub fn protected_routes(service: Arc<OrderService>) -> Router {
    Router::new()
        .route(
            "/api/orders",
            // Allow body size up to MAX_FILE_SIZE + buffer for multipart overhead
            post(order_handler::create_order)
                .get(order_handler::get_my_orders)
                .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + 1024 * 1024)),
        )
        .route("/api/orders/all", get(order_handler::get_all_orders))
        .route(
            "/api/orders/{id}",
            get(order_handler::get_order_by_id).delete(order_handler::delete_order),
        )
        .route(
            "/api/orders/{id}/status",
            put(order_handler::update_order_status),
        )
        .route(
            "/api/orders/{id}/notes",
            put(order_handler::add_order_notes),
        )
        .route(
            "/api/orders/{id}/download",
            get(order_handler::download_order_file),
        )
        .route(
            "/api/orders/drive/{file_id}/download",
            get(order_handler::download_drive_file),
        )
        .with_state(service)
}
