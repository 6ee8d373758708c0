use crate::broadcast::handle_socket;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Full HTTP + WebSocket surface
pub fn routes(state: AppState) -> Router {
    // browser dashboards are served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/items",
            get(handlers::handle_get_items).post(handlers::handle_create_item),
        )
        .route(
            "/api/items/:id",
            get(handlers::handle_get_item).delete(handlers::handle_delete_item),
        )
        .route(
            "/api/items/:id/status",
            patch(handlers::handle_change_item_status),
        )
        .route(
            "/api/items/:id/highest-bid",
            get(handlers::handle_get_highest_bid),
        )
        .route("/api/bids", post(handlers::handle_place_bid))
        // GET takes an item id, DELETE a bid id
        .route(
            "/api/bids/:id",
            get(handlers::handle_get_item_bids).delete(handlers::handle_delete_bid),
        )
        .route(
            "/api/orders",
            get(handlers::handle_get_orders).post(handlers::handle_create_order),
        )
        .route("/api/orders/:id", get(handlers::handle_get_order))
        .route(
            "/api/orders/:id/status",
            patch(handlers::handle_change_order_status),
        )
        .route("/socket", get(handle_socket))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .with_state(state)
}
