// region:    --- Imports
use crate::auction::commands as items;
use crate::auction::model::{ItemFilter, ItemStatus, NewItem, StatusChange};
use crate::bidding::commands::{handle_delete_bid as delete_bid, handle_place_bid as place_bid};
use crate::bidding::model::PlaceBidCommand;
use crate::error::{Error, Result};
use crate::ordering::commands as orders;
use crate::ordering::model::{NewOrder, OrderFilter, OrderStatus};
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::info;

// endregion: --- Imports

// region:    --- Extraction
fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| Error::MalformedPayload(e.body_text()))
}

fn path<T>(id: std::result::Result<Path<T>, PathRejection>) -> Result<T> {
    id.map(|Path(value)| value)
        .map_err(|e| Error::MalformedPayload(e.body_text()))
}

fn query<T>(params: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    params
        .map(|Query(value)| value)
        .map_err(|e| Error::MalformedPayload(e.body_text()))
}
// endregion: --- Extraction

// region:    --- Bid Handlers

/// `POST /api/bids`
pub async fn handle_place_bid(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PlaceBidCommand>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let cmd = body(payload)?;
    let bid = place_bid(cmd, state.store.as_ref(), state.broadcaster.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(bid)))
}

/// `GET /api/bids/:itemId`
pub async fn handle_get_item_bids(
    State(state): State<AppState>,
    item_id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse> {
    let item_id = path(item_id)?;
    info!("{:<12} --> Item bids id: {}", "HandlerQuery", item_id);
    Ok(Json(state.store.get_item_bids(item_id).await?))
}

/// `DELETE /api/bids/:id`
pub async fn handle_delete_bid(
    State(state): State<AppState>,
    bid_id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse> {
    let bid_id = path(bid_id)?;
    let bid = delete_bid(bid_id, state.store.as_ref()).await?;
    Ok(Json(bid))
}

/// `GET /api/items/:id/highest-bid`
pub async fn handle_get_highest_bid(
    State(state): State<AppState>,
    item_id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse> {
    let item_id = path(item_id)?;
    info!("{:<12} --> Highest bid id: {}", "HandlerQuery", item_id);
    Ok(Json(state.store.get_highest_bid(item_id).await?))
}

// endregion: --- Bid Handlers

// region:    --- Item Handlers

/// `POST /api/items`
pub async fn handle_create_item(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewItem>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let item = items::handle_create_item(body(payload)?, state.store.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// `GET /api/items`
pub async fn handle_get_items(
    State(state): State<AppState>,
    params: std::result::Result<Query<ItemFilter>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let filter = query(params)?;
    Ok(Json(items::list_items(filter.status, state.store.as_ref()).await?))
}

/// `GET /api/items/:id`
pub async fn handle_get_item(
    State(state): State<AppState>,
    item_id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse> {
    let item_id = path(item_id)?;
    Ok(Json(items::get_item(item_id, state.store.as_ref()).await?))
}

/// `PATCH /api/items/:id/status`
pub async fn handle_change_item_status(
    State(state): State<AppState>,
    item_id: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<StatusChange<ItemStatus>>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let item_id = path(item_id)?;
    let change = body(payload)?;
    let item = items::handle_change_item_status(
        item_id,
        change.status,
        state.store.as_ref(),
        state.broadcaster.as_ref(),
    )
    .await?;
    Ok(Json(item))
}

/// `DELETE /api/items/:id`
pub async fn handle_delete_item(
    State(state): State<AppState>,
    item_id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse> {
    let item_id = path(item_id)?;
    Ok(Json(items::handle_delete_item(item_id, state.store.as_ref()).await?))
}

// endregion: --- Item Handlers

// region:    --- Order Handlers

/// `POST /api/orders`
pub async fn handle_create_order(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewOrder>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let order = orders::handle_create_order(body(payload)?, state.store.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// `GET /api/orders`
pub async fn handle_get_orders(
    State(state): State<AppState>,
    params: std::result::Result<Query<OrderFilter>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let filter = query(params)?;
    info!("{:<12} --> Orders (buyer: {:?})", "HandlerQuery", filter.buyer_id);
    Ok(Json(state.store.list_orders(filter.buyer_id).await?))
}

/// `GET /api/orders/:id`
pub async fn handle_get_order(
    State(state): State<AppState>,
    order_id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse> {
    let order_id = path(order_id)?;
    info!("{:<12} --> Order id: {}", "HandlerQuery", order_id);
    Ok(Json(state.store.get_order(order_id).await?))
}

/// `PATCH /api/orders/:id/status`
pub async fn handle_change_order_status(
    State(state): State<AppState>,
    order_id: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<StatusChange<OrderStatus>>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let order_id = path(order_id)?;
    let change = body(payload)?;
    let order =
        orders::handle_change_order_status(order_id, change.status, state.store.as_ref()).await?;
    Ok(Json(order))
}

// endregion: --- Order Handlers
