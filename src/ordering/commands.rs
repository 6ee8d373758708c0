/// Order commands
// region:    --- Imports
use crate::error::Result;
use crate::ordering::model::{NewOrder, Order, OrderStatus};
use crate::store::MarketStore;
use chrono::Utc;
use tracing::info;
// endregion: --- Imports

/// Totals are priced from the items' current prices at creation time.
pub async fn handle_create_order(order: NewOrder, store: &dyn MarketStore) -> Result<Order> {
    info!(
        "{:<12} --> Creating order for buyer {} ({} line(s))",
        "Command",
        order.buyer_id,
        order.items.len()
    );
    order.validate()?;
    store.create_order(&order, Utc::now()).await
}

pub async fn handle_change_order_status(
    order_id: i64,
    status: OrderStatus,
    store: &dyn MarketStore,
) -> Result<Order> {
    info!(
        "{:<12} --> Changing order {} status to {}",
        "Command", order_id, status
    );
    store.update_order_status(order_id, status, Utc::now()).await
}
