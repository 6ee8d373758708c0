//! Storage seam for items, bids and orders.
//!
//! `PostgresStore` backs the running service; `InMemoryStore` is used when no
//! database is configured and by the tests.
// region:    --- Imports
use crate::auction::model::{ClosedAuction, Item, ItemStatus, NewItem};
use crate::bidding::model::{Bid, PlaceBidCommand};
use crate::error::Result;
use crate::ordering::model::{NewOrder, Order, OrderStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

mod in_memory;
mod postgres;
mod queries;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

// endregion: --- Imports

// region:    --- Market Store Trait
#[async_trait]
pub trait MarketStore: Send + Sync {
    // -- Items
    async fn create_item(
        &self,
        item: NewItem,
        status: ItemStatus,
        now: DateTime<Utc>,
    ) -> Result<Item>;

    async fn get_item(&self, item_id: i64) -> Result<Item>;

    /// Newest first.
    async fn list_items(&self, status: Option<ItemStatus>) -> Result<Vec<Item>>;

    /// Applies an admin transition, rejecting those the lifecycle forbids.
    async fn update_item_status(&self, item_id: i64, status: ItemStatus) -> Result<Item>;

    /// Removes the item together with its bids.
    async fn delete_item(&self, item_id: i64) -> Result<Item>;

    /// Closes every open item whose end time is at or before `now`.
    async fn close_expired_items(&self, now: DateTime<Utc>) -> Result<Vec<ClosedAuction>>;

    // -- Bids
    /// Atomically checks the bid against the item and records it, raising the
    /// item's current price to the bid amount.
    async fn place_bid(&self, cmd: &PlaceBidCommand, now: DateTime<Utc>) -> Result<Bid>;

    /// Highest amount first.
    async fn get_item_bids(&self, item_id: i64) -> Result<Vec<Bid>>;

    async fn get_highest_bid(&self, item_id: i64) -> Result<Option<Bid>>;

    async fn delete_bid(&self, bid_id: i64) -> Result<Bid>;

    // -- Orders
    async fn create_order(&self, order: &NewOrder, now: DateTime<Utc>) -> Result<Order>;

    async fn get_order(&self, order_id: i64) -> Result<Order>;

    /// Newest first.
    async fn list_orders(&self, buyer_id: Option<i64>) -> Result<Vec<Order>>;

    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Order>;
}
// endregion: --- Market Store Trait
