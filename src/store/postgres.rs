// region:    --- Imports
use super::{queries, MarketStore};
use crate::auction::model::{ClosedAuction, Item, ItemStatus, NewItem};
use crate::bidding::model::{Bid, PlaceBidCommand};
use crate::bidding::rules::check_bid;
use crate::database::DatabaseManager;
use crate::error::{Error, Result};
use crate::ordering::model::{total_price, NewOrder, Order, OrderLine, OrderStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

// endregion: --- Imports

// Maximum compare-and-swap attempts per bid
const MAX_RETRIES: i32 = 100;

// region:    --- Rows
#[derive(FromRow)]
struct ItemRow {
    id: i64,
    name: String,
    description: String,
    starting_price: i64,
    current_price: i64,
    status: String,
    end_time: DateTime<Utc>,
    seller_id: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for Item {
    type Error = Error;

    fn try_from(row: ItemRow) -> Result<Self> {
        Ok(Item {
            id: row.id,
            name: row.name,
            description: row.description,
            starting_price: row.starting_price,
            current_price: row.current_price,
            status: row.status.parse()?,
            end_time: row.end_time,
            seller_id: row.seller_id,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct OrderRow {
    id: i64,
    buyer_id: i64,
    total_price: i64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderLine>) -> Result<Order> {
        Ok(Order {
            id: self.id,
            buyer_id: self.buyer_id,
            items,
            total_price: self.total_price,
            status: self.status.parse()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct OrderLineRow {
    order_id: i64,
    item_id: i64,
    quantity: i32,
}

fn into_items(rows: Vec<ItemRow>) -> Result<Vec<Item>> {
    rows.into_iter().map(Item::try_from).collect()
}
// endregion: --- Rows

// region:    --- Postgres Store
pub struct PostgresStore {
    db: Arc<DatabaseManager>,
}

impl PostgresStore {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Attach lines to order rows, keeping the row order
    async fn with_lines(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>> {
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let lines = sqlx::query_as::<_, OrderLineRow>(queries::GET_ORDER_LINES)
            .bind(ids)
            .fetch_all(self.db.pool())
            .await?;

        let mut by_order: HashMap<i64, Vec<OrderLine>> = HashMap::new();
        for line in lines {
            by_order.entry(line.order_id).or_default().push(OrderLine {
                item_id: line.item_id,
                quantity: line.quantity,
            });
        }

        rows.into_iter()
            .map(|row| {
                let items = by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect()
    }
}

#[async_trait]
impl MarketStore for PostgresStore {
    async fn create_item(
        &self,
        item: NewItem,
        status: ItemStatus,
        now: DateTime<Utc>,
    ) -> Result<Item> {
        let row = sqlx::query_as::<_, ItemRow>(queries::INSERT_ITEM)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.starting_price)
            .bind(status.as_str())
            .bind(item.end_time)
            .bind(item.seller_id)
            .bind(now)
            .fetch_one(self.db.pool())
            .await?;
        row.try_into()
    }

    async fn get_item(&self, item_id: i64) -> Result<Item> {
        sqlx::query_as::<_, ItemRow>(queries::GET_ITEM)
            .bind(item_id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or(Error::ItemNotFound(item_id))?
            .try_into()
    }

    async fn list_items(&self, status: Option<ItemStatus>) -> Result<Vec<Item>> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, ItemRow>(queries::GET_ITEMS_BY_STATUS)
                    .bind(status.as_str())
                    .fetch_all(self.db.pool())
                    .await?
            }
            None => {
                sqlx::query_as::<_, ItemRow>(queries::GET_ALL_ITEMS)
                    .fetch_all(self.db.pool())
                    .await?
            }
        };
        into_items(rows)
    }

    async fn update_item_status(&self, item_id: i64, status: ItemStatus) -> Result<Item> {
        self.db
            .transaction(|tx| {
                Box::pin(async move {
                    let current: Item = sqlx::query_as::<_, ItemRow>(queries::GET_ITEM_FOR_UPDATE)
                        .bind(item_id)
                        .fetch_optional(&mut **tx)
                        .await?
                        .ok_or(Error::ItemNotFound(item_id))?
                        .try_into()?;

                    if !current.status.can_transition_to(status) {
                        return Err(Error::InvalidItemTransition {
                            from: current.status,
                            to: status,
                        });
                    }

                    let row = sqlx::query_as::<_, ItemRow>(queries::UPDATE_ITEM_STATUS)
                        .bind(item_id)
                        .bind(status.as_str())
                        .fetch_one(&mut **tx)
                        .await?;
                    Item::try_from(row)
                })
            })
            .await
    }

    async fn delete_item(&self, item_id: i64) -> Result<Item> {
        sqlx::query_as::<_, ItemRow>(queries::DELETE_ITEM)
            .bind(item_id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or(Error::ItemNotFound(item_id))?
            .try_into()
    }

    async fn close_expired_items(&self, now: DateTime<Utc>) -> Result<Vec<ClosedAuction>> {
        self.db
            .transaction(|tx| {
                Box::pin(async move {
                    let rows = sqlx::query_as::<_, ItemRow>(queries::CLOSE_EXPIRED_ITEMS)
                        .bind(now)
                        .fetch_all(&mut **tx)
                        .await?;

                    let mut closed = Vec::with_capacity(rows.len());
                    for item in into_items(rows)? {
                        let winning_bid = sqlx::query_as::<_, Bid>(queries::GET_HIGHEST_BID)
                            .bind(item.id)
                            .fetch_optional(&mut **tx)
                            .await?;
                        closed.push(ClosedAuction { item, winning_bid });
                    }
                    Ok::<_, Error>(closed)
                })
            })
            .await
    }

    async fn place_bid(&self, cmd: &PlaceBidCommand, now: DateTime<Utc>) -> Result<Bid> {
        let PlaceBidCommand {
            item_id,
            user_id,
            bid_amount,
        } = *cmd;

        for attempt in 1..=MAX_RETRIES {
            // price raise and bid insert commit together or not at all
            let placed = self
                .db
                .transaction(|tx| {
                    Box::pin(async move {
                        let raised = sqlx::query(queries::RAISE_CURRENT_PRICE)
                            .bind(item_id)
                            .bind(bid_amount)
                            .bind(now)
                            .fetch_optional(&mut **tx)
                            .await?;
                        if raised.is_none() {
                            return Ok::<_, Error>(None);
                        }

                        let bid = sqlx::query_as::<_, Bid>(queries::INSERT_BID)
                            .bind(item_id)
                            .bind(user_id)
                            .bind(bid_amount)
                            .bind(now)
                            .fetch_one(&mut **tx)
                            .await?;
                        Ok(Some(bid))
                    })
                })
                .await?;

            if let Some(bid) = placed {
                info!(
                    "{:<12} --> Bid {} recorded, item {} now at {}",
                    "Store", bid.id, item_id, bid_amount
                );
                return Ok(bid);
            }

            // The swap matched nothing: find out which rule the bid broke.
            let item = self.get_item(item_id).await?;
            check_bid(&item, bid_amount, now)?;

            // Item changed between the swap and the read (e.g. just opened).
            warn!(
                "{:<12} --> Price swap missed for item {}, retrying ({}/{})",
                "Store", item_id, attempt, MAX_RETRIES
            );
        }

        Err(Error::Internal(format!(
            "bid on item {item_id} not settled after {MAX_RETRIES} attempts"
        )))
    }

    async fn get_item_bids(&self, item_id: i64) -> Result<Vec<Bid>> {
        Ok(sqlx::query_as::<_, Bid>(queries::GET_ITEM_BIDS)
            .bind(item_id)
            .fetch_all(self.db.pool())
            .await?)
    }

    async fn get_highest_bid(&self, item_id: i64) -> Result<Option<Bid>> {
        Ok(sqlx::query_as::<_, Bid>(queries::GET_HIGHEST_BID)
            .bind(item_id)
            .fetch_optional(self.db.pool())
            .await?)
    }

    async fn delete_bid(&self, bid_id: i64) -> Result<Bid> {
        sqlx::query_as::<_, Bid>(queries::DELETE_BID)
            .bind(bid_id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or(Error::BidNotFound(bid_id))
    }

    async fn create_order(&self, order: &NewOrder, now: DateTime<Utc>) -> Result<Order> {
        let order = order.clone();
        self.db
            .transaction(|tx| {
                Box::pin(async move {
                    let mut prices: HashMap<i64, i64> = HashMap::new();
                    for line in &order.items {
                        if prices.contains_key(&line.item_id) {
                            continue;
                        }
                        let price = sqlx::query_scalar::<_, i64>(queries::GET_ITEM_CURRENT_PRICE)
                            .bind(line.item_id)
                            .fetch_optional(&mut **tx)
                            .await?
                            .ok_or(Error::ItemNotFound(line.item_id))?;
                        prices.insert(line.item_id, price);
                    }
                    let total = total_price(&order.items, |item_id| {
                        prices
                            .get(&item_id)
                            .copied()
                            .ok_or(Error::ItemNotFound(item_id))
                    })?;

                    let row = sqlx::query_as::<_, OrderRow>(queries::INSERT_ORDER)
                        .bind(order.buyer_id)
                        .bind(total)
                        .bind(now)
                        .fetch_one(&mut **tx)
                        .await?;

                    for (position, line) in order.items.iter().enumerate() {
                        sqlx::query(queries::INSERT_ORDER_LINE)
                            .bind(row.id)
                            .bind(position as i32)
                            .bind(line.item_id)
                            .bind(line.quantity)
                            .execute(&mut **tx)
                            .await?;
                    }

                    row.into_order(order.items)
                })
            })
            .await
    }

    async fn get_order(&self, order_id: i64) -> Result<Order> {
        let row = sqlx::query_as::<_, OrderRow>(queries::GET_ORDER)
            .bind(order_id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or(Error::OrderNotFound(order_id))?;
        self.with_lines(vec![row])
            .await?
            .pop()
            .ok_or(Error::OrderNotFound(order_id))
    }

    async fn list_orders(&self, buyer_id: Option<i64>) -> Result<Vec<Order>> {
        let rows = match buyer_id {
            Some(buyer_id) => {
                sqlx::query_as::<_, OrderRow>(queries::GET_ORDERS_BY_BUYER)
                    .bind(buyer_id)
                    .fetch_all(self.db.pool())
                    .await?
            }
            None => {
                sqlx::query_as::<_, OrderRow>(queries::GET_ALL_ORDERS)
                    .fetch_all(self.db.pool())
                    .await?
            }
        };
        self.with_lines(rows).await
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Order> {
        let row = self
            .db
            .transaction(|tx| {
                Box::pin(async move {
                    let current = sqlx::query_as::<_, OrderRow>(queries::GET_ORDER_FOR_UPDATE)
                        .bind(order_id)
                        .fetch_optional(&mut **tx)
                        .await?
                        .ok_or(Error::OrderNotFound(order_id))?;
                    let from: OrderStatus = current.status.parse()?;

                    if !from.can_transition_to(status) {
                        return Err(Error::InvalidOrderTransition { from, to: status });
                    }

                    Ok::<_, Error>(sqlx::query_as::<_, OrderRow>(queries::UPDATE_ORDER_STATUS)
                        .bind(order_id)
                        .bind(status.as_str())
                        .bind(now)
                        .fetch_one(&mut **tx)
                        .await?)
                })
            })
            .await?;

        self.with_lines(vec![row])
            .await?
            .pop()
            .ok_or(Error::OrderNotFound(order_id))
    }
}
// endregion: --- Postgres Store
