use super::MarketStore;
use crate::auction::model::{ClosedAuction, Item, ItemStatus, NewItem};
use crate::bidding::model::{Bid, PlaceBidCommand};
use crate::bidding::rules::check_bid;
use crate::error::{Error, Result};
use crate::ordering::model::{total_price, NewOrder, Order, OrderStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

/// Process-local store.
///
/// One mutex guards all tables, so every operation is serialized and a bid's
/// check and insert can never interleave with another bid.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    items: BTreeMap<i64, Item>,
    bids: BTreeMap<i64, Bid>,
    orders: BTreeMap<i64, Order>,
    last_item_id: i64,
    last_bid_id: i64,
    last_order_id: i64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    fn item(&self, item_id: i64) -> Result<&Item> {
        self.items.get(&item_id).ok_or(Error::ItemNotFound(item_id))
    }

    fn ranked_bids(&self, item_id: i64) -> Vec<Bid> {
        let mut bids: Vec<Bid> = self
            .bids
            .values()
            .filter(|bid| bid.item_id == item_id)
            .cloned()
            .collect();
        bids.sort_by(Bid::rank);
        bids
    }
}

#[async_trait]
impl MarketStore for InMemoryStore {
    async fn create_item(
        &self,
        item: NewItem,
        status: ItemStatus,
        now: DateTime<Utc>,
    ) -> Result<Item> {
        let mut tables = self.inner.lock().await;
        tables.last_item_id += 1;
        let item = Item {
            id: tables.last_item_id,
            name: item.name,
            description: item.description,
            starting_price: item.starting_price,
            current_price: item.starting_price,
            status,
            end_time: item.end_time,
            seller_id: item.seller_id,
            created_at: now,
        };
        tables.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get_item(&self, item_id: i64) -> Result<Item> {
        self.inner.lock().await.item(item_id).cloned()
    }

    async fn list_items(&self, status: Option<ItemStatus>) -> Result<Vec<Item>> {
        let tables = self.inner.lock().await;
        let mut items: Vec<Item> = tables
            .items
            .values()
            .filter(|item| status.map_or(true, |s| item.status == s))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(items)
    }

    async fn update_item_status(&self, item_id: i64, status: ItemStatus) -> Result<Item> {
        let mut tables = self.inner.lock().await;
        let item = tables
            .items
            .get_mut(&item_id)
            .ok_or(Error::ItemNotFound(item_id))?;
        if !item.status.can_transition_to(status) {
            return Err(Error::InvalidItemTransition {
                from: item.status,
                to: status,
            });
        }
        item.status = status;
        Ok(item.clone())
    }

    async fn delete_item(&self, item_id: i64) -> Result<Item> {
        let mut tables = self.inner.lock().await;
        let item = tables
            .items
            .remove(&item_id)
            .ok_or(Error::ItemNotFound(item_id))?;
        tables.bids.retain(|_, bid| bid.item_id != item_id);
        Ok(item)
    }

    async fn close_expired_items(&self, now: DateTime<Utc>) -> Result<Vec<ClosedAuction>> {
        let mut tables = self.inner.lock().await;
        let expired: Vec<i64> = tables
            .items
            .values()
            .filter(|item| item.is_expired(now))
            .map(|item| item.id)
            .collect();

        let mut closed = Vec::with_capacity(expired.len());
        for item_id in expired {
            let winning_bid = tables.ranked_bids(item_id).into_iter().next();
            if let Some(item) = tables.items.get_mut(&item_id) {
                item.status = ItemStatus::Closed;
                closed.push(ClosedAuction {
                    item: item.clone(),
                    winning_bid,
                });
            }
        }
        Ok(closed)
    }

    async fn place_bid(&self, cmd: &PlaceBidCommand, now: DateTime<Utc>) -> Result<Bid> {
        let mut tables = self.inner.lock().await;
        check_bid(tables.item(cmd.item_id)?, cmd.bid_amount, now)?;

        tables.last_bid_id += 1;
        let bid = Bid {
            id: tables.last_bid_id,
            item_id: cmd.item_id,
            user_id: cmd.user_id,
            bid_amount: cmd.bid_amount,
            created_at: now,
        };
        tables.bids.insert(bid.id, bid.clone());
        if let Some(item) = tables.items.get_mut(&cmd.item_id) {
            item.current_price = cmd.bid_amount;
        }
        Ok(bid)
    }

    async fn get_item_bids(&self, item_id: i64) -> Result<Vec<Bid>> {
        Ok(self.inner.lock().await.ranked_bids(item_id))
    }

    async fn get_highest_bid(&self, item_id: i64) -> Result<Option<Bid>> {
        Ok(self.inner.lock().await.ranked_bids(item_id).into_iter().next())
    }

    async fn delete_bid(&self, bid_id: i64) -> Result<Bid> {
        self.inner
            .lock()
            .await
            .bids
            .remove(&bid_id)
            .ok_or(Error::BidNotFound(bid_id))
    }

    async fn create_order(&self, order: &NewOrder, now: DateTime<Utc>) -> Result<Order> {
        let mut tables = self.inner.lock().await;
        let total = total_price(&order.items, |item_id| {
            tables.item(item_id).map(|item| item.current_price)
        })?;

        tables.last_order_id += 1;
        let order = Order {
            id: tables.last_order_id,
            buyer_id: order.buyer_id,
            items: order.items.clone(),
            total_price: total,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, order_id: i64) -> Result<Order> {
        self.inner
            .lock()
            .await
            .orders
            .get(&order_id)
            .cloned()
            .ok_or(Error::OrderNotFound(order_id))
    }

    async fn list_orders(&self, buyer_id: Option<i64>) -> Result<Vec<Order>> {
        let tables = self.inner.lock().await;
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|order| buyer_id.map_or(true, |id| order.buyer_id == id))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Order> {
        let mut tables = self.inner.lock().await;
        let order = tables
            .orders
            .get_mut(&order_id)
            .ok_or(Error::OrderNotFound(order_id))?;
        if !order.status.can_transition_to(status) {
            return Err(Error::InvalidOrderTransition {
                from: order.status,
                to: status,
            });
        }
        order.status = status;
        order.updated_at = now;
        Ok(order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::model::OrderLine;
    use chrono::Duration;
    use std::sync::Arc;

    async fn open_item(store: &InMemoryStore, starting_price: i64) -> Item {
        store
            .create_item(
                NewItem {
                    name: "Atlantic salmon".into(),
                    description: "Whole fish, 5kg".into(),
                    starting_price,
                    end_time: Utc::now() + Duration::hours(1),
                    seller_id: 1,
                    status: None,
                },
                ItemStatus::Open,
                Utc::now(),
            )
            .await
            .unwrap()
    }

    fn bid(item_id: i64, user_id: i64, bid_amount: i64) -> PlaceBidCommand {
        PlaceBidCommand {
            item_id,
            user_id,
            bid_amount,
        }
    }

    #[tokio::test]
    async fn accepted_bid_raises_current_price() {
        let store = InMemoryStore::new();
        let item = open_item(&store, 1000).await;

        let placed = store.place_bid(&bid(item.id, 2, 1500), Utc::now()).await.unwrap();
        assert_eq!(placed.bid_amount, 1500);
        assert_eq!(store.get_item(item.id).await.unwrap().current_price, 1500);

        let err = store
            .place_bid(&bid(item.id, 3, 1500), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BidTooLow { current_price: 1500, .. }));
    }

    #[tokio::test]
    async fn concurrent_equal_bids_only_one_wins() {
        let store = Arc::new(InMemoryStore::new());
        let item_id = open_item(&store, 1000).await.id;

        let handles: Vec<_> = (1..=2)
            .map(|user_id| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .place_bid(&bid(item_id, user_id, 2000), Utc::now())
                        .await
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(store.get_item_bids(item_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn highest_of_concurrent_burst_wins() {
        let store = Arc::new(InMemoryStore::new());
        let item_id = open_item(&store, 1000).await.id;

        let handles: Vec<_> = (1..=50)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .place_bid(&bid(item_id, i, 1000 + i * 100), Utc::now())
                        .await
                })
            })
            .collect();
        for handle in handles {
            let _ = handle.await.unwrap();
        }

        assert_eq!(store.get_item(item_id).await.unwrap().current_price, 6000);
        let bids = store.get_item_bids(item_id).await.unwrap();
        assert_eq!(bids[0].bid_amount, 6000);
        // every accepted bid outbid the one accepted before it
        let mut by_id = bids.clone();
        by_id.sort_by_key(|b| b.id);
        assert!(by_id.windows(2).all(|w| w[0].bid_amount < w[1].bid_amount));
    }

    #[tokio::test]
    async fn sweep_closes_only_expired_open_items() {
        let store = InMemoryStore::new();
        let item = open_item(&store, 1000).await;
        store.place_bid(&bid(item.id, 4, 1200), Utc::now()).await.unwrap();

        assert!(store.close_expired_items(Utc::now()).await.unwrap().is_empty());

        let later = item.end_time + Duration::seconds(1);
        let closed = store.close_expired_items(later).await.unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].item.status, ItemStatus::Closed);
        assert_eq!(closed[0].winning_bid.as_ref().map(|b| b.user_id), Some(4));

        assert!(store.close_expired_items(later).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_item_drops_its_bids() {
        let store = InMemoryStore::new();
        let item = open_item(&store, 1000).await;
        store.place_bid(&bid(item.id, 4, 1200), Utc::now()).await.unwrap();

        store.delete_item(item.id).await.unwrap();
        assert!(store.get_item_bids(item.id).await.unwrap().is_empty());
        assert!(matches!(
            store.get_item(item.id).await,
            Err(Error::ItemNotFound(_))
        ));
    }

    #[tokio::test]
    async fn order_total_uses_current_prices() {
        let store = InMemoryStore::new();
        let crab = open_item(&store, 3000).await;
        let prawns = open_item(&store, 800).await;
        store.place_bid(&bid(crab.id, 9, 3500), Utc::now()).await.unwrap();

        let order = store
            .create_order(
                &NewOrder {
                    buyer_id: 9,
                    items: vec![
                        OrderLine {
                            item_id: crab.id,
                            quantity: 1,
                        },
                        OrderLine {
                            item_id: prawns.id,
                            quantity: 4,
                        },
                    ],
                },
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(order.total_price, 3500 + 4 * 800);
        assert_eq!(order.status, OrderStatus::Pending);
    }
}
