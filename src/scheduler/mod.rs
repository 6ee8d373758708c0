/// Auction close scheduler
/// Open auctions whose end time has passed are closed on every tick and an
/// `auctionClosed` event is broadcast for each, naming the winning bidder.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::broadcast::{notify, Broadcaster};
use crate::error::Result;
use crate::store::MarketStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Auction Scheduler
pub struct AuctionScheduler {
    store: Arc<dyn MarketStore>,
    broadcaster: Arc<dyn Broadcaster>,
    period: Duration,
}

impl AuctionScheduler {
    pub fn new(
        store: Arc<dyn MarketStore>,
        broadcaster: Arc<dyn Broadcaster>,
        period: Duration,
    ) -> Self {
        Self {
            store,
            broadcaster,
            period,
        }
    }

    /// Spawn the sweep loop
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.sweep_once(Utc::now()).await {
                    error!("{:<12} --> Sweep failed: {:?}", "Scheduler", e);
                }
            }
        })
    }

    /// Close every auction expired at `now`; returns how many were closed
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<usize> {
        let closed = self.store.close_expired_items(now).await?;

        for auction in &closed {
            // deleted bids leave current_price behind; the surviving top bid decides
            let (final_price, winner_id) = match &auction.winning_bid {
                Some(bid) => (bid.bid_amount, Some(bid.user_id)),
                None => (auction.item.starting_price, None),
            };
            info!(
                "{:<12} --> Auction {} closed at {}",
                "Scheduler", auction.item.id, final_price
            );
            notify(
                self.broadcaster.as_ref(),
                AuctionEvent::AuctionClosed {
                    item_id: auction.item.id,
                    final_price,
                    winner_id,
                },
            )
            .await;
        }

        debug!("{:<12} --> Sweep done, {} closed", "Scheduler", closed.len());
        Ok(closed.len())
    }
}
// endregion: --- Auction Scheduler

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::{ItemStatus, NewItem};
    use crate::bidding::model::PlaceBidCommand;
    use crate::broadcast::SocketHub;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn sweep_closes_expired_auction_and_announces_winner() {
        let store = Arc::new(InMemoryStore::new());
        let hub = SocketHub::new(8);
        let mut events = hub.subscribe();
        let scheduler = AuctionScheduler::new(
            store.clone(),
            Arc::new(hub.clone()),
            Duration::from_secs(1),
        );

        let item = store
            .create_item(
                NewItem {
                    name: "Sea urchin tray".into(),
                    description: String::new(),
                    starting_price: 500,
                    end_time: Utc::now() + chrono::Duration::minutes(5),
                    seller_id: 3,
                    status: None,
                },
                ItemStatus::Open,
                Utc::now(),
            )
            .await
            .unwrap();
        store
            .place_bid(
                &PlaceBidCommand {
                    item_id: item.id,
                    user_id: 42,
                    bid_amount: 750,
                },
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(scheduler.sweep_once(Utc::now()).await.unwrap(), 0);

        let after_end = item.end_time + chrono::Duration::seconds(1);
        assert_eq!(scheduler.sweep_once(after_end).await.unwrap(), 1);
        assert_eq!(
            store.get_item(item.id).await.unwrap().status,
            ItemStatus::Closed
        );
        assert_eq!(
            events.recv().await.unwrap(),
            AuctionEvent::AuctionClosed {
                item_id: item.id,
                final_price: 750,
                winner_id: Some(42),
            }
        );
    }

    #[tokio::test]
    async fn closing_price_follows_the_remaining_top_bid() {
        let store = Arc::new(InMemoryStore::new());
        let hub = SocketHub::new(8);
        let mut events = hub.subscribe();
        let scheduler = AuctionScheduler::new(
            store.clone(),
            Arc::new(hub.clone()),
            Duration::from_secs(1),
        );

        let item = store
            .create_item(
                NewItem {
                    name: "Live king crab".into(),
                    description: String::new(),
                    starting_price: 100,
                    end_time: Utc::now() + chrono::Duration::minutes(5),
                    seller_id: 3,
                    status: None,
                },
                ItemStatus::Open,
                Utc::now(),
            )
            .await
            .unwrap();
        for (user_id, bid_amount) in [(1, 200), (2, 900)] {
            store
                .place_bid(
                    &PlaceBidCommand {
                        item_id: item.id,
                        user_id,
                        bid_amount,
                    },
                    Utc::now(),
                )
                .await
                .unwrap();
        }
        let top = store.get_highest_bid(item.id).await.unwrap().unwrap();
        store.delete_bid(top.id).await.unwrap();

        let after_end = item.end_time + chrono::Duration::seconds(1);
        assert_eq!(scheduler.sweep_once(after_end).await.unwrap(), 1);
        assert_eq!(
            events.recv().await.unwrap(),
            AuctionEvent::AuctionClosed {
                item_id: item.id,
                final_price: 200,
                winner_id: Some(1),
            }
        );
    }

    #[tokio::test]
    async fn auction_without_bids_closes_at_starting_price() {
        let store = Arc::new(InMemoryStore::new());
        let hub = SocketHub::new(8);
        let mut events = hub.subscribe();
        let scheduler = AuctionScheduler::new(
            store.clone(),
            Arc::new(hub.clone()),
            Duration::from_secs(1),
        );

        let item = store
            .create_item(
                NewItem {
                    name: "Oyster crate".into(),
                    description: String::new(),
                    starting_price: 300,
                    end_time: Utc::now() + chrono::Duration::minutes(5),
                    seller_id: 3,
                    status: None,
                },
                ItemStatus::Open,
                Utc::now(),
            )
            .await
            .unwrap();

        let after_end = item.end_time + chrono::Duration::seconds(1);
        assert_eq!(scheduler.sweep_once(after_end).await.unwrap(), 1);
        assert_eq!(
            events.recv().await.unwrap(),
            AuctionEvent::AuctionClosed {
                item_id: item.id,
                final_price: 300,
                winner_id: None,
            }
        );
    }
}
// endregion: --- Tests
