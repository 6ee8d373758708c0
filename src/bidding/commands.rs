/// Bid commands
/// 1. Place bid
/// 2. Delete bid
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::bidding::model::{Bid, PlaceBidCommand};
use crate::bidding::rules::check_amount;
use crate::broadcast::{notify, Broadcaster};
use crate::error::Result;
use crate::store::MarketStore;
use chrono::Utc;
use tracing::info;
// endregion: --- Imports

// region:    --- Commands
/// 1. Place bid
///
/// The store checks and records the bid in one atomic step; the `newBid`
/// event goes out only after the bid is committed.
pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    store: &dyn MarketStore,
    broadcaster: &dyn Broadcaster,
) -> Result<Bid> {
    info!("{:<12} --> Placing bid: {:?}", "Command", cmd);
    check_amount(cmd.bid_amount)?;

    let bid = store.place_bid(&cmd, Utc::now()).await?;

    notify(
        broadcaster,
        AuctionEvent::BidPlaced {
            item_id: bid.item_id,
            user_id: bid.user_id,
            bid_amount: bid.bid_amount,
        },
    )
    .await;

    Ok(bid)
}

/// 2. Delete bid
///
/// Unconditional: auction state is not re-checked and nobody is notified.
pub async fn handle_delete_bid(bid_id: i64, store: &dyn MarketStore) -> Result<Bid> {
    info!("{:<12} --> Deleting bid id: {}", "Command", bid_id);
    store.delete_bid(bid_id).await
}
// endregion: --- Commands
