use crate::auction::model::ItemStatus;
use serde::{Deserialize, Serialize};

/// Events pushed to connected clients and the message broker.
///
/// Serialized as `{"event": "<name>", "data": {...}}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum AuctionEvent {
    // new bid accepted
    #[serde(rename = "newBid")]
    BidPlaced {
        item_id: i64,
        user_id: i64,
        bid_amount: i64,
    },
    // auction closed on expiry
    #[serde(rename = "auctionClosed")]
    AuctionClosed {
        item_id: i64,
        final_price: i64,
        winner_id: Option<i64>,
    },
    // admin status change
    #[serde(rename = "itemStatusChanged")]
    ItemStatusChanged { item_id: i64, status: ItemStatus },
}

impl AuctionEvent {
    pub fn item_id(&self) -> i64 {
        match self {
            AuctionEvent::BidPlaced { item_id, .. }
            | AuctionEvent::AuctionClosed { item_id, .. }
            | AuctionEvent::ItemStatusChanged { item_id, .. } => *item_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AuctionEvent::BidPlaced { .. } => "newBid",
            AuctionEvent::AuctionClosed { .. } => "auctionClosed",
            AuctionEvent::ItemStatusChanged { .. } => "itemStatusChanged",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_bid_uses_socket_wire_shape() {
        let event = AuctionEvent::BidPlaced {
            item_id: 3,
            user_id: 11,
            bid_amount: 4500,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event": "newBid",
                "data": {"itemId": 3, "userId": 11, "bidAmount": 4500}
            })
        );
    }

    #[test]
    fn closed_auction_without_bids_has_no_winner() {
        let event = AuctionEvent::AuctionClosed {
            item_id: 9,
            final_price: 100,
            winner_id: None,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "auctionClosed");
        assert!(value["data"]["winnerId"].is_null());
        assert_eq!(event.item_id(), 9);
    }
}
