use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// Bid model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: i64,
    pub item_id: i64,
    pub user_id: i64,
    pub bid_amount: i64,
    pub created_at: DateTime<Utc>,
}

impl Bid {
    /// Ranking used by bid queries: highest amount first, earlier bid wins ties.
    pub fn rank(a: &Bid, b: &Bid) -> Ordering {
        b.bid_amount
            .cmp(&a.bid_amount)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    }
}

/// Place bid command (`POST /api/bids`)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBidCommand {
    pub item_id: i64,
    pub user_id: i64,
    pub bid_amount: i64,
}
