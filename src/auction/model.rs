use crate::bidding::model::Bid;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// region:    --- Item Status
/// Auction lifecycle of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Draft,
    Pending,
    Open,
    Closed,
    Sold,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Draft => "draft",
            ItemStatus::Pending => "pending",
            ItemStatus::Open => "open",
            ItemStatus::Closed => "closed",
            ItemStatus::Sold => "sold",
        }
    }

    /// Admin transitions. Closing on expiry goes through the scheduler, not here.
    pub fn can_transition_to(&self, next: ItemStatus) -> bool {
        use ItemStatus::*;
        matches!(
            (self, next),
            (Draft, Pending)
                | (Draft, Open)
                | (Pending, Open)
                | (Pending, Draft)
                | (Open, Closed)
                | (Closed, Sold)
        )
    }

    /// Statuses an item may be listed with.
    pub fn is_initial(&self) -> bool {
        matches!(self, ItemStatus::Draft | ItemStatus::Pending | ItemStatus::Open)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(ItemStatus::Draft),
            "pending" => Ok(ItemStatus::Pending),
            "open" => Ok(ItemStatus::Open),
            "closed" => Ok(ItemStatus::Closed),
            "sold" => Ok(ItemStatus::Sold),
            other => Err(Error::Internal(format!("unknown item status '{other}'"))),
        }
    }
}
// endregion: --- Item Status

// region:    --- Item
/// Auctionable seafood lot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub starting_price: i64,
    pub current_price: i64,
    pub status: ItemStatus,
    pub end_time: DateTime<Utc>,
    pub seller_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Open auction whose end time has passed but has not been closed yet.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == ItemStatus::Open && now >= self.end_time
    }

    /// Status as seen by readers: an expired open auction reads as closed
    /// even before the scheduler has persisted the change.
    pub fn with_effective_status(mut self, now: DateTime<Utc>) -> Self {
        if self.is_expired(now) {
            self.status = ItemStatus::Closed;
        }
        self
    }
}

/// Result of closing an expired auction
#[derive(Debug, Clone)]
pub struct ClosedAuction {
    pub item: Item,
    pub winning_bid: Option<Bid>,
}

/// Listing request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub starting_price: i64,
    pub end_time: DateTime<Utc>,
    pub seller_id: i64,
    #[serde(default)]
    pub status: Option<ItemStatus>,
}

impl NewItem {
    /// Checks the listing and returns the status it starts in.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<ItemStatus> {
        if self.name.trim().is_empty() {
            return Err(Error::MalformedPayload("item name must not be empty".into()));
        }
        if self.starting_price <= 0 {
            return Err(Error::InvalidAmount(format!(
                "starting price must be positive, got {}",
                self.starting_price
            )));
        }
        if self.end_time <= now {
            return Err(Error::MalformedPayload("end time must be in the future".into()));
        }
        let status = self.status.unwrap_or(ItemStatus::Draft);
        if !status.is_initial() {
            return Err(Error::MalformedPayload(format!(
                "items cannot be listed as {status}"
            )));
        }
        Ok(status)
    }
}

/// Admin status change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange<S> {
    pub status: S,
}

/// `GET /api/items` filter
#[derive(Debug, Default, Deserialize)]
pub struct ItemFilter {
    pub status: Option<ItemStatus>,
}
// endregion: --- Item

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn listing(status: Option<ItemStatus>) -> NewItem {
        NewItem {
            name: "Bluefin tuna, 40kg".into(),
            description: String::new(),
            starting_price: 1000,
            end_time: Utc::now() + Duration::hours(1),
            seller_id: 7,
            status,
        }
    }

    #[test]
    fn admin_transitions_follow_lifecycle() {
        assert!(ItemStatus::Draft.can_transition_to(ItemStatus::Open));
        assert!(ItemStatus::Open.can_transition_to(ItemStatus::Closed));
        assert!(ItemStatus::Closed.can_transition_to(ItemStatus::Sold));
        assert!(!ItemStatus::Closed.can_transition_to(ItemStatus::Open));
        assert!(!ItemStatus::Sold.can_transition_to(ItemStatus::Open));
        assert!(!ItemStatus::Open.can_transition_to(ItemStatus::Open));
    }

    #[test]
    fn status_round_trips_through_its_text_form() {
        for status in [
            ItemStatus::Draft,
            ItemStatus::Pending,
            ItemStatus::Open,
            ItemStatus::Closed,
            ItemStatus::Sold,
        ] {
            assert_eq!(status.as_str().parse::<ItemStatus>().unwrap(), status);
        }
        assert!("auctioning".parse::<ItemStatus>().is_err());
    }

    #[test]
    fn listing_defaults_to_draft() {
        assert_eq!(listing(None).validate(Utc::now()).unwrap(), ItemStatus::Draft);
        assert_eq!(
            listing(Some(ItemStatus::Open)).validate(Utc::now()).unwrap(),
            ItemStatus::Open
        );
    }

    #[test]
    fn listing_rejects_terminal_status_and_past_end_time() {
        assert!(listing(Some(ItemStatus::Sold)).validate(Utc::now()).is_err());

        let mut past = listing(None);
        past.end_time = Utc::now() - Duration::minutes(1);
        assert!(past.validate(Utc::now()).is_err());

        let mut free = listing(None);
        free.starting_price = 0;
        assert!(matches!(free.validate(Utc::now()), Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn only_open_items_expire() {
        let now = Utc::now();
        let mut item = Item {
            id: 1,
            name: "Oysters".into(),
            description: String::new(),
            starting_price: 100,
            current_price: 100,
            status: ItemStatus::Open,
            end_time: now,
            seller_id: 1,
            created_at: now,
        };
        assert!(item.is_expired(now));
        assert_eq!(
            item.clone().with_effective_status(now).status,
            ItemStatus::Closed
        );
        item.status = ItemStatus::Closed;
        assert!(!item.is_expired(now));
    }
}
// endregion: --- Tests
