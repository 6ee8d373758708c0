//! Bid acceptance rules.
//!
//! Stores evaluate these while holding whatever makes the check-and-insert
//! atomic (a row lock or the in-memory mutex), so the item passed in is the
//! state the bid will be written against.
use crate::auction::model::{Item, ItemStatus};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};

/// Rejects non-positive amounts before storage is touched.
pub fn check_amount(bid_amount: i64) -> Result<()> {
    if bid_amount <= 0 {
        return Err(Error::InvalidAmount(format!(
            "bid amount must be positive, got {bid_amount}"
        )));
    }
    Ok(())
}

/// Checked in order: status, end time, amount.
pub fn check_bid(item: &Item, bid_amount: i64, now: DateTime<Utc>) -> Result<()> {
    if item.status != ItemStatus::Open {
        return Err(Error::AuctionNotOpen(item.status));
    }
    if now >= item.end_time {
        return Err(Error::AuctionEnded);
    }
    if bid_amount <= item.current_price {
        return Err(Error::BidTooLow {
            bid_amount,
            current_price: item.current_price,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn open_item(current_price: i64) -> Item {
        let now = Utc::now();
        Item {
            id: 1,
            name: "King crab".into(),
            description: "Live, 2kg".into(),
            starting_price: 1000,
            current_price,
            status: ItemStatus::Open,
            end_time: now + Duration::hours(1),
            seller_id: 5,
            created_at: now,
        }
    }

    #[test]
    fn accepts_bid_above_current_price() {
        assert!(check_bid(&open_item(1000), 1001, Utc::now()).is_ok());
    }

    #[test]
    fn rejects_bid_equal_to_current_price() {
        let err = check_bid(&open_item(1000), 1000, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            Error::BidTooLow {
                bid_amount: 1000,
                current_price: 1000
            }
        ));
    }

    #[test]
    fn rejects_bid_on_item_that_is_not_open() {
        for status in [
            ItemStatus::Draft,
            ItemStatus::Pending,
            ItemStatus::Closed,
            ItemStatus::Sold,
        ] {
            let mut item = open_item(1000);
            item.status = status;
            assert!(matches!(
                check_bid(&item, 5000, Utc::now()),
                Err(Error::AuctionNotOpen(s)) if s == status
            ));
        }
    }

    #[test]
    fn rejects_bid_after_end_time() {
        let item = open_item(1000);
        let late = item.end_time + Duration::seconds(1);
        assert!(matches!(check_bid(&item, 5000, late), Err(Error::AuctionEnded)));
        assert!(matches!(
            check_bid(&item, 5000, item.end_time),
            Err(Error::AuctionEnded)
        ));
    }

    #[test]
    fn status_is_checked_before_amount() {
        let mut item = open_item(1000);
        item.status = ItemStatus::Closed;
        assert!(matches!(
            check_bid(&item, 1, Utc::now()),
            Err(Error::AuctionNotOpen(_))
        ));
    }

    #[test]
    fn non_positive_amounts_are_invalid() {
        assert!(check_amount(1).is_ok());
        assert!(matches!(check_amount(0), Err(Error::InvalidAmount(_))));
        assert!(matches!(check_amount(-50), Err(Error::InvalidAmount(_))));
    }
}
