use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// region:    --- Order Status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Admin/driver transitions. Shipped orders can no longer be cancelled.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Shipped)
                | (Confirmed, Cancelled)
                | (Shipped, Delivered)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(Error::Internal(format!("unknown order status '{other}'"))),
        }
    }
}
// endregion: --- Order Status

// region:    --- Order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub item_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub buyer_id: i64,
    pub items: Vec<OrderLine>,
    pub total_price: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order request (`POST /api/orders`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub buyer_id: i64,
    pub items: Vec<OrderLine>,
}

impl NewOrder {
    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(Error::InvalidOrder("an order needs at least one item".into()));
        }
        if let Some(line) = self.items.iter().find(|line| line.quantity <= 0) {
            return Err(Error::InvalidOrder(format!(
                "quantity for item {} must be positive, got {}",
                line.item_id, line.quantity
            )));
        }
        Ok(())
    }
}

/// Sums `price × quantity` over the lines, pricing each through `price_of`.
pub fn total_price<F>(lines: &[OrderLine], mut price_of: F) -> Result<i64>
where
    F: FnMut(i64) -> Result<i64>,
{
    lines.iter().try_fold(0i64, |total, line| {
        let line_total = price_of(line.item_id)?
            .checked_mul(i64::from(line.quantity))
            .ok_or_else(|| Error::InvalidOrder("order total overflows".into()))?;
        total
            .checked_add(line_total)
            .ok_or_else(|| Error::InvalidOrder("order total overflows".into()))
    })
}

/// `GET /api/orders` filter
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    pub buyer_id: Option<i64>,
}
// endregion: --- Order

// endregion: --- Tests
