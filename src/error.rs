// region:    --- Imports
use crate::auction::model::ItemStatus;
use crate::ordering::model::OrderStatus;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

// endregion: --- Imports

pub type Result<T> = std::result::Result<T, Error>;

// region:    --- Error
#[derive(Error, Debug)]
pub enum Error {
    #[error("item {0} not found")]
    ItemNotFound(i64),

    #[error("bid {0} not found")]
    BidNotFound(i64),

    #[error("order {0} not found")]
    OrderNotFound(i64),

    #[error("auction is not open (status: {0})")]
    AuctionNotOpen(ItemStatus),

    #[error("auction has already ended")]
    AuctionEnded,

    #[error("bid amount {bid_amount} must exceed the current price {current_price}")]
    BidTooLow { bid_amount: i64, current_price: i64 },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("cannot change item status from {from} to {to}")]
    InvalidItemTransition { from: ItemStatus, to: ItemStatus },

    #[error("cannot change order status from {from} to {to}")]
    InvalidOrderTransition { from: OrderStatus, to: OrderStatus },

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::ItemNotFound(_) | Error::BidNotFound(_) | Error::OrderNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Error::AuctionNotOpen(_)
            | Error::AuctionEnded
            | Error::BidTooLow { .. }
            | Error::InvalidAmount(_)
            | Error::InvalidItemTransition { .. }
            | Error::InvalidOrderTransition { .. }
            | Error::InvalidOrder(_)
            | Error::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            Error::Database(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine readable code sent next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            Error::ItemNotFound(_) => "ITEM_NOT_FOUND",
            Error::BidNotFound(_) => "BID_NOT_FOUND",
            Error::OrderNotFound(_) => "ORDER_NOT_FOUND",
            Error::AuctionNotOpen(_) => "AUCTION_NOT_OPEN",
            Error::AuctionEnded => "AUCTION_ENDED",
            Error::BidTooLow { .. } => "LOW_BID",
            Error::InvalidAmount(_) => "INVALID_AMOUNT",
            Error::InvalidItemTransition { .. } | Error::InvalidOrderTransition { .. } => {
                "INVALID_TRANSITION"
            }
            Error::InvalidOrder(_) => "INVALID_ORDER",
            Error::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            Error::Database(_) => "DATABASE_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{:<12} --> {}", "Error", self);
        }

        let mut body = serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        if let Error::BidTooLow { current_price, .. } = &self {
            body["currentPrice"] = serde_json::json!(current_price);
        }

        (status, Json(body)).into_response()
    }
}
// endregion: --- Error

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_rule_violations_are_client_errors() {
        assert_eq!(Error::AuctionEnded.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::AuctionNotOpen(ItemStatus::Closed).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::BidTooLow {
                bid_amount: 5,
                current_price: 10
            }
            .code(),
            "LOW_BID"
        );
    }

    #[test]
    fn missing_entities_map_to_not_found() {
        assert_eq!(Error::ItemNotFound(1).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(Error::BidNotFound(1).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(Error::OrderNotFound(1).status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn storage_failures_are_server_errors() {
        let err = Error::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "DATABASE_ERROR");
    }
}
// endregion: --- Tests
