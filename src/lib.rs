//! Seafood marketplace auction service.
//!
//! Sellers list lots, buyers bid on them and place orders. Bids are accepted
//! only when they beat the current price of an open, unexpired auction; the
//! check and the write are one atomic step in every store. Accepted bids are
//! broadcast to WebSocket clients (`newBid`) and, when configured, to Kafka.
//! A background sweep closes auctions once their end time passes.
pub mod auction;
pub mod bidding;
pub mod broadcast;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod ordering;
pub mod routes;
pub mod scheduler;
pub mod state;
pub mod store;
