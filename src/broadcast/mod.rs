//! Fire-and-forget delivery of auction events.
//!
//! Every sink implements [`Broadcaster`]; the service publishes through a
//! [`FanOut`] holding the WebSocket hub and, when configured, Kafka.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

mod kafka;
mod socket;

pub use kafka::KafkaBroadcaster;
pub use socket::{handle_socket, SocketHub};

// endregion: --- Imports

// region:    --- Broadcaster Trait
#[derive(Error, Debug)]
pub enum BroadcastError {
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("kafka delivery failed: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
}

#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), BroadcastError>;
}

/// Publishes to every sink; a failing sink is logged and skipped.
#[derive(Clone, Default)]
pub struct FanOut {
    sinks: Vec<Arc<dyn Broadcaster>>,
}

impl FanOut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn Broadcaster>) -> Self {
        self.sinks.push(sink);
        self
    }
}

#[async_trait]
impl Broadcaster for FanOut {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), BroadcastError> {
        for sink in &self.sinks {
            if let Err(e) = sink.publish(event).await {
                warn!(
                    "{:<12} --> {} for item {} not delivered: {}",
                    "Broadcast",
                    event.name(),
                    event.item_id(),
                    e
                );
            }
        }
        Ok(())
    }
}

/// Publish without letting delivery problems reach the caller.
pub async fn notify(broadcaster: &dyn Broadcaster, event: AuctionEvent) {
    if let Err(e) = broadcaster.publish(&event).await {
        warn!("{:<12} --> {} dropped: {}", "Broadcast", event.name(), e);
    }
}
// endregion: --- Broadcaster Trait

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl Broadcaster for Failing {
        async fn publish(&self, _event: &AuctionEvent) -> Result<(), BroadcastError> {
            Err(BroadcastError::Kafka(rdkafka::error::KafkaError::Canceled))
        }
    }

    #[tokio::test]
    async fn failing_sink_does_not_stop_the_others() {
        let hub = SocketHub::new(8);
        let mut rx = hub.subscribe();
        let fan_out = FanOut::new()
            .with(Arc::new(Failing))
            .with(Arc::new(hub.clone()));

        let event = AuctionEvent::BidPlaced {
            item_id: 1,
            user_id: 2,
            bid_amount: 300,
        };
        fan_out.publish(&event).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), event);
    }
}
// endregion: --- Tests
