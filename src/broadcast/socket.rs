// region:    --- Imports
use super::{BroadcastError, Broadcaster};
use crate::auction::events::AuctionEvent;
use crate::state::AppState;
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

// endregion: --- Imports

// region:    --- Socket Hub
/// In-process fan-out to connected WebSocket clients.
///
/// Slow clients that fall more than `capacity` events behind skip the
/// missed events; nothing is acknowledged or retried.
#[derive(Clone)]
pub struct SocketHub {
    sender: broadcast::Sender<AuctionEvent>,
}

impl SocketHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuctionEvent> {
        self.sender.subscribe()
    }

    pub fn client_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl Broadcaster for SocketHub {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), BroadcastError> {
        // no connected clients is not an error
        let delivered = self.sender.send(event.clone()).unwrap_or(0);
        debug!(
            "{:<12} --> {} sent to {} client(s)",
            "Socket",
            event.name(),
            delivered
        );
        Ok(())
    }
}
// endregion: --- Socket Hub

// region:    --- WebSocket Handler
/// `GET /socket`
pub async fn handle_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let events = state.hub.subscribe();
    ws.on_upgrade(move |socket| relay_events(socket, events))
}

async fn relay_events(mut socket: WebSocket, mut events: broadcast::Receiver<AuctionEvent>) {
    info!("{:<12} --> Client connected", "Socket");
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("{:<12} --> Failed to encode {}: {}", "Socket", event.name(), e);
                            continue;
                        }
                    };
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("{:<12} --> Client lagging, skipped {} event(s)", "Socket", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // clients only listen
                Some(Ok(_)) => {}
            },
        }
    }
    info!("{:<12} --> Client disconnected", "Socket");
}
// endregion: --- WebSocket Handler

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publishing_without_clients_succeeds() {
        let hub = SocketHub::new(4);
        let event = AuctionEvent::BidPlaced {
            item_id: 1,
            user_id: 1,
            bid_amount: 10,
        };
        assert!(hub.publish(&event).await.is_ok());
        assert_eq!(hub.client_count(), 0);
    }

    #[tokio::test]
    async fn every_subscriber_receives_the_event() {
        let hub = SocketHub::new(4);
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();
        let event = AuctionEvent::AuctionClosed {
            item_id: 5,
            final_price: 900,
            winner_id: Some(3),
        };

        hub.publish(&event).await.unwrap();

        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }
}
