use crate::broadcast::{Broadcaster, FanOut, SocketHub};
use crate::store::MarketStore;
use std::sync::Arc;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MarketStore>,
    pub broadcaster: Arc<dyn Broadcaster>,
    pub hub: SocketHub,
}

impl AppState {
    pub fn new(store: Arc<dyn MarketStore>, broadcaster: Arc<dyn Broadcaster>, hub: SocketHub) -> Self {
        Self {
            store,
            broadcaster,
            hub,
        }
    }

    /// State whose only sink is the WebSocket hub.
    pub fn with_socket_hub(store: Arc<dyn MarketStore>, hub: SocketHub) -> Self {
        let broadcaster = Arc::new(FanOut::new().with(Arc::new(hub.clone())));
        Self::new(store, broadcaster, hub)
    }
}
