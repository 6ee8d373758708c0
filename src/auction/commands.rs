/// Item commands and queries
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::auction::model::{Item, ItemStatus, NewItem};
use crate::broadcast::{notify, Broadcaster};
use crate::error::Result;
use crate::store::MarketStore;
use chrono::Utc;
use tracing::info;
// endregion: --- Imports

// region:    --- Commands
pub async fn handle_create_item(item: NewItem, store: &dyn MarketStore) -> Result<Item> {
    info!("{:<12} --> Listing item: {}", "Command", item.name);
    let now = Utc::now();
    let status = item.validate(now)?;
    store.create_item(item, status, now).await
}

pub async fn handle_change_item_status(
    item_id: i64,
    status: ItemStatus,
    store: &dyn MarketStore,
    broadcaster: &dyn Broadcaster,
) -> Result<Item> {
    info!(
        "{:<12} --> Changing item {} status to {}",
        "Command", item_id, status
    );
    let item = store.update_item_status(item_id, status).await?;

    notify(
        broadcaster,
        AuctionEvent::ItemStatusChanged {
            item_id: item.id,
            status: item.status,
        },
    )
    .await;

    Ok(item)
}

pub async fn handle_delete_item(item_id: i64, store: &dyn MarketStore) -> Result<Item> {
    info!("{:<12} --> Deleting item id: {}", "Command", item_id);
    store.delete_item(item_id).await
}
// endregion: --- Commands

// region:    --- Queries
/// Item with its effective status
pub async fn get_item(item_id: i64, store: &dyn MarketStore) -> Result<Item> {
    info!("{:<12} --> Item id: {}", "Query", item_id);
    let item = store.get_item(item_id).await?;
    Ok(item.with_effective_status(Utc::now()))
}

/// Items newest first, filtered on their effective status
pub async fn list_items(status: Option<ItemStatus>, store: &dyn MarketStore) -> Result<Vec<Item>> {
    info!("{:<12} --> Items (status: {:?})", "Query", status);
    let now = Utc::now();
    // expired open rows read as closed, so they must be fetched too
    let stored = match status {
        Some(ItemStatus::Closed) => None,
        other => other,
    };
    Ok(store
        .list_items(stored)
        .await?
        .into_iter()
        .map(|item| item.with_effective_status(now))
        .filter(|item| status.map_or(true, |s| item.status == s))
        .collect())
}
// endregion: --- Queries
