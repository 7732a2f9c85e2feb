pub mod checker;
pub mod detector;
pub mod locks;

use std::sync::Arc;

use uuid::Uuid;

use crate::db::TrackingStore;
use crate::error::Result;
use crate::models::{ NotificationEvent, PriceObservation, Product, TrackedItem };

pub use checker::{ CycleReport, PriceChecker };
pub use detector::Outcome;
pub use locks::ItemLocks;

/// Applies price observations to tracked items under per-item locks.
#[derive(Clone)]
pub struct Tracker {
    store: Arc<dyn TrackingStore>,
    locks: ItemLocks,
}

impl Tracker {
    pub fn new(store: Arc<dyn TrackingStore>, locks: ItemLocks) -> Self {
        Self { store, locks }
    }

    pub fn store(&self) -> &Arc<dyn TrackingStore> {
        &self.store
    }

    #[cfg(test)]
    pub fn locks(&self) -> &ItemLocks {
        &self.locks
    }

    /// Record an observation and run it through every item tracking the product.
    pub async fn observe(
        &self,
        product: &Product,
        observation: PriceObservation
    ) -> Result<Vec<NotificationEvent>> {
        self.store.record_observation(&observation).await?;

        let items = self.store.tracked_items_for_product(product.id).await?;
        let mut events = Vec::new();

        for item in items {
            if let Some(event) = self.apply_to_item(item.id, product, &observation).await? {
                events.push(event);
            }
        }

        Ok(events)
    }

    /// Evaluate one item. The item is re-read inside its lock so concurrent
    /// callers always see each other's writes.
    pub async fn apply_to_item(
        &self,
        item_id: Uuid,
        product: &Product,
        observation: &PriceObservation
    ) -> Result<Option<NotificationEvent>> {
        let _guard = self.locks.acquire(item_id).await;

        let Some(mut item) = self.store.find_tracked_item(item_id).await? else {
            return Ok(None);
        };

        let outcome = detector::apply(&mut item, observation);
        if !outcome.changes_item() {
            tracing::debug!(item_id = %item.id, "ignoring stale observation");
            return Ok(None);
        }

        let event = match outcome {
            Outcome::Notify => Some(NotificationEvent::for_crossing(&item, product, observation)),
            _ => None,
        };

        self.store.save_tracked_item(&item, event.as_ref()).await?;

        match outcome {
            Outcome::Notify => {
                tracing::info!(
                    item_id = %item.id,
                    subscriber = item.subscriber_id,
                    price = %observation.price,
                    threshold = %item.threshold,
                    "price crossed below threshold"
                );
            }
            Outcome::Reset => {
                tracing::info!(item_id = %item.id, price = %observation.price, "price recovered above threshold");
            }
            _ => {}
        }

        Ok(event)
    }

    /// Insert a new item, then record the price seen at creation time. The
    /// observation seeds the new item and is applied to the product's other
    /// items like any polled price, so it can queue events for them.
    pub async fn start_item(
        &self,
        item: TrackedItem,
        product: &Product,
        observation: &PriceObservation
    ) -> Result<(TrackedItem, Vec<NotificationEvent>)> {
        self.store.insert_tracked_item(&item).await?;
        let events = self.observe(product, *observation).await?;

        let item = self.store.find_tracked_item(item.id).await?.unwrap_or(item);
        Ok((item, events))
    }

    /// Change an item's threshold under its lock, re-deriving its state silently.
    pub async fn update_threshold(
        &self,
        item_id: Uuid,
        threshold: sea_orm::prelude::Decimal
    ) -> Result<Option<TrackedItem>> {
        let _guard = self.locks.acquire(item_id).await;

        let Some(mut item) = self.store.find_tracked_item(item_id).await? else {
            return Ok(None);
        };

        detector::rethreshold(&mut item, threshold);
        self.store.save_tracked_item(&item, None).await?;
        Ok(Some(item))
    }

    pub async fn remove_item(&self, item_id: Uuid) -> Result<bool> {
        let removed = {
            let _guard = self.locks.acquire(item_id).await;
            self.store.delete_tracked_item(item_id).await?
        };
        self.locks.forget(item_id).await;
        Ok(removed)
    }
}
