use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    NotificationEvent,
    PriceObservation,
    Product,
    ProductListing,
    Subscriber,
    TrackedItem,
};

pub mod entity;

mod tracking_repository;
pub use tracking_repository::TrackingRepository;

#[cfg(test)]
pub mod memory;

/// Persistence seam for subscribers, products, tracked items, price history
/// and the notification outbox.
#[async_trait]
pub trait TrackingStore: Send + Sync {
    /// Insert or refresh a subscriber's profile.
    async fn upsert_subscriber(&self, subscriber: Subscriber) -> Result<Subscriber>;

    async fn find_subscriber(&self, chat_id: i64) -> Result<Option<Subscriber>>;

    /// Insert a product, or refresh name/seller/sku of the one with the same URL.
    async fn upsert_product(&self, listing: &ProductListing) -> Result<Product>;

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>>;

    /// Products with at least one tracked item.
    async fn tracked_products(&self) -> Result<Vec<Product>>;

    async fn insert_tracked_item(&self, item: &TrackedItem) -> Result<()>;

    async fn find_tracked_item(&self, id: Uuid) -> Result<Option<TrackedItem>>;

    async fn find_tracked_item_for(
        &self,
        subscriber_id: i64,
        product_id: Uuid
    ) -> Result<Option<TrackedItem>>;

    async fn tracked_items_for_product(&self, product_id: Uuid) -> Result<Vec<TrackedItem>>;

    async fn tracked_items_for_subscriber(&self, subscriber_id: i64) -> Result<Vec<TrackedItem>>;

    /// Persist an item's state and, in the same transaction, queue its event.
    async fn save_tracked_item(
        &self,
        item: &TrackedItem,
        event: Option<&NotificationEvent>
    ) -> Result<()>;

    /// Returns `false` when no such item existed.
    async fn delete_tracked_item(&self, id: Uuid) -> Result<bool>;

    /// Append to the price history and update the product's last price.
    async fn record_observation(&self, observation: &PriceObservation) -> Result<()>;

    /// Oldest first.
    async fn price_history(&self, product_id: Uuid) -> Result<Vec<PriceObservation>>;

    /// Oldest pending events first.
    async fn pending_events(&self, limit: u64) -> Result<Vec<NotificationEvent>>;

    /// Store delivery status, attempt count and last error of an event.
    async fn update_event(&self, event: &NotificationEvent) -> Result<()>;
}
