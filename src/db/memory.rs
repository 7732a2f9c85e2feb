use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::TrackingStore;
use crate::enums::DeliveryStatus;
use crate::error::{ AppError, Result };
use crate::models::{
    NotificationEvent,
    PriceObservation,
    Product,
    ProductListing,
    Subscriber,
    TrackedItem,
};

#[derive(Default)]
struct Tables {
    subscribers: HashMap<i64, Subscriber>,
    products: Vec<Product>,
    items: Vec<TrackedItem>,
    observations: Vec<PriceObservation>,
    events: Vec<NotificationEvent>,
}

/// In-process store used by unit tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<NotificationEvent> {
        self.tables.read().await.events.clone()
    }

    pub async fn item(&self, id: Uuid) -> Option<TrackedItem> {
        self.tables
            .read().await
            .items.iter()
            .find(|i| i.id == id)
            .cloned()
    }
}

#[async_trait]
impl TrackingStore for MemoryStore {
    async fn upsert_subscriber(&self, subscriber: Subscriber) -> Result<Subscriber> {
        let mut tables = self.tables.write().await;
        tables.subscribers.insert(subscriber.chat_id, subscriber.clone());
        Ok(subscriber)
    }

    async fn find_subscriber(&self, chat_id: i64) -> Result<Option<Subscriber>> {
        Ok(self.tables.read().await.subscribers.get(&chat_id).cloned())
    }

    async fn upsert_product(&self, listing: &ProductListing) -> Result<Product> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.products.iter_mut().find(|p| p.url == listing.url) {
            existing.name = listing.name.clone();
            existing.seller = listing.seller.clone();
            if !listing.sku.is_empty() {
                existing.sku = listing.sku.clone();
            }
            return Ok(existing.clone());
        }

        let product = Product {
            id: Uuid::new_v4(),
            url: listing.url.clone(),
            sku: listing.sku.clone(),
            name: listing.name.clone(),
            seller: listing.seller.clone(),
            last_price: None,
            last_checked_at: None,
        };
        tables.products.push(product.clone());
        Ok(product)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(
            self.tables
                .read().await
                .products.iter()
                .find(|p| p.id == id)
                .cloned()
        )
    }

    async fn tracked_products(&self) -> Result<Vec<Product>> {
        let tables = self.tables.read().await;
        Ok(
            tables.products
                .iter()
                .filter(|p| tables.items.iter().any(|i| i.product_id == p.id))
                .cloned()
                .collect()
        )
    }

    async fn insert_tracked_item(&self, item: &TrackedItem) -> Result<()> {
        let mut tables = self.tables.write().await;
        let duplicate = tables.items
            .iter()
            .any(|i| i.subscriber_id == item.subscriber_id && i.product_id == item.product_id);
        if duplicate {
            return Err(AppError::InvalidInput("already tracking this product".to_string()));
        }
        tables.items.push(item.clone());
        Ok(())
    }

    async fn find_tracked_item(&self, id: Uuid) -> Result<Option<TrackedItem>> {
        Ok(self.item(id).await)
    }

    async fn find_tracked_item_for(
        &self,
        subscriber_id: i64,
        product_id: Uuid
    ) -> Result<Option<TrackedItem>> {
        Ok(
            self.tables
                .read().await
                .items.iter()
                .find(|i| i.subscriber_id == subscriber_id && i.product_id == product_id)
                .cloned()
        )
    }

    async fn tracked_items_for_product(&self, product_id: Uuid) -> Result<Vec<TrackedItem>> {
        Ok(
            self.tables
                .read().await
                .items.iter()
                .filter(|i| i.product_id == product_id)
                .cloned()
                .collect()
        )
    }

    async fn tracked_items_for_subscriber(&self, subscriber_id: i64) -> Result<Vec<TrackedItem>> {
        Ok(
            self.tables
                .read().await
                .items.iter()
                .filter(|i| i.subscriber_id == subscriber_id)
                .cloned()
                .collect()
        )
    }

    async fn save_tracked_item(
        &self,
        item: &TrackedItem,
        event: Option<&NotificationEvent>
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        let slot = tables.items
            .iter_mut()
            .find(|i| i.id == item.id)
            .ok_or_else(|| AppError::NotFound(format!("tracked item {}", item.id)))?;
        *slot = item.clone();
        if let Some(event) = event {
            tables.events.push(event.clone());
        }
        Ok(())
    }

    async fn delete_tracked_item(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.items.len();
        tables.items.retain(|i| i.id != id);
        Ok(tables.items.len() != before)
    }

    async fn record_observation(&self, observation: &PriceObservation) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.observations.push(*observation);
        if let Some(product) = tables.products.iter_mut().find(|p| p.id == observation.product_id) {
            product.last_price = Some(observation.price);
            product.last_checked_at = Some(observation.observed_at);
        }
        Ok(())
    }

    async fn price_history(&self, product_id: Uuid) -> Result<Vec<PriceObservation>> {
        let mut history: Vec<PriceObservation> = self.tables
            .read().await
            .observations.iter()
            .filter(|o| o.product_id == product_id)
            .copied()
            .collect();
        history.sort_by_key(|o| o.observed_at);
        Ok(history)
    }

    async fn pending_events(&self, limit: u64) -> Result<Vec<NotificationEvent>> {
        Ok(
            self.tables
                .read().await
                .events.iter()
                .filter(|e| e.status == DeliveryStatus::Pending)
                .take(limit as usize)
                .cloned()
                .collect()
        )
    }

    async fn update_event(&self, event: &NotificationEvent) -> Result<()> {
        let mut tables = self.tables.write().await;
        let slot = tables.events
            .iter_mut()
            .find(|e| e.id == event.id)
            .ok_or_else(|| AppError::NotFound(format!("event {}", event.id)))?;
        *slot = event.clone();
        Ok(())
    }
}
