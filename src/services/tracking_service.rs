use std::sync::Arc;

use sea_orm::prelude::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::db::TrackingStore;
use crate::enums::AlertState;
use crate::error::{ AppError, Result };
use crate::models::{ validate_threshold, PriceObservation, Product, Subscriber, TrackedItem };
use crate::notify::NotificationDispatcher;
use crate::scraper::{ PriceSource, ProductRef };
use crate::tracker::Tracker;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrackedProductResponse {
    pub product_id: Uuid,
    pub url: String,
    pub sku: String,
    pub name: String,
    pub seller: String,
    pub price: Option<String>,
    pub tracking_price: String,
    pub state: AlertState,
}

impl TrackedProductResponse {
    fn from_parts(product: &Product, item: &TrackedItem) -> Self {
        Self {
            product_id: product.id,
            url: product.url.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            seller: product.seller.clone(),
            price: item.last_price.or(product.last_price).map(|p| p.to_string()),
            tracking_price: item.threshold.to_string(),
            state: item.state,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriberResponse {
    pub chat_id: i64,
    pub name: String,
    pub username: String,
    pub products: Vec<TrackedProductResponse>,
}

/// User-facing tracking operations shared by the HTTP API and the bot.
pub struct TrackingService {
    tracker: Tracker,
    source: Arc<dyn PriceSource>,
    default_threshold_ratio: Decimal,
    dispatcher: Option<Arc<NotificationDispatcher>>,
}

impl TrackingService {
    pub fn new(tracker: Tracker, source: Arc<dyn PriceSource>, default_threshold_ratio: Decimal) -> Self {
        Self {
            tracker,
            source,
            default_threshold_ratio,
            dispatcher: None,
        }
    }

    /// Deliver events queued while starting an item right away.
    pub fn with_dispatcher(mut self, dispatcher: Arc<NotificationDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    fn store(&self) -> &Arc<dyn TrackingStore> {
        self.tracker.store()
    }

    pub async fn register_subscriber(&self, subscriber: Subscriber) -> Result<Subscriber> {
        let saved = self.store().upsert_subscriber(subscriber).await?;
        tracing::info!(chat_id = saved.chat_id, "subscriber registered");
        Ok(saved)
    }

    pub async fn subscriber_overview(&self, chat_id: i64) -> Result<SubscriberResponse> {
        let subscriber = self
            .store()
            .find_subscriber(chat_id).await?
            .ok_or_else(|| AppError::NotFound(format!("subscriber {}", chat_id)))?;

        Ok(SubscriberResponse {
            chat_id: subscriber.chat_id,
            name: subscriber.name,
            username: subscriber.username,
            products: self.tracked_products(chat_id).await?,
        })
    }

    pub async fn tracked_products(&self, chat_id: i64) -> Result<Vec<TrackedProductResponse>> {
        let items = self.store().tracked_items_for_subscriber(chat_id).await?;
        let mut products = Vec::with_capacity(items.len());

        for item in items {
            if let Some(product) = self.store().find_product(item.product_id).await? {
                products.push(TrackedProductResponse::from_parts(&product, &item));
            }
        }

        Ok(products)
    }

    /// Scrape the product, store it and start tracking it for `chat_id`.
    ///
    /// Without an explicit threshold the item tracks a drop below
    /// `default_threshold_ratio` of the current price.
    pub async fn start_tracking(
        &self,
        chat_id: i64,
        target: ProductRef,
        threshold: Option<Decimal>
    ) -> Result<TrackedProductResponse> {
        let threshold = threshold.map(validate_threshold).transpose()?;

        if self.store().find_subscriber(chat_id).await?.is_none() {
            self.store().upsert_subscriber(Subscriber {
                chat_id,
                name: String::new(),
                username: String::new(),
            }).await?;
        }

        let listing = self.source.fetch_listing(&target).await?;
        let product = self.store().upsert_product(&listing).await?;

        if self.store().find_tracked_item_for(chat_id, product.id).await?.is_some() {
            return Err(AppError::InvalidInput(format!("already tracking {}", product.url)));
        }

        let threshold = match threshold {
            Some(threshold) => threshold,
            None => validate_threshold(listing.price * self.default_threshold_ratio)?,
        };

        let observation = PriceObservation::now(product.id, listing.price);
        let item = TrackedItem::new(chat_id, product.id, threshold)?;
        let (item, events) = self.tracker.start_item(item, &product, &observation).await?;

        tracing::info!(
            chat_id,
            product_id = %product.id,
            threshold = %item.threshold,
            price = %listing.price,
            "tracking started"
        );

        // The creation-time price may have crossed other subscribers' thresholds.
        if !events.is_empty() {
            if let Some(dispatcher) = &self.dispatcher {
                if let Err(e) = dispatcher.flush_pending().await {
                    tracing::warn!(error = %e, events = events.len(), "could not flush new notifications");
                }
            }
        }

        let product = self.store().find_product(product.id).await?.unwrap_or(product);
        Ok(TrackedProductResponse::from_parts(&product, &item))
    }

    pub async fn update_threshold(
        &self,
        chat_id: i64,
        product_id: Uuid,
        threshold: Decimal
    ) -> Result<TrackedProductResponse> {
        let threshold = validate_threshold(threshold)?;
        let (product, item) = self.tracked_pair(chat_id, product_id).await?;

        let item = self.tracker
            .update_threshold(item.id, threshold).await?
            .ok_or_else(|| AppError::NotFound(format!("product {} is not tracked", product_id)))?;

        tracing::info!(chat_id, %product_id, threshold = %item.threshold, "threshold updated");
        Ok(TrackedProductResponse::from_parts(&product, &item))
    }

    pub async fn stop_tracking(&self, chat_id: i64, product_id: Uuid) -> Result<()> {
        let (_, item) = self.tracked_pair(chat_id, product_id).await?;

        if !self.tracker.remove_item(item.id).await? {
            return Err(AppError::NotFound(format!("product {} is not tracked", product_id)));
        }

        tracing::info!(chat_id, %product_id, "tracking stopped");
        Ok(())
    }

    /// Observed prices for a product, oldest first, as `(epoch seconds, price)`.
    pub async fn price_history(&self, product_id: Uuid) -> Result<Vec<(i64, String)>> {
        if self.store().find_product(product_id).await?.is_none() {
            return Err(AppError::NotFound(format!("product {}", product_id)));
        }

        let history = self.store().price_history(product_id).await?;
        Ok(
            history
                .into_iter()
                .map(|o| (o.observed_at.timestamp(), o.price.to_string()))
                .collect()
        )
    }

    async fn tracked_pair(&self, chat_id: i64, product_id: Uuid) -> Result<(Product, TrackedItem)> {
        let not_tracked = || AppError::NotFound(format!("product {} is not tracked", product_id));

        let item = self.store().find_tracked_item_for(chat_id, product_id).await?.ok_or_else(not_tracked)?;
        let product = self.store().find_product(product_id).await?.ok_or_else(not_tracked)?;
        Ok((product, item))
    }
}
