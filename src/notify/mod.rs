pub mod telegram;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{ interval, Duration, MissedTickBehavior };

use crate::db::TrackingStore;
use crate::enums::DeliveryStatus;
use crate::error::Result;
use crate::models::NotificationEvent;

pub use telegram::TelegramNotifier;

/// Delivers a rendered message to a subscriber's chat.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, chat_id: i64, text: &str) -> Result<()>;
}

pub fn format_message(event: &NotificationEvent) -> String {
    let seller = if event.seller.is_empty() { "unknown" } else { event.seller.as_str() };

    format!(
        "📉 Price dropped below your threshold!\n\n\
        {name}\n\
        Current price: {price}\n\
        Tracking price: {threshold}\n\
        Seller: {seller}\n\n\
        {url}",
        name = event.product_name,
        price = event.price,
        threshold = event.threshold,
        seller = seller,
        url = event.product_url
    )
}

/// Drains the outbox of pending notification events.
///
/// A failed delivery leaves the event pending with its attempt counter bumped
/// so the next flush retries it. Once `max_attempts` is reached the event is
/// marked failed. The tracked item's notified state is never touched here.
pub struct NotificationDispatcher {
    store: Arc<dyn TrackingStore>,
    notifier: Arc<dyn Notifier>,
    max_attempts: u32,
    batch_size: u64,
    flushing: Mutex<()>,
}

impl NotificationDispatcher {
    pub fn new(
        store: Arc<dyn TrackingStore>,
        notifier: Arc<dyn Notifier>,
        max_attempts: u32,
        batch_size: u64
    ) -> Self {
        Self {
            store,
            notifier,
            max_attempts: max_attempts.max(1),
            batch_size: batch_size.max(1),
            flushing: Mutex::new(()),
        }
    }

    /// Flush on a fixed interval, independent of the price checker's cycle.
    pub async fn start(self: Arc<Self>, every: Duration) {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(interval_secs = every.as_secs(), "notification dispatcher started");

        loop {
            ticker.tick().await;

            match self.flush_pending().await {
                Ok(0) => {}
                Ok(delivered) => tracing::info!(delivered, "notification outbox flushed"),
                Err(e) => tracing::error!(error = %e, "notification outbox flush failed"),
            }
        }
    }

    /// Try every pending event once. Returns how many were delivered.
    ///
    /// Flushes are serialized so an event is never sent twice by overlapping
    /// callers.
    pub async fn flush_pending(&self) -> Result<usize> {
        let _flushing = self.flushing.lock().await;
        let events = self.store.pending_events(self.batch_size).await?;
        let mut delivered = 0;

        for mut event in events {
            match self.notifier.deliver(event.subscriber_id, &format_message(&event)).await {
                Ok(()) => {
                    event.status = DeliveryStatus::Delivered;
                    event.attempts += 1;
                    event.last_error = None;
                    delivered += 1;
                    tracing::info!(
                        event_id = %event.id,
                        chat_id = event.subscriber_id,
                        "notification delivered"
                    );
                }
                Err(e) => {
                    event.attempts += 1;
                    event.last_error = Some(e.to_string());
                    if event.attempts >= self.max_attempts {
                        event.status = DeliveryStatus::Failed;
                        tracing::error!(
                            event_id = %event.id,
                            chat_id = event.subscriber_id,
                            attempts = event.attempts,
                            error = %e,
                            "giving up on notification"
                        );
                    } else {
                        tracing::warn!(
                            event_id = %event.id,
                            chat_id = event.subscriber_id,
                            attempts = event.attempts,
                            error = %e,
                            "notification delivery failed, will retry"
                        );
                    }
                }
            }

            self.store.update_event(&event).await?;
        }

        Ok(delivered)
    }
}
