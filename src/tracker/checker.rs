use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{ interval, Duration, MissedTickBehavior };

use crate::error::{ AppError, Result };
use crate::models::{ PriceObservation, Product };
use crate::notify::NotificationDispatcher;
use crate::scraper::PriceSource;

use super::Tracker;

/// Counters for one polling cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub products_checked: usize,
    pub observations: usize,
    pub failures: usize,
    pub events: usize,
    pub delivered: usize,
}

/// Background poller: scrapes every tracked product once per cycle and feeds
/// the prices to the tracker, then flushes the notification outbox.
pub struct PriceChecker {
    tracker: Tracker,
    source: Arc<dyn PriceSource>,
    dispatcher: Arc<NotificationDispatcher>,
    poll_interval: Duration,
    scrape_timeout: Duration,
    max_concurrent: usize,
}

impl PriceChecker {
    pub fn new(
        tracker: Tracker,
        source: Arc<dyn PriceSource>,
        dispatcher: Arc<NotificationDispatcher>,
        poll_interval: Duration,
        scrape_timeout: Duration,
        max_concurrent: usize
    ) -> Self {
        Self {
            tracker,
            source,
            dispatcher,
            poll_interval,
            scrape_timeout,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Run cycles forever. A slow cycle delays the next tick instead of
    /// stacking up missed ones.
    pub async fn start(self) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(interval_secs = self.poll_interval.as_secs(), "price checker started");

        loop {
            ticker.tick().await;

            match self.run_cycle().await {
                Ok(report) => {
                    tracing::info!(
                        products = report.products_checked,
                        observations = report.observations,
                        failures = report.failures,
                        events = report.events,
                        delivered = report.delivered,
                        "price check cycle finished"
                    );
                }
                Err(e) => tracing::error!(error = %e, "price check cycle failed"),
            }
        }
    }

    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let products = self.tracker.store().tracked_products().await?;
        let mut report = CycleReport {
            products_checked: products.len(),
            ..Default::default()
        };

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for product in products {
            let semaphore = semaphore.clone();
            let source = self.source.clone();
            let tracker = self.tracker.clone();
            let timeout = self.scrape_timeout;

            tasks.spawn(async move {
                let product_id = product.id;
                let result = check_product(semaphore, source, tracker, product, timeout).await;
                (product_id, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(events))) => {
                    report.observations += 1;
                    report.events += events;
                }
                Ok((product_id, Err(e))) => {
                    report.failures += 1;
                    if e.is_transient() {
                        tracing::warn!(%product_id, error = %e, "price check failed");
                    } else {
                        tracing::error!(%product_id, error = %e, "price check failed");
                    }
                }
                Err(e) => {
                    report.failures += 1;
                    tracing::error!(error = %e, "price check task panicked");
                }
            }
        }

        // Also picks up events left pending by earlier cycles.
        report.delivered = self.dispatcher.flush_pending().await?;

        Ok(report)
    }
}

async fn check_product(
    semaphore: Arc<Semaphore>,
    source: Arc<dyn PriceSource>,
    tracker: Tracker,
    product: Product,
    timeout: Duration
) -> Result<usize> {
    let _permit = semaphore.acquire_owned().await.map_err(|e| AppError::Internal(e.to_string()))?;

    let price = match tokio::time::timeout(timeout, source.fetch_price(&product)).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(AppError::ScrapeTimeout(timeout.as_secs()));
        }
    };

    tracing::debug!(product_id = %product.id, %price, "price fetched");

    let events = tracker.observe(&product, PriceObservation::now(product.id, price)).await?;
    Ok(events.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::TrackingStore;
    use crate::enums::{ AlertState, DeliveryStatus };
    use crate::models::{ ProductListing, TrackedItem };
    use crate::notify::testing::RecordingNotifier;
    use crate::scraper::testing::{ Scripted, ScriptedSource };
    use crate::tracker::ItemLocks;
    use sea_orm::prelude::Decimal;

    struct Fixture {
        store: Arc<MemoryStore>,
        source: Arc<ScriptedSource>,
        notifier: Arc<RecordingNotifier>,
        checker: PriceChecker,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let source = Arc::new(ScriptedSource::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let dispatcher = Arc::new(
            NotificationDispatcher::new(store.clone(), notifier.clone(), 3, 50)
        );
        let checker = PriceChecker::new(
            Tracker::new(store.clone(), ItemLocks::new()),
            source.clone(),
            dispatcher,
            Duration::from_secs(60),
            Duration::from_millis(50),
            2
        );
        Fixture { store, source, notifier, checker }
    }

    async fn track(store: &MemoryStore, url: &str, chat_id: i64, threshold: i64) -> TrackedItem {
        let product = store
            .upsert_product(
                &(ProductListing {
                    url: url.to_string(),
                    sku: String::new(),
                    name: url.to_string(),
                    seller: "Shop".to_string(),
                    price: Decimal::new(threshold * 2, 0),
                })
            ).await
            .unwrap();
        let item = TrackedItem::new(chat_id, product.id, Decimal::new(threshold, 0)).unwrap();
        store.insert_tracked_item(&item).await.unwrap();
        item
    }

    #[tokio::test]
    async fn test_cycle_notifies_on_drop_only() {
        let fx = fixture();
        let item = track(&fx.store, "https://shop.test/a", 1, 1000).await;
        fx.source.set("https://shop.test/a", "A", Scripted::Price(Decimal::new(1200, 0)));

        let first = fx.checker.run_cycle().await.unwrap();
        assert_eq!(first.observations, 1);
        assert_eq!(first.events, 0);

        fx.source.set("https://shop.test/a", "A", Scripted::Price(Decimal::new(950, 0)));
        let second = fx.checker.run_cycle().await.unwrap();
        assert_eq!(second.events, 1);
        assert_eq!(second.delivered, 1);

        let third = fx.checker.run_cycle().await.unwrap();
        assert_eq!(third.events, 0);

        assert_eq!(fx.notifier.sent.lock().await.len(), 1);
        assert_eq!(fx.store.item(item.id).await.unwrap().state, AlertState::BelowThresholdNotified);
        assert_eq!(fx.store.events().await[0].status, DeliveryStatus::Delivered);
    }

    #[tokio::test]
    async fn test_failures_and_timeouts_are_isolated() {
        let fx = fixture();
        let ok = track(&fx.store, "https://shop.test/ok", 1, 1000).await;
        let broken = track(&fx.store, "https://shop.test/broken", 2, 1000).await;
        let slow = track(&fx.store, "https://shop.test/slow", 3, 1000).await;

        fx.source.set("https://shop.test/ok", "ok", Scripted::Price(Decimal::new(1500, 0)));
        fx.source.set("https://shop.test/broken", "broken", Scripted::Fail);
        fx.source.set("https://shop.test/slow", "slow", Scripted::Hang);

        let report = fx.checker.run_cycle().await.unwrap();

        assert_eq!(report.products_checked, 3);
        assert_eq!(report.observations, 1);
        assert_eq!(report.failures, 2);

        assert_eq!(fx.store.item(ok.id).await.unwrap().last_price, Some(Decimal::new(1500, 0)));
        for id in [broken.id, slow.id] {
            let item = fx.store.item(id).await.unwrap();
            assert_eq!(item.last_price, None);
            assert_eq!(item.state, AlertState::AboveThreshold);
        }
    }

    #[tokio::test]
    async fn test_failed_scrape_keeps_notified_state() {
        let fx = fixture();
        let url = "https://shop.test/drop";
        let item = track(&fx.store, url, 1, 1000).await;

        fx.source.set(url, "drop", Scripted::Price(Decimal::new(1200, 0)));
        fx.checker.run_cycle().await.unwrap();
        fx.source.set(url, "drop", Scripted::Price(Decimal::new(900, 0)));
        assert_eq!(fx.checker.run_cycle().await.unwrap().events, 1);

        fx.source.set(url, "drop", Scripted::Fail);
        let failed = fx.checker.run_cycle().await.unwrap();
        assert_eq!(failed.failures, 1);
        assert_eq!(failed.events, 0);
        let after_failure = fx.store.item(item.id).await.unwrap();
        assert_eq!(after_failure.state, AlertState::BelowThresholdNotified);
        assert_eq!(after_failure.last_price, Some(Decimal::new(900, 0)));

        fx.source.set(url, "drop", Scripted::Price(Decimal::new(850, 0)));
        assert_eq!(fx.checker.run_cycle().await.unwrap().events, 0);

        assert_eq!(fx.store.events().await.len(), 1);
        assert_eq!(fx.notifier.sent.lock().await.len(), 1);
        assert_eq!(fx.store.item(item.id).await.unwrap().state, AlertState::BelowThresholdNotified);
    }

    #[tokio::test]
    async fn test_one_scrape_fans_out_to_all_subscribers() {
        let fx = fixture();
        let first = track(&fx.store, "https://shop.test/shared", 1, 1000).await;
        let second = TrackedItem::new(2, first.product_id, Decimal::new(800, 0)).unwrap();
        fx.store.insert_tracked_item(&second).await.unwrap();

        fx.source.set("https://shop.test/shared", "shared", Scripted::Price(Decimal::new(1100, 0)));
        fx.checker.run_cycle().await.unwrap();

        fx.source.set("https://shop.test/shared", "shared", Scripted::Price(Decimal::new(900, 0)));
        let report = fx.checker.run_cycle().await.unwrap();

        assert_eq!(report.products_checked, 1);
        assert_eq!(report.events, 1);
        let sent = fx.notifier.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 1);
    }
}
