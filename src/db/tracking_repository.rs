use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait,
    ColumnTrait,
    DatabaseConnection,
    EntityTrait,
    QueryFilter,
    QueryOrder,
    QuerySelect,
    DbErr,
    Set,
    SqlErr,
    TransactionTrait,
};
use uuid::Uuid;

use crate::db::entity::{
    notification_event,
    price_observation,
    product,
    subscriber,
    tracked_item,
};
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

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct TrackingRepository {
    db: DatabaseConnection,
}

impl TrackingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn item_model(item: &TrackedItem) -> tracked_item::ActiveModel {
        tracked_item::ActiveModel {
            id: Set(item.id),
            subscriber_id: Set(item.subscriber_id),
            product_id: Set(item.product_id),
            threshold: Set(item.threshold),
            alert_state: Set(item.state.to_string()),
            last_price: Set(item.last_price),
            last_observed_at: Set(item.last_observed_at),
            notified_at: Set(item.notified_at),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
    }
}

/// The `(subscriber_id, product_id)` index rejected a second item for the same pair.
fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[async_trait]
impl TrackingStore for TrackingRepository {
    async fn upsert_subscriber(&self, sub: Subscriber) -> Result<Subscriber> {
        let now = Utc::now();
        let existing = subscriber::Entity::find_by_id(sub.chat_id).one(&self.db).await?;

        let model = match existing {
            Some(found) => {
                let mut active: subscriber::ActiveModel = found.into();
                active.name = Set(sub.name);
                active.username = Set(sub.username);
                active.updated_at = Set(now);
                active.update(&self.db).await?
            }
            None => {
                (subscriber::ActiveModel {
                    chat_id: Set(sub.chat_id),
                    name: Set(sub.name),
                    username: Set(sub.username),
                    created_at: Set(now),
                    updated_at: Set(now),
                }).insert(&self.db).await?
            }
        };

        Ok(model.into())
    }

    async fn find_subscriber(&self, chat_id: i64) -> Result<Option<Subscriber>> {
        let found = subscriber::Entity::find_by_id(chat_id).one(&self.db).await?;
        Ok(found.map(Into::into))
    }

    async fn upsert_product(&self, listing: &ProductListing) -> Result<Product> {
        let now = Utc::now();
        let existing = product::Entity
            ::find()
            .filter(product::Column::Url.eq(&listing.url))
            .one(&self.db).await?;

        let model = match existing {
            Some(found) => {
                let mut active: product::ActiveModel = found.into();
                active.name = Set(listing.name.clone());
                active.seller = Set(listing.seller.clone());
                if !listing.sku.is_empty() {
                    active.sku = Set(listing.sku.clone());
                }
                active.updated_at = Set(now);
                active.update(&self.db).await?
            }
            None => {
                (product::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    url: Set(listing.url.clone()),
                    sku: Set(listing.sku.clone()),
                    name: Set(listing.name.clone()),
                    seller: Set(listing.seller.clone()),
                    last_price: Set(None),
                    last_checked_at: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                }).insert(&self.db).await?
            }
        };

        Ok(model.into())
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
        let found = product::Entity::find_by_id(id).one(&self.db).await?;
        Ok(found.map(Into::into))
    }

    async fn tracked_products(&self) -> Result<Vec<Product>> {
        let product_ids: Vec<Uuid> = tracked_item::Entity
            ::find()
            .select_only()
            .column(tracked_item::Column::ProductId)
            .distinct()
            .into_tuple()
            .all(&self.db).await?;

        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        let products = product::Entity
            ::find()
            .filter(product::Column::Id.is_in(product_ids))
            .order_by_asc(product::Column::CreatedAt)
            .all(&self.db).await?;

        Ok(products.into_iter().map(Into::into).collect())
    }

    async fn insert_tracked_item(&self, item: &TrackedItem) -> Result<()> {
        let mut active = Self::item_model(item);
        active.created_at = Set(Utc::now());
        match active.insert(&self.db).await {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                Err(AppError::InvalidInput("already tracking this product".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_tracked_item(&self, id: Uuid) -> Result<Option<TrackedItem>> {
        tracked_item::Entity
            ::find_by_id(id)
            .one(&self.db).await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn find_tracked_item_for(
        &self,
        subscriber_id: i64,
        product_id: Uuid
    ) -> Result<Option<TrackedItem>> {
        tracked_item::Entity
            ::find()
            .filter(tracked_item::Column::SubscriberId.eq(subscriber_id))
            .filter(tracked_item::Column::ProductId.eq(product_id))
            .one(&self.db).await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn tracked_items_for_product(&self, product_id: Uuid) -> Result<Vec<TrackedItem>> {
        tracked_item::Entity
            ::find()
            .filter(tracked_item::Column::ProductId.eq(product_id))
            .order_by_asc(tracked_item::Column::CreatedAt)
            .all(&self.db).await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }

    async fn tracked_items_for_subscriber(&self, subscriber_id: i64) -> Result<Vec<TrackedItem>> {
        tracked_item::Entity
            ::find()
            .filter(tracked_item::Column::SubscriberId.eq(subscriber_id))
            .order_by_asc(tracked_item::Column::CreatedAt)
            .all(&self.db).await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }

    async fn save_tracked_item(
        &self,
        item: &TrackedItem,
        event: Option<&NotificationEvent>
    ) -> Result<()> {
        let txn = self.db.begin().await?;

        Self::item_model(item).update(&txn).await?;

        if let Some(event) = event {
            let now = Utc::now();
            (notification_event::ActiveModel {
                id: Set(event.id),
                tracked_item_id: Set(event.tracked_item_id),
                subscriber_id: Set(event.subscriber_id),
                product_id: Set(event.product_id),
                product_name: Set(event.product_name.clone()),
                product_url: Set(event.product_url.clone()),
                seller: Set(event.seller.clone()),
                price: Set(event.price),
                threshold: Set(event.threshold),
                status: Set(event.status.to_string()),
                attempts: Set(event.attempts as i32),
                last_error: Set(event.last_error.clone()),
                observed_at: Set(event.observed_at),
                delivered_at: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            }).insert(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    async fn delete_tracked_item(&self, id: Uuid) -> Result<bool> {
        let result = tracked_item::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn record_observation(&self, observation: &PriceObservation) -> Result<()> {
        let txn = self.db.begin().await?;

        (price_observation::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(observation.product_id),
            price: Set(observation.price),
            observed_at: Set(observation.observed_at),
        }).insert(&txn).await?;

        product::Entity
            ::update_many()
            .col_expr(product::Column::LastPrice, Expr::value(observation.price))
            .col_expr(product::Column::LastCheckedAt, Expr::value(observation.observed_at))
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(observation.product_id))
            .exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    async fn price_history(&self, product_id: Uuid) -> Result<Vec<PriceObservation>> {
        let rows = price_observation::Entity
            ::find()
            .filter(price_observation::Column::ProductId.eq(product_id))
            .order_by_asc(price_observation::Column::ObservedAt)
            .all(&self.db).await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn pending_events(&self, limit: u64) -> Result<Vec<NotificationEvent>> {
        notification_event::Entity
            ::find()
            .filter(notification_event::Column::Status.eq(DeliveryStatus::Pending.as_str()))
            .order_by_asc(notification_event::Column::CreatedAt)
            .limit(limit)
            .all(&self.db).await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }

    async fn update_event(&self, event: &NotificationEvent) -> Result<()> {
        let now = Utc::now();
        let delivered_at = match event.status {
            DeliveryStatus::Delivered => Some(now),
            _ => None,
        };

        (notification_event::ActiveModel {
            id: Set(event.id),
            status: Set(event.status.to_string()),
            attempts: Set(event.attempts as i32),
            last_error: Set(event.last_error.clone()),
            delivered_at: Set(delivered_at),
            updated_at: Set(now),
            ..Default::default()
        }).update(&self.db).await?;

        Ok(())
    }
}
