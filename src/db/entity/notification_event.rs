use sea_orm::entity::prelude::*;
use serde::{ Deserialize, Serialize };

use crate::error::AppError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tracked_item_id: Uuid,
    pub subscriber_id: i64,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_url: String,
    pub seller: String,
    pub price: Decimal,
    pub threshold: Decimal,
    pub status: String, // "pending", "delivered", "failed"
    pub attempts: i32,
    pub last_error: Option<String>,
    pub observed_at: DateTimeUtc,
    pub delivered_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for crate::models::NotificationEvent {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tracked_item_id: model.tracked_item_id,
            subscriber_id: model.subscriber_id,
            product_id: model.product_id,
            product_name: model.product_name,
            product_url: model.product_url,
            seller: model.seller,
            price: model.price,
            threshold: model.threshold,
            observed_at: model.observed_at,
            status: model.status.parse()?,
            attempts: model.attempts.max(0) as u32,
            last_error: model.last_error,
        })
    }
}
