use sea_orm::entity::prelude::*;
use serde::{ Deserialize, Serialize };

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub url: String,
    pub sku: String,
    pub name: String,
    pub seller: String,
    pub last_price: Option<Decimal>,
    pub last_checked_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tracked_item::Entity")]
    TrackedItem,
    #[sea_orm(has_many = "super::price_observation::Entity")]
    PriceObservation,
}

impl Related<super::tracked_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrackedItem.def()
    }
}

impl Related<super::price_observation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PriceObservation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::models::Product {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            url: model.url,
            sku: model.sku,
            name: model.name,
            seller: model.seller,
            last_price: model.last_price,
            last_checked_at: model.last_checked_at,
        }
    }
}
