use sea_orm::entity::prelude::*;
use serde::{ Deserialize, Serialize };

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscribers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub chat_id: i64,
    pub name: String,
    pub username: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tracked_item::Entity")]
    TrackedItem,
}

impl Related<super::tracked_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrackedItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::models::Subscriber {
    fn from(model: Model) -> Self {
        Self {
            chat_id: model.chat_id,
            name: model.name,
            username: model.username,
        }
    }
}
