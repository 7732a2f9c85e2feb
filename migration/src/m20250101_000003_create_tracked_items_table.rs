use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(TrackedItems::Table)
                .if_not_exists()
                .col(ColumnDef::new(TrackedItems::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(TrackedItems::SubscriberId).big_integer().not_null())
                .col(ColumnDef::new(TrackedItems::ProductId).uuid().not_null())
                .col(ColumnDef::new(TrackedItems::Threshold).decimal().not_null())
                .col(
                    ColumnDef::new(TrackedItems::AlertState)
                        .string()
                        .not_null()
                        .default("above_threshold")
                ) // "above_threshold", "below_threshold_notified"
                .col(ColumnDef::new(TrackedItems::LastPrice).decimal())
                .col(ColumnDef::new(TrackedItems::LastObservedAt).timestamp_with_time_zone())
                .col(ColumnDef::new(TrackedItems::NotifiedAt).timestamp_with_time_zone())
                .col(ColumnDef::new(TrackedItems::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(TrackedItems::UpdatedAt).timestamp_with_time_zone().not_null())
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_tracked_items_subscriber")
                        .from(TrackedItems::Table, TrackedItems::SubscriberId)
                        .to(Subscribers::Table, Subscribers::ChatId)
                        .on_delete(ForeignKeyAction::Cascade)
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_tracked_items_product")
                        .from(TrackedItems::Table, TrackedItems::ProductId)
                        .to(Products::Table, Products::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                )
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_tracked_items_subscriber_product")
                .table(TrackedItems::Table)
                .col(TrackedItems::SubscriberId)
                .col(TrackedItems::ProductId)
                .unique()
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_tracked_items_product_id")
                .table(TrackedItems::Table)
                .col(TrackedItems::ProductId)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(TrackedItems::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum TrackedItems {
    Table,
    Id,
    SubscriberId,
    ProductId,
    Threshold,
    AlertState,
    LastPrice,
    LastObservedAt,
    NotifiedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Subscribers {
    Table,
    ChatId,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
}
