use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(NotificationEvents::Table)
                .if_not_exists()
                .col(ColumnDef::new(NotificationEvents::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(NotificationEvents::TrackedItemId).uuid().not_null())
                .col(ColumnDef::new(NotificationEvents::SubscriberId).big_integer().not_null())
                .col(ColumnDef::new(NotificationEvents::ProductId).uuid().not_null())
                .col(ColumnDef::new(NotificationEvents::ProductName).string().not_null())
                .col(ColumnDef::new(NotificationEvents::ProductUrl).string().not_null())
                .col(ColumnDef::new(NotificationEvents::Seller).string().not_null())
                .col(ColumnDef::new(NotificationEvents::Price).decimal().not_null())
                .col(ColumnDef::new(NotificationEvents::Threshold).decimal().not_null())
                .col(
                    ColumnDef::new(NotificationEvents::Status)
                        .string()
                        .not_null()
                        .default("pending")
                ) // "pending", "delivered", "failed"
                .col(
                    ColumnDef::new(NotificationEvents::Attempts)
                        .integer()
                        .not_null()
                        .default(0)
                )
                .col(ColumnDef::new(NotificationEvents::LastError).text())
                .col(ColumnDef::new(NotificationEvents::ObservedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(NotificationEvents::DeliveredAt).timestamp_with_time_zone())
                .col(ColumnDef::new(NotificationEvents::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(NotificationEvents::UpdatedAt).timestamp_with_time_zone().not_null())
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_notification_events_status")
                .table(NotificationEvents::Table)
                .col(NotificationEvents::Status)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(NotificationEvents::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum NotificationEvents {
    Table,
    Id,
    TrackedItemId,
    SubscriberId,
    ProductId,
    ProductName,
    ProductUrl,
    Seller,
    Price,
    Threshold,
    Status,
    Attempts,
    LastError,
    ObservedAt,
    DeliveredAt,
    CreatedAt,
    UpdatedAt,
}
