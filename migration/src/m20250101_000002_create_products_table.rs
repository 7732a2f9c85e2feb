use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Products::Table)
                .if_not_exists()
                .col(ColumnDef::new(Products::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Products::Url).string().not_null())
                .col(ColumnDef::new(Products::Sku).string().not_null())
                .col(ColumnDef::new(Products::Name).string().not_null())
                .col(ColumnDef::new(Products::Seller).string().not_null())
                .col(ColumnDef::new(Products::LastPrice).decimal())
                .col(ColumnDef::new(Products::LastCheckedAt).timestamp_with_time_zone())
                .col(ColumnDef::new(Products::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Products::UpdatedAt).timestamp_with_time_zone().not_null())
                .to_owned()
        ).await?;

        // One row per canonical product URL
        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_products_url")
                .table(Products::Table)
                .col(Products::Url)
                .unique()
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Products::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    Url,
    Sku,
    Name,
    Seller,
    LastPrice,
    LastCheckedAt,
    CreatedAt,
    UpdatedAt,
}
