use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(PriceObservations::Table)
                .if_not_exists()
                .col(ColumnDef::new(PriceObservations::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(PriceObservations::ProductId).uuid().not_null())
                .col(ColumnDef::new(PriceObservations::Price).decimal().not_null())
                .col(
                    ColumnDef::new(PriceObservations::ObservedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_price_observations_product")
                        .from(PriceObservations::Table, PriceObservations::ProductId)
                        .to(Products::Table, Products::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                )
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_price_observations_product_time")
                .table(PriceObservations::Table)
                .col(PriceObservations::ProductId)
                .col(PriceObservations::ObservedAt)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(PriceObservations::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum PriceObservations {
    Table,
    Id,
    ProductId,
    Price,
    ObservedAt,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
}
