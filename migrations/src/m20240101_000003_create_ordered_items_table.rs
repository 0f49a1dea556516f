use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrderedItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderedItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderedItems::OrderId).uuid().not_null())
                    .col(ColumnDef::new(OrderedItems::ProductId).uuid().not_null())
                    .col(
                        ColumnDef::new(OrderedItems::QuantityInKg)
                            .decimal_len(12, 4)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ordered_items_order_id")
                            .from(OrderedItems::Table, OrderedItems::OrderId)
                            .to(
                                super::m20240101_000002_create_orders_table::Orders::Table,
                                super::m20240101_000002_create_orders_table::Orders::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ordered_items_product_id")
                            .from(OrderedItems::Table, OrderedItems::ProductId)
                            .to(
                                super::m20240101_000001_create_products_table::Products::Table,
                                super::m20240101_000001_create_products_table::Products::Id,
                            )
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ordered_items_order_id")
                    .table(OrderedItems::Table)
                    .col(OrderedItems::OrderId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderedItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum OrderedItems {
    Table,
    Id,
    OrderId,
    ProductId,
    QuantityInKg,
}
