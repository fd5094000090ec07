use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One batch per goods receipt line; the line cannot be deleted while its batch exists.
        manager
            .create_table(
                Table::create()
                    .table(InventoryBatches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryBatches::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InventoryBatches::GoodsReceiptLineId)
                            .big_integer()
                            .null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(InventoryBatches::ProductId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryBatches::WarehouseId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryBatches::Quantity)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryBatches::ExpiryDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryBatches::LotNumber)
                            .string_len(100)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(InventoryBatches::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_batches_goods_receipt_line_id")
                            .from(
                                InventoryBatches::Table,
                                InventoryBatches::GoodsReceiptLineId,
                            )
                            .to(GoodsReceiptLines::Table, GoodsReceiptLines::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_batches_product_id")
                            .from(InventoryBatches::Table, InventoryBatches::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_batches_warehouse_id")
                            .from(InventoryBatches::Table, InventoryBatches::WarehouseId)
                            .to(Warehouses::Table, Warehouses::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InventoryBatches::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum InventoryBatches {
    Table,
    Id,
    GoodsReceiptLineId,
    ProductId,
    WarehouseId,
    Quantity,
    ExpiryDate,
    LotNumber,
    CreatedAt,
}

#[derive(DeriveIden)]
enum GoodsReceiptLines {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Warehouses {
    Table,
    Id,
}
