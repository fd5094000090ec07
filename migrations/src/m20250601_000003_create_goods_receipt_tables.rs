use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GoodsReceipts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GoodsReceipts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GoodsReceipts::PurchaseOrderId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GoodsReceipts::SupplierId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GoodsReceipts::WarehouseId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GoodsReceipts::ReceivedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GoodsReceipts::Status)
                            .string_len(20)
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(GoodsReceipts::Reference)
                            .string_len(100)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(GoodsReceipts::CreatedBy)
                            .string_len(150)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GoodsReceipts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GoodsReceipts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_goods_receipts_purchase_order_id")
                            .from(GoodsReceipts::Table, GoodsReceipts::PurchaseOrderId)
                            .to(PurchaseOrders::Table, PurchaseOrders::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_goods_receipts_supplier_id")
                            .from(GoodsReceipts::Table, GoodsReceipts::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_goods_receipts_warehouse_id")
                            .from(GoodsReceipts::Table, GoodsReceipts::WarehouseId)
                            .to(Warehouses::Table, Warehouses::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GoodsReceiptLines::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GoodsReceiptLines::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GoodsReceiptLines::GoodsReceiptId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GoodsReceiptLines::PurchaseOrderLineId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GoodsReceiptLines::ProductId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GoodsReceiptLines::Quantity)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(GoodsReceiptLines::ExpiryDate).date().null())
                    .col(
                        ColumnDef::new(GoodsReceiptLines::UnitPrice)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GoodsReceiptLines::LotNumber)
                            .string_len(100)
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_goods_receipt_lines_goods_receipt_id")
                            .from(GoodsReceiptLines::Table, GoodsReceiptLines::GoodsReceiptId)
                            .to(GoodsReceipts::Table, GoodsReceipts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_goods_receipt_lines_purchase_order_line_id")
                            .from(
                                GoodsReceiptLines::Table,
                                GoodsReceiptLines::PurchaseOrderLineId,
                            )
                            .to(PurchaseOrderLines::Table, PurchaseOrderLines::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_goods_receipt_lines_product_id")
                            .from(GoodsReceiptLines::Table, GoodsReceiptLines::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GoodsReceiptLines::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(GoodsReceipts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GoodsReceipts {
    Table,
    Id,
    PurchaseOrderId,
    SupplierId,
    WarehouseId,
    ReceivedAt,
    Status,
    Reference,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum GoodsReceiptLines {
    Table,
    Id,
    GoodsReceiptId,
    PurchaseOrderLineId,
    ProductId,
    Quantity,
    ExpiryDate,
    UnitPrice,
    LotNumber,
}

#[derive(DeriveIden)]
enum PurchaseOrders {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum PurchaseOrderLines {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Suppliers {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Warehouses {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
}
