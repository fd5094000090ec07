use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================
        // PURCHASE ORDERS
        // ============================================

        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_orders_status")
                    .table(PurchaseOrders::Table)
                    .col(PurchaseOrders::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_order_lines_purchase_order_id")
                    .table(PurchaseOrderLines::Table)
                    .col(PurchaseOrderLines::PurchaseOrderId)
                    .to_owned(),
            )
            .await?;

        // ============================================
        // GOODS RECEIPTS
        // ============================================

        manager
            .create_index(
                Index::create()
                    .name("idx_goods_receipts_purchase_order_status")
                    .table(GoodsReceipts::Table)
                    .col(GoodsReceipts::PurchaseOrderId)
                    .col(GoodsReceipts::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_goods_receipt_lines_goods_receipt_id")
                    .table(GoodsReceiptLines::Table)
                    .col(GoodsReceiptLines::GoodsReceiptId)
                    .to_owned(),
            )
            .await?;

        // Outstanding-quantity lookups join receipts on the PO line they fulfil
        manager
            .create_index(
                Index::create()
                    .name("idx_goods_receipt_lines_purchase_order_line_id")
                    .table(GoodsReceiptLines::Table)
                    .col(GoodsReceiptLines::PurchaseOrderLineId)
                    .to_owned(),
            )
            .await?;

        // ============================================
        // INVENTORY BATCHES
        // ============================================

        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_batches_product_warehouse")
                    .table(InventoryBatches::Table)
                    .col(InventoryBatches::ProductId)
                    .col(InventoryBatches::WarehouseId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let indexes = [
            ("idx_inventory_batches_product_warehouse", "inventory_batches"),
            (
                "idx_goods_receipt_lines_purchase_order_line_id",
                "goods_receipt_lines",
            ),
            ("idx_goods_receipt_lines_goods_receipt_id", "goods_receipt_lines"),
            ("idx_goods_receipts_purchase_order_status", "goods_receipts"),
            (
                "idx_purchase_order_lines_purchase_order_id",
                "purchase_order_lines",
            ),
            ("idx_purchase_orders_status", "purchase_orders"),
        ];

        for (name, table) in indexes {
            manager
                .drop_index(Index::drop().name(name).table(Alias::new(table)).to_owned())
                .await?;
        }

        Ok(())
    }
}

#[derive(DeriveIden)]
enum PurchaseOrders {
    Table,
    Status,
}

#[derive(DeriveIden)]
enum PurchaseOrderLines {
    Table,
    PurchaseOrderId,
}

#[derive(DeriveIden)]
enum GoodsReceipts {
    Table,
    PurchaseOrderId,
    Status,
}

#[derive(DeriveIden)]
enum GoodsReceiptLines {
    Table,
    GoodsReceiptId,
    PurchaseOrderLineId,
}

#[derive(DeriveIden)]
enum InventoryBatches {
    Table,
    ProductId,
    WarehouseId,
}
