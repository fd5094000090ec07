use std::sync::Arc;

use tracing::instrument;

use crate::{
    commands::{
        goodsreceipts::{
            AddGoodsReceiptLineCommand, CreateGoodsReceiptCommand,
            CreateGoodsReceiptFromPoCommand, CreateGoodsReceiptResult, DeleteGoodsReceiptCommand,
            DeleteGoodsReceiptLineCommand, UpdateGoodsReceiptCommand, UpdateGoodsReceiptResult,
            UpdateGoodsReceiptLineCommand,
        },
        purchaseorders::{
            AddPurchaseOrderLineCommand, CreatePurchaseOrderCommand, CreatePurchaseOrderResult,
            DeletePurchaseOrderCommand, DeletePurchaseOrderLineCommand,
            UpdatePurchaseOrderCommand, UpdatePurchaseOrderLineCommand, UpdatePurchaseOrderResult,
        },
        Command,
    },
    db::DbPool,
    entities::{
        goods_receipt, goods_receipt_line, inventory_batch, purchase_order, purchase_order_line,
        GoodsReceiptStatus, PurchaseOrderStatus,
    },
    errors::ServiceError,
    events::EventSender,
    queries::{
        BatchesForGoodsReceiptQuery, BatchesForProductQuery, GetGoodsReceiptQuery,
        GetPurchaseOrderQuery, GoodsReceiptView, IsFullyReceivedQuery,
        ListGoodsReceiptsForPurchaseOrderQuery, ListPurchaseOrdersQuery, OutstandingForLineQuery,
        PurchaseOrderView, Query,
    },
    services::ledger::LineOutstanding,
};

/// Entry point for the purchase order and goods receipt workflows.
///
/// Every mutating method runs one command in its own transaction; events
/// go out only after that transaction commits.
#[derive(Clone)]
pub struct ProcurementService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ProcurementService {
    /// Creates a new procurement service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    pub fn db(&self) -> &DbPool {
        &self.db_pool
    }

    async fn run<C: Command>(&self, command: C) -> Result<C::Result, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    // Purchase orders

    /// Creates a draft purchase order, optionally with lines
    #[instrument(skip(self, command))]
    pub async fn create_purchase_order(
        &self,
        command: CreatePurchaseOrderCommand,
    ) -> Result<CreatePurchaseOrderResult, ServiceError> {
        self.run(command).await
    }

    /// Updates header fields and/or the status of a purchase order
    #[instrument(skip(self, command), fields(purchase_order_id = command.id))]
    pub async fn update_purchase_order(
        &self,
        command: UpdatePurchaseOrderCommand,
    ) -> Result<UpdatePurchaseOrderResult, ServiceError> {
        self.run(command).await
    }

    /// Moves a purchase order to `status`, leaving header fields alone
    #[instrument(skip(self))]
    pub async fn set_purchase_order_status(
        &self,
        purchase_order_id: i64,
        status: PurchaseOrderStatus,
    ) -> Result<UpdatePurchaseOrderResult, ServiceError> {
        self.run(UpdatePurchaseOrderCommand {
            id: purchase_order_id,
            status: Some(status),
            ..Default::default()
        })
        .await
    }

    /// Submits a draft purchase order to the supplier
    pub async fn submit_purchase_order(
        &self,
        purchase_order_id: i64,
    ) -> Result<UpdatePurchaseOrderResult, ServiceError> {
        self.set_purchase_order_status(purchase_order_id, PurchaseOrderStatus::Submitted)
            .await
    }

    pub async fn cancel_purchase_order(
        &self,
        purchase_order_id: i64,
    ) -> Result<UpdatePurchaseOrderResult, ServiceError> {
        self.set_purchase_order_status(purchase_order_id, PurchaseOrderStatus::Cancelled)
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_purchase_order(&self, purchase_order_id: i64) -> Result<(), ServiceError> {
        self.run(DeletePurchaseOrderCommand {
            id: purchase_order_id,
        })
        .await
    }

    pub async fn add_purchase_order_line(
        &self,
        command: AddPurchaseOrderLineCommand,
    ) -> Result<purchase_order_line::Model, ServiceError> {
        self.run(command).await
    }

    pub async fn update_purchase_order_line(
        &self,
        command: UpdatePurchaseOrderLineCommand,
    ) -> Result<purchase_order_line::Model, ServiceError> {
        self.run(command).await
    }

    pub async fn delete_purchase_order_line(
        &self,
        purchase_order_id: i64,
        line_id: i64,
    ) -> Result<(), ServiceError> {
        self.run(DeletePurchaseOrderLineCommand {
            purchase_order_id,
            line_id,
        })
        .await
    }

    // Goods receipts

    /// Creates a draft goods receipt from a submitted purchase order
    #[instrument(skip(self, command), fields(purchase_order_id = command.purchase_order_id))]
    pub async fn create_goods_receipt_from_po(
        &self,
        command: CreateGoodsReceiptFromPoCommand,
    ) -> Result<CreateGoodsReceiptResult, ServiceError> {
        self.run(command).await
    }

    /// Creates a draft goods receipt with no purchase order
    #[instrument(skip(self, command))]
    pub async fn create_goods_receipt(
        &self,
        command: CreateGoodsReceiptCommand,
    ) -> Result<CreateGoodsReceiptResult, ServiceError> {
        self.run(command).await
    }

    /// Updates header fields and/or the status of a goods receipt; closing
    /// it creates inventory batches
    #[instrument(skip(self, command), fields(goods_receipt_id = command.id))]
    pub async fn update_goods_receipt(
        &self,
        command: UpdateGoodsReceiptCommand,
    ) -> Result<UpdateGoodsReceiptResult, ServiceError> {
        self.run(command).await
    }

    /// Closes a draft goods receipt
    pub async fn close_goods_receipt(
        &self,
        goods_receipt_id: i64,
    ) -> Result<UpdateGoodsReceiptResult, ServiceError> {
        self.run(UpdateGoodsReceiptCommand {
            id: goods_receipt_id,
            status: Some(GoodsReceiptStatus::Closed),
            ..Default::default()
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_goods_receipt(&self, goods_receipt_id: i64) -> Result<(), ServiceError> {
        self.run(DeleteGoodsReceiptCommand {
            id: goods_receipt_id,
        })
        .await
    }

    pub async fn add_goods_receipt_line(
        &self,
        command: AddGoodsReceiptLineCommand,
    ) -> Result<goods_receipt_line::Model, ServiceError> {
        self.run(command).await
    }

    pub async fn update_goods_receipt_line(
        &self,
        command: UpdateGoodsReceiptLineCommand,
    ) -> Result<goods_receipt_line::Model, ServiceError> {
        self.run(command).await
    }

    pub async fn delete_goods_receipt_line(
        &self,
        goods_receipt_id: i64,
        line_id: i64,
    ) -> Result<(), ServiceError> {
        self.run(DeleteGoodsReceiptLineCommand {
            goods_receipt_id,
            line_id,
        })
        .await
    }

    // Queries

    pub async fn get_purchase_order(
        &self,
        purchase_order_id: i64,
    ) -> Result<PurchaseOrderView, ServiceError> {
        GetPurchaseOrderQuery { purchase_order_id }
            .execute(&self.db_pool)
            .await
    }

    pub async fn list_purchase_orders(
        &self,
        query: ListPurchaseOrdersQuery,
    ) -> Result<Vec<purchase_order::Model>, ServiceError> {
        query.execute(&self.db_pool).await
    }

    /// Ordered, received and outstanding quantities of one purchase order line
    pub async fn outstanding_for_line(
        &self,
        purchase_order_line_id: i64,
    ) -> Result<LineOutstanding, ServiceError> {
        OutstandingForLineQuery {
            purchase_order_line_id,
        }
        .execute(&self.db_pool)
        .await
    }

    pub async fn is_fully_received(&self, purchase_order_id: i64) -> Result<bool, ServiceError> {
        IsFullyReceivedQuery { purchase_order_id }
            .execute(&self.db_pool)
            .await
    }

    pub async fn get_goods_receipt(
        &self,
        goods_receipt_id: i64,
    ) -> Result<GoodsReceiptView, ServiceError> {
        GetGoodsReceiptQuery { goods_receipt_id }
            .execute(&self.db_pool)
            .await
    }

    pub async fn goods_receipts_for_purchase_order(
        &self,
        purchase_order_id: i64,
        status: Option<GoodsReceiptStatus>,
    ) -> Result<Vec<goods_receipt::Model>, ServiceError> {
        ListGoodsReceiptsForPurchaseOrderQuery {
            purchase_order_id,
            status,
        }
        .execute(&self.db_pool)
        .await
    }

    pub async fn batches_for_goods_receipt(
        &self,
        goods_receipt_id: i64,
    ) -> Result<Vec<inventory_batch::Model>, ServiceError> {
        BatchesForGoodsReceiptQuery { goods_receipt_id }
            .execute(&self.db_pool)
            .await
    }

    pub async fn batches_for_product(
        &self,
        product_id: i64,
        warehouse_id: Option<i64>,
    ) -> Result<Vec<inventory_batch::Model>, ServiceError> {
        BatchesForProductQuery {
            product_id,
            warehouse_id,
        }
        .execute(&self.db_pool)
        .await
    }
}
