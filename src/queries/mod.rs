use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::errors::ServiceError;

pub mod goods_receipt_queries;
pub mod inventory_batch_queries;
pub mod purchase_order_queries;

pub use goods_receipt_queries::{
    GetGoodsReceiptQuery, GoodsReceiptView, ListGoodsReceiptsForPurchaseOrderQuery,
};
pub use inventory_batch_queries::{BatchesForGoodsReceiptQuery, BatchesForProductQuery};
pub use purchase_order_queries::{
    GetPurchaseOrderQuery, IsFullyReceivedQuery, ListPurchaseOrdersQuery, OutstandingForLineQuery,
    PurchaseOrderView,
};

/// Trait representing a generic asynchronous query.
#[async_trait]
pub trait Query: Send + Sync {
    type Result: Send + Sync;

    /// Executes the query using the provided database pool.
    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError>;
}
