use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};

use super::Query;
use crate::{
    entities::{goods_receipt, goods_receipt_line, inventory_batch, GoodsReceiptStatus},
    errors::ServiceError,
    services::inventory_batches,
};

/// A goods receipt with its lines and any batches its closure created.
#[derive(Debug, Clone, Serialize)]
pub struct GoodsReceiptView {
    pub number: String,
    pub goods_receipt: goods_receipt::Model,
    pub lines: Vec<goods_receipt_line::Model>,
    pub batches: Vec<inventory_batch::Model>,
}

/// Query to get a specific goods receipt by ID
#[derive(Debug, Serialize, Deserialize)]
pub struct GetGoodsReceiptQuery {
    pub goods_receipt_id: i64,
}

#[async_trait]
impl Query for GetGoodsReceiptQuery {
    type Result = GoodsReceiptView;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let goods_receipt = goods_receipt::Entity::find_by_id(self.goods_receipt_id)
            .one(db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Goods receipt {} not found",
                    self.goods_receipt_id
                ))
            })?;

        let lines = goods_receipt_line::Entity::find()
            .filter(goods_receipt_line::Column::GoodsReceiptId.eq(goods_receipt.id))
            .order_by_asc(goods_receipt_line::Column::Id)
            .all(db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        let batches =
            inventory_batches::batches_for_goods_receipt(db_pool, goods_receipt.id).await?;

        Ok(GoodsReceiptView {
            number: goods_receipt.number(),
            goods_receipt,
            lines,
            batches,
        })
    }
}

/// Query to list the goods receipts raised against a purchase order
#[derive(Debug, Serialize, Deserialize)]
pub struct ListGoodsReceiptsForPurchaseOrderQuery {
    pub purchase_order_id: i64,
    pub status: Option<GoodsReceiptStatus>,
}

#[async_trait]
impl Query for ListGoodsReceiptsForPurchaseOrderQuery {
    type Result = Vec<goods_receipt::Model>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let mut query = goods_receipt::Entity::find()
            .filter(goods_receipt::Column::PurchaseOrderId.eq(self.purchase_order_id));
        if let Some(status) = self.status {
            query = query.filter(goods_receipt::Column::Status.eq(status));
        }

        query
            .order_by_asc(goods_receipt::Column::Id)
            .all(db_pool)
            .await
            .map_err(ServiceError::db_error)
    }
}
