use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use super::Query;
use crate::{entities::inventory_batch, errors::ServiceError, services::inventory_batches};

/// Query for the batches created by closing a goods receipt
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchesForGoodsReceiptQuery {
    pub goods_receipt_id: i64,
}

#[async_trait]
impl Query for BatchesForGoodsReceiptQuery {
    type Result = Vec<inventory_batch::Model>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        inventory_batches::batches_for_goods_receipt(db_pool, self.goods_receipt_id).await
    }
}

/// Query for a product's batches, oldest expiry first
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchesForProductQuery {
    pub product_id: i64,
    pub warehouse_id: Option<i64>,
}

#[async_trait]
impl Query for BatchesForProductQuery {
    type Result = Vec<inventory_batch::Model>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        inventory_batches::batches_for_product(db_pool, self.product_id, self.warehouse_id).await
    }
}
