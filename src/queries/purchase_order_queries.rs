use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};

use super::Query;
use crate::{
    entities::{purchase_order, purchase_order_line, PurchaseOrderStatus},
    errors::ServiceError,
    services::ledger::{self, LineOutstanding},
};

/// A purchase order with its lines and what is still outstanding on each.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderView {
    pub number: String,
    pub purchase_order: purchase_order::Model,
    pub lines: Vec<purchase_order_line::Model>,
    pub outstanding: Vec<LineOutstanding>,
    pub fully_received: bool,
}

/// Query to get a specific purchase order by ID
#[derive(Debug, Serialize, Deserialize)]
pub struct GetPurchaseOrderQuery {
    pub purchase_order_id: i64,
}

#[async_trait]
impl Query for GetPurchaseOrderQuery {
    type Result = PurchaseOrderView;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let purchase_order = purchase_order::Entity::find_by_id(self.purchase_order_id)
            .one(db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Purchase order {} not found",
                    self.purchase_order_id
                ))
            })?;

        let lines = purchase_order_line::Entity::find()
            .filter(purchase_order_line::Column::PurchaseOrderId.eq(purchase_order.id))
            .order_by_asc(purchase_order_line::Column::Id)
            .all(db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        let ledger = ledger::load_purchase_order_ledger(db_pool, purchase_order.id).await?;

        Ok(PurchaseOrderView {
            number: purchase_order.number(),
            outstanding: ledger.lines().iter().map(|l| l.summary()).collect(),
            fully_received: ledger.is_fully_received(),
            purchase_order,
            lines,
        })
    }
}

/// Query to list purchase orders, optionally by status, newest first
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ListPurchaseOrdersQuery {
    pub status: Option<PurchaseOrderStatus>,
    pub supplier_id: Option<i64>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[async_trait]
impl Query for ListPurchaseOrdersQuery {
    type Result = Vec<purchase_order::Model>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let mut query = purchase_order::Entity::find();
        if let Some(status) = self.status {
            query = query.filter(purchase_order::Column::Status.eq(status));
        }
        if let Some(supplier_id) = self.supplier_id {
            query = query.filter(purchase_order::Column::SupplierId.eq(supplier_id));
        }

        query
            .order_by_desc(purchase_order::Column::OrderedAt)
            .order_by_desc(purchase_order::Column::Id)
            .limit(self.limit)
            .offset(self.offset)
            .all(db_pool)
            .await
            .map_err(ServiceError::db_error)
    }
}

/// Query for the outstanding quantities of one purchase order line
#[derive(Debug, Serialize, Deserialize)]
pub struct OutstandingForLineQuery {
    pub purchase_order_line_id: i64,
}

#[async_trait]
impl Query for OutstandingForLineQuery {
    type Result = LineOutstanding;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let line = ledger::load_line_ledger(db_pool, self.purchase_order_line_id).await?;
        Ok(line.summary())
    }
}

/// Query whether closed goods receipts cover every line of a purchase order
#[derive(Debug, Serialize, Deserialize)]
pub struct IsFullyReceivedQuery {
    pub purchase_order_id: i64,
}

#[async_trait]
impl Query for IsFullyReceivedQuery {
    type Result = bool;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        purchase_order::Entity::find_by_id(self.purchase_order_id)
            .one(db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Purchase order {} not found",
                    self.purchase_order_id
                ))
            })?;

        let ledger = ledger::load_purchase_order_ledger(db_pool, self.purchase_order_id).await?;
        Ok(ledger.is_fully_received())
    }
}
