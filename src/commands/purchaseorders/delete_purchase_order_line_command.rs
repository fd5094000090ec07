use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use super::lock_draft_parent;
use crate::{
    commands::{observe, Command},
    db::{DbPool, TrackedTransaction},
    entities::goods_receipt_line,
    errors::ServiceError,
    events::{Event, EventSender},
    services::lookup,
};

const OPERATION: &str = "delete_purchase_order_line";

/// Removes a line from a draft purchase order. Lines that goods receipts
/// point at are protected.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DeletePurchaseOrderLineCommand {
    pub purchase_order_id: i64,
    pub line_id: i64,
}

#[async_trait]
impl Command for DeletePurchaseOrderLineCommand {
    type Result = ();

    #[instrument(skip(self, db_pool, event_sender), fields(line_id = self.line_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        observe(OPERATION, self.delete(&db_pool).await)?;

        info!(line_id = self.line_id, "Purchase order line removed");
        event_sender.send_or_log(Event::PurchaseOrderLineRemoved {
            purchase_order_id: self.purchase_order_id,
            line_id: self.line_id,
        });
        Ok(())
    }
}

impl DeletePurchaseOrderLineCommand {
    async fn delete(&self, db: &DbPool) -> Result<(), ServiceError> {
        let tx = TrackedTransaction::begin(db, OPERATION).await?;
        let txn = tx.conn();

        lock_draft_parent(txn, self.purchase_order_id).await?;
        let line = lookup::find_purchase_order_line(txn, self.line_id).await?;
        if line.purchase_order_id != self.purchase_order_id {
            return Err(ServiceError::NotFound(format!(
                "Purchase order line {} not found on purchase order {}",
                self.line_id, self.purchase_order_id
            )));
        }

        let receipts = goods_receipt_line::Entity::find()
            .filter(goods_receipt_line::Column::PurchaseOrderLineId.eq(line.id))
            .count(txn)
            .await
            .map_err(ServiceError::db_error)?;
        if receipts > 0 {
            return Err(ServiceError::ReferencedEntityProtected(format!(
                "purchase order line {}: referenced by {} goods receipt line(s)",
                line.id, receipts
            )));
        }

        line.delete(txn).await.map_err(ServiceError::db_error)?;

        tx.commit().await?;
        Ok(())
    }
}
