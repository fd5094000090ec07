use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    commands::{observe, Command},
    db::{DbPool, TrackedTransaction},
    entities::{goods_receipt_line, purchase_order_line},
    errors::ServiceError,
    events::{Event, EventSender},
    services::lookup,
};

const OPERATION: &str = "delete_purchase_order";

/// Deletes a draft purchase order together with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DeletePurchaseOrderCommand {
    pub id: i64,
}

#[async_trait]
impl Command for DeletePurchaseOrderCommand {
    type Result = ();

    #[instrument(skip(self, db_pool, event_sender), fields(purchase_order_id = self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let number = observe(OPERATION, self.delete(&db_pool).await)?;

        info!(purchase_order = %number, "Purchase order deleted");
        event_sender.send_or_log(Event::PurchaseOrderDeleted {
            purchase_order_id: self.id,
        });
        Ok(())
    }
}

impl DeletePurchaseOrderCommand {
    async fn delete(&self, db: &DbPool) -> Result<String, ServiceError> {
        let tx = TrackedTransaction::begin(db, OPERATION).await?;
        let txn = tx.conn();

        let po = lookup::lock_purchase_order(txn, self.id).await?;
        if !po.is_draft() {
            return Err(ServiceError::NotDraft {
                document: po.number(),
                status: po.status.to_string(),
            });
        }

        let line_ids: Vec<i64> = purchase_order_line::Entity::find()
            .select_only()
            .column(purchase_order_line::Column::Id)
            .filter(purchase_order_line::Column::PurchaseOrderId.eq(po.id))
            .into_tuple()
            .all(txn)
            .await
            .map_err(ServiceError::db_error)?;

        if !line_ids.is_empty() {
            let receipts = goods_receipt_line::Entity::find()
                .filter(goods_receipt_line::Column::PurchaseOrderLineId.is_in(line_ids))
                .count(txn)
                .await
                .map_err(ServiceError::db_error)?;
            if receipts > 0 {
                return Err(ServiceError::ReferencedEntityProtected(format!(
                    "{}: {} goods receipt line(s) reference its lines",
                    po.number(),
                    receipts
                )));
            }
        }

        let number = po.number();
        po.delete(txn).await.map_err(ServiceError::db_error)?;

        tx.commit().await?;
        Ok(number)
    }
}
