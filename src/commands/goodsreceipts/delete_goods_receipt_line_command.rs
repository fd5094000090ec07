use async_trait::async_trait;
use sea_orm::ModelTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use super::{line_of, lock_draft_parent};
use crate::{
    commands::{observe, Command},
    db::{DbPool, TrackedTransaction},
    errors::ServiceError,
    events::{Event, EventSender},
    services::inventory_batches,
};

const OPERATION: &str = "delete_goods_receipt_line";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DeleteGoodsReceiptLineCommand {
    pub goods_receipt_id: i64,
    pub line_id: i64,
}

#[async_trait]
impl Command for DeleteGoodsReceiptLineCommand {
    type Result = ();

    #[instrument(skip(self, db_pool, event_sender), fields(goods_receipt_id = self.goods_receipt_id, line_id = self.line_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        observe(OPERATION, self.delete(&db_pool).await)?;

        info!(line_id = self.line_id, "Goods receipt line removed");
        event_sender.send_or_log(Event::GoodsReceiptLineRemoved {
            goods_receipt_id: self.goods_receipt_id,
            line_id: self.line_id,
        });
        Ok(())
    }
}

impl DeleteGoodsReceiptLineCommand {
    async fn delete(&self, db: &DbPool) -> Result<(), ServiceError> {
        let tx = TrackedTransaction::begin(db, OPERATION).await?;
        let txn = tx.conn();

        let grv = lock_draft_parent(txn, self.goods_receipt_id).await?;
        let line = line_of(txn, &grv, self.line_id).await?;

        if inventory_batches::line_has_batch(txn, line.id).await? {
            return Err(ServiceError::ReferencedEntityProtected(format!(
                "{} (an inventory batch was created from it)",
                line.number()
            )));
        }

        line.delete(txn).await.map_err(ServiceError::db_error)?;

        tx.commit().await?;
        Ok(())
    }
}
