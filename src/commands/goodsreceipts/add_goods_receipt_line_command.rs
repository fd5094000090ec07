use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use super::create_goods_receipt_command::{insert_line, GoodsReceiptLineInput};
use super::{check_po_line_link, lock_draft_parent};
use crate::{
    commands::{observe, Command},
    db::{DbPool, TrackedTransaction},
    entities::goods_receipt_line,
    errors::ServiceError,
    events::{Event, EventSender},
};

const OPERATION: &str = "add_goods_receipt_line";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddGoodsReceiptLineCommand {
    pub goods_receipt_id: i64,
    pub line: GoodsReceiptLineInput,
}

#[async_trait]
impl Command for AddGoodsReceiptLineCommand {
    type Result = goods_receipt_line::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(goods_receipt_id = self.goods_receipt_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let line = observe(OPERATION, self.add(&db_pool).await)?;

        info!(line = %line.number(), "Goods receipt line added");
        event_sender.send_or_log(Event::GoodsReceiptLineAdded {
            goods_receipt_id: self.goods_receipt_id,
            line_id: line.id,
        });
        Ok(line)
    }
}

impl AddGoodsReceiptLineCommand {
    async fn add(&self, db: &DbPool) -> Result<goods_receipt_line::Model, ServiceError> {
        let tx = TrackedTransaction::begin(db, OPERATION).await?;
        let txn = tx.conn();

        let grv = lock_draft_parent(txn, self.goods_receipt_id).await?;
        self.line.validate()?;
        if let Some(purchase_order_line_id) = self.line.purchase_order_line_id {
            check_po_line_link(txn, &grv, purchase_order_line_id).await?;
        }

        let line = insert_line(txn, grv.id, &self.line).await?;

        tx.commit().await?;
        Ok(line)
    }
}
