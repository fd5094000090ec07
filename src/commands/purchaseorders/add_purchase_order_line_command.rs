use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use super::{create_purchase_order_command::insert_line, lock_draft_parent, PurchaseOrderLineInput};
use crate::{
    commands::{observe, Command},
    db::{DbPool, TrackedTransaction},
    entities::purchase_order_line,
    errors::ServiceError,
    events::{Event, EventSender},
};

const OPERATION: &str = "add_purchase_order_line";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddPurchaseOrderLineCommand {
    pub purchase_order_id: i64,
    pub line: PurchaseOrderLineInput,
}

#[async_trait]
impl Command for AddPurchaseOrderLineCommand {
    type Result = purchase_order_line::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(purchase_order_id = self.purchase_order_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let line = observe(OPERATION, self.add(&db_pool).await)?;

        info!(line = %line.id, "Purchase order line added");
        event_sender.send_or_log(Event::PurchaseOrderLineAdded {
            purchase_order_id: self.purchase_order_id,
            line_id: line.id,
        });
        Ok(line)
    }
}

impl AddPurchaseOrderLineCommand {
    async fn add(&self, db: &DbPool) -> Result<purchase_order_line::Model, ServiceError> {
        self.line.validate()?;

        let tx = TrackedTransaction::begin(db, OPERATION).await?;
        let txn = tx.conn();

        lock_draft_parent(txn, self.purchase_order_id).await?;
        let line = insert_line(txn, self.purchase_order_id, &self.line).await?;

        tx.commit().await?;
        Ok(line)
    }
}
