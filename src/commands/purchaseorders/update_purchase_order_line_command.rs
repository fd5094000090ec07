use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use super::lock_draft_parent;
use crate::{
    commands::{observe, validate_amount, Command},
    db::{DbPool, TrackedTransaction},
    entities::purchase_order_line,
    errors::ServiceError,
    events::{Event, EventSender},
    services::lookup,
};

const OPERATION: &str = "update_purchase_order_line";

/// Edits a line of a draft purchase order. `None` keeps the persisted value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePurchaseOrderLineCommand {
    pub purchase_order_id: i64,
    pub line_id: i64,
    pub product_id: Option<i64>,
    #[validate(custom = "validate_amount")]
    pub quantity: Option<Decimal>,
    #[validate(custom = "validate_amount")]
    pub unit_price: Option<Decimal>,
}

#[async_trait]
impl Command for UpdatePurchaseOrderLineCommand {
    type Result = purchase_order_line::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(line_id = self.line_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let line = observe(OPERATION, self.update(&db_pool).await)?;

        info!(line_id = line.id, "Purchase order line updated");
        event_sender.send_or_log(Event::PurchaseOrderLineUpdated {
            purchase_order_id: line.purchase_order_id,
            line_id: line.id,
        });
        Ok(line)
    }
}

impl UpdatePurchaseOrderLineCommand {
    async fn update(&self, db: &DbPool) -> Result<purchase_order_line::Model, ServiceError> {
        self.validate()?;

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

        let mut active: purchase_order_line::ActiveModel = line.into();
        if let Some(product_id) = self.product_id {
            lookup::require_product(txn, product_id).await?;
            active.product_id = Set(product_id);
        }
        if let Some(quantity) = self.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(unit_price) = self.unit_price {
            active.unit_price = Set(unit_price);
        }

        let line = active.update(txn).await.map_err(ServiceError::db_error)?;

        tx.commit().await?;
        Ok(line)
    }
}
