use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use super::{check_po_line_link, line_of, lock_draft_parent};
use crate::{
    commands::{observe, validate_amount, Command},
    db::{DbPool, TrackedTransaction},
    entities::goods_receipt_line,
    errors::ServiceError,
    events::{Event, EventSender},
    services::lookup,
};

const OPERATION: &str = "update_goods_receipt_line";

/// Edits a line of a draft goods receipt. `None` keeps the stored value.
///
/// Setting `expiry_date` is how a line becomes ready for closure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateGoodsReceiptLineCommand {
    pub goods_receipt_id: i64,
    pub line_id: i64,
    pub purchase_order_line_id: Option<i64>,
    pub product_id: Option<i64>,
    #[validate(custom = "validate_amount")]
    pub quantity: Option<Decimal>,
    pub expiry_date: Option<NaiveDate>,
    #[validate(custom = "validate_amount")]
    pub unit_price: Option<Decimal>,
    #[validate(length(max = 100))]
    pub lot_number: Option<String>,
}

#[async_trait]
impl Command for UpdateGoodsReceiptLineCommand {
    type Result = goods_receipt_line::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(goods_receipt_id = self.goods_receipt_id, line_id = self.line_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let line = observe(OPERATION, self.update(&db_pool).await)?;

        info!(line = %line.number(), "Goods receipt line updated");
        event_sender.send_or_log(Event::GoodsReceiptLineUpdated {
            goods_receipt_id: self.goods_receipt_id,
            line_id: line.id,
        });
        Ok(line)
    }
}

impl UpdateGoodsReceiptLineCommand {
    async fn update(&self, db: &DbPool) -> Result<goods_receipt_line::Model, ServiceError> {
        let tx = TrackedTransaction::begin(db, OPERATION).await?;
        let txn = tx.conn();

        let grv = lock_draft_parent(txn, self.goods_receipt_id).await?;
        self.validate()?;
        let line = line_of(txn, &grv, self.line_id).await?;

        let mut active: goods_receipt_line::ActiveModel = line.into();
        if let Some(purchase_order_line_id) = self.purchase_order_line_id {
            check_po_line_link(txn, &grv, purchase_order_line_id).await?;
            active.purchase_order_line_id = Set(Some(purchase_order_line_id));
        }
        if let Some(product_id) = self.product_id {
            lookup::require_product(txn, product_id).await?;
            active.product_id = Set(product_id);
        }
        if let Some(quantity) = self.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(expiry_date) = self.expiry_date {
            active.expiry_date = Set(Some(expiry_date));
        }
        if let Some(unit_price) = self.unit_price {
            active.unit_price = Set(unit_price);
        }
        if let Some(lot_number) = &self.lot_number {
            active.lot_number = Set(Some(lot_number.clone()));
        }

        let line = active.update(txn).await.map_err(ServiceError::db_error)?;

        tx.commit().await?;
        Ok(line)
    }
}
