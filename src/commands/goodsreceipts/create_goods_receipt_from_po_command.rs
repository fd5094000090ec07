use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use validator::Validate;

use super::create_goods_receipt_command::{
    insert_header, insert_line, CreateGoodsReceiptResult, GoodsReceiptLineInput,
};
use crate::{
    commands::{observe, Command},
    db::{DbPool, TrackedTransaction},
    entities::{purchase_order_line, PurchaseOrderStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{ledger, lookup},
};

const OPERATION: &str = "create_goods_receipt_from_po";

/// Receives against a submitted purchase order.
///
/// Supplier and warehouse come from the order; one line is generated per
/// order line that still has quantity outstanding for receipt, without an
/// expiry date.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateGoodsReceiptFromPoCommand {
    pub purchase_order_id: i64,
    pub received_at: DateTime<Utc>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub reference: String,
    #[validate(length(max = 150))]
    pub created_by: Option<String>,
}

#[async_trait]
impl Command for CreateGoodsReceiptFromPoCommand {
    type Result = CreateGoodsReceiptResult;

    #[instrument(skip(self, db_pool, event_sender), fields(purchase_order_id = self.purchase_order_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let created = observe(OPERATION, self.create(&db_pool).await)?;

        info!(
            goods_receipt = %created.goods_receipt.number(),
            lines = created.lines.len(),
            "Goods receipt created from purchase order"
        );
        event_sender.send_or_log(Event::GoodsReceiptCreated {
            goods_receipt_id: created.goods_receipt.id,
            purchase_order_id: Some(self.purchase_order_id),
            line_count: created.lines.len(),
        });
        Ok(created)
    }
}

impl CreateGoodsReceiptFromPoCommand {
    async fn create(&self, db: &DbPool) -> Result<CreateGoodsReceiptResult, ServiceError> {
        self.validate()?;

        let tx = TrackedTransaction::begin(db, OPERATION).await?;
        let txn = tx.conn();

        let po = lookup::lock_purchase_order(txn, self.purchase_order_id).await?;
        if po.status != PurchaseOrderStatus::Submitted {
            return Err(ServiceError::POStatusNotSubmitted {
                purchase_order: po.number(),
                status: po.status.to_string(),
            });
        }

        let goods_receipt = insert_header(
            txn,
            Some(po.id),
            po.supplier_id,
            po.warehouse_id,
            self.received_at,
            &self.reference,
            self.created_by.clone(),
        )
        .await?;

        let po_lines = purchase_order_line::Entity::find()
            .filter(purchase_order_line::Column::PurchaseOrderId.eq(po.id))
            .order_by_asc(purchase_order_line::Column::Id)
            .all(txn)
            .await
            .map_err(ServiceError::db_error)?;
        let ledger = ledger::load_purchase_order_ledger(txn, po.id).await?;

        let mut lines = Vec::new();
        for po_line in &po_lines {
            let outstanding = ledger
                .line(po_line.id)
                .map(|l| l.outstanding_for_receipt())
                .unwrap_or(po_line.quantity);
            if outstanding <= Decimal::ZERO {
                debug!(purchase_order_line_id = po_line.id, "Nothing outstanding, skipped");
                continue;
            }

            let input = GoodsReceiptLineInput {
                purchase_order_line_id: Some(po_line.id),
                product_id: po_line.product_id,
                quantity: outstanding,
                expiry_date: None,
                unit_price: po_line.unit_price,
                lot_number: None,
            };
            lines.push(insert_line(txn, goods_receipt.id, &input).await?);
        }

        tx.commit().await?;
        Ok(CreateGoodsReceiptResult {
            goods_receipt,
            lines,
        })
    }
}
