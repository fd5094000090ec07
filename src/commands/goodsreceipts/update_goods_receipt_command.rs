use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    commands::{observe, Command},
    db::{DbPool, TrackedTransaction},
    entities::{goods_receipt, goods_receipt_line, GoodsReceiptStatus, PurchaseOrderStatus},
    errors::ServiceError,
    events::{BatchSummary, Event, EventSender},
    metrics::{GRV_CLOSURES, INVENTORY_BATCHES_CREATED, PO_AUTO_RECEIVED},
    services::{
        closure::{self, ClosureOutcome},
        lookup,
    },
    workflow::{validate_transition, DocumentStatus},
};

const OPERATION: &str = "update_goods_receipt";

/// Changes header fields and/or the status of a goods receipt.
///
/// Moving a draft to `closed` runs the closure cascade in the same
/// transaction as the header write.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateGoodsReceiptCommand {
    pub id: i64,
    pub supplier_id: Option<i64>,
    pub warehouse_id: Option<i64>,
    pub received_at: Option<DateTime<Utc>>,
    #[validate(length(max = 100))]
    pub reference: Option<String>,
    pub status: Option<GoodsReceiptStatus>,
}

#[derive(Debug, Clone)]
pub struct UpdateGoodsReceiptResult {
    pub goods_receipt: goods_receipt::Model,
    pub changed_fields: Vec<String>,
    pub previous_status: GoodsReceiptStatus,
    /// Set when this update closed the receipt.
    pub closure: Option<ClosureOutcome>,
}

impl UpdateGoodsReceiptResult {
    pub fn status_changed(&self) -> bool {
        self.previous_status != self.goods_receipt.status
    }
}

#[async_trait]
impl Command for UpdateGoodsReceiptCommand {
    type Result = UpdateGoodsReceiptResult;

    #[instrument(skip(self, db_pool, event_sender), fields(goods_receipt_id = self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let result = observe(OPERATION, self.update(&db_pool).await)?;
        let grv = &result.goods_receipt;

        if !result.changed_fields.is_empty() {
            info!(goods_receipt = %grv.number(), fields = ?result.changed_fields, "Goods receipt updated");
            event_sender.send_or_log(Event::GoodsReceiptUpdated {
                goods_receipt_id: grv.id,
            });
        }
        if result.status_changed() {
            event_sender.send_or_log(Event::GoodsReceiptStatusChanged {
                goods_receipt_id: grv.id,
                old_status: result.previous_status,
                new_status: grv.status,
            });
        }
        if let Some(outcome) = &result.closure {
            publish_closure(&event_sender, outcome);
        }

        Ok(result)
    }
}

fn publish_closure(event_sender: &EventSender, outcome: &ClosureOutcome) {
    let grv = &outcome.goods_receipt;

    GRV_CLOSURES.inc();
    INVENTORY_BATCHES_CREATED.inc_by(outcome.batches.len() as u64);

    event_sender.send_or_log(Event::GoodsReceiptClosed {
        goods_receipt_id: grv.id,
        batches: outcome.batches.len(),
        purchase_order_received: outcome.purchase_order_received.as_ref().map(|po| po.id),
    });

    if !outcome.batches.is_empty() {
        event_sender.send_or_log(Event::InventoryBatchesCreated {
            goods_receipt_id: grv.id,
            warehouse_id: grv.warehouse_id,
            batches: outcome.batches.iter().map(BatchSummary::from).collect(),
        });
    }

    if let Some(po) = &outcome.purchase_order_received {
        PO_AUTO_RECEIVED.inc();
        event_sender.send_or_log(Event::PurchaseOrderStatusChanged {
            purchase_order_id: po.id,
            // submitted is the only status that may move to received
            old_status: PurchaseOrderStatus::Submitted,
            new_status: po.status,
        });
    }
}

impl UpdateGoodsReceiptCommand {
    /// Names of the header fields this command would change on `persisted`.
    pub fn changed_fields(&self, persisted: &goods_receipt::Model) -> Vec<String> {
        let mut changed = Vec::new();
        if self.supplier_id.map_or(false, |v| v != persisted.supplier_id) {
            changed.push("supplier_id".to_string());
        }
        if self.warehouse_id.map_or(false, |v| v != persisted.warehouse_id) {
            changed.push("warehouse_id".to_string());
        }
        if self.received_at.map_or(false, |v| v != persisted.received_at) {
            changed.push("received_at".to_string());
        }
        if self
            .reference
            .as_ref()
            .map_or(false, |v| *v != persisted.reference)
        {
            changed.push("reference".to_string());
        }
        changed
    }

    async fn update(&self, db: &DbPool) -> Result<UpdateGoodsReceiptResult, ServiceError> {
        self.validate()?;

        let tx = TrackedTransaction::begin(db, OPERATION).await?;
        let txn = tx.conn();

        let persisted = lookup::lock_goods_receipt(txn, self.id).await?;
        let new_status = self.status.unwrap_or(persisted.status);
        validate_transition(
            persisted.status,
            new_status,
            GoodsReceiptStatus::transitions(),
        )?;

        let changed_fields = self.changed_fields(&persisted);
        if !persisted.is_draft() && !changed_fields.is_empty() {
            return Err(ServiceError::ImmutableFieldChanged {
                document: persisted.number(),
                fields: changed_fields,
            });
        }

        let previous_status = persisted.status;
        if changed_fields.is_empty() && new_status == previous_status {
            return Ok(UpdateGoodsReceiptResult {
                goods_receipt: persisted,
                changed_fields,
                previous_status,
                closure: None,
            });
        }

        let mut active: goods_receipt::ActiveModel = persisted.clone().into();
        if let Some(supplier_id) = self.supplier_id {
            lookup::require_supplier(txn, supplier_id).await?;
            active.supplier_id = Set(supplier_id);
        }
        if let Some(warehouse_id) = self.warehouse_id {
            lookup::require_warehouse(txn, warehouse_id).await?;
            active.warehouse_id = Set(warehouse_id);
        }
        if let Some(received_at) = self.received_at {
            active.received_at = Set(received_at);
        }
        if let Some(reference) = &self.reference {
            active.reference = Set(reference.clone());
        }

        let (goods_receipt, closure) = if new_status == GoodsReceiptStatus::Closed
            && previous_status == GoodsReceiptStatus::Draft
        {
            let lines = goods_receipt_line::Entity::find()
                .filter(goods_receipt_line::Column::GoodsReceiptId.eq(persisted.id))
                .order_by_asc(goods_receipt_line::Column::Id)
                .all(txn)
                .await
                .map_err(ServiceError::db_error)?;
            let outcome = closure::close_goods_receipt(txn, &persisted, active, &lines).await?;
            (outcome.goods_receipt.clone(), Some(outcome))
        } else {
            active.status = Set(new_status);
            active.updated_at = Set(Utc::now());
            let grv = active.update(txn).await.map_err(ServiceError::db_error)?;
            (grv, None)
        };

        tx.commit().await?;
        Ok(UpdateGoodsReceiptResult {
            goods_receipt,
            changed_fields,
            previous_status,
            closure,
        })
    }
}
