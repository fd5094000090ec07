use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    commands::{observe, Command},
    db::{DbPool, TrackedTransaction},
    entities::{purchase_order, PurchaseOrderStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    services::lookup,
    workflow::{validate_transition, DocumentStatus},
};

const OPERATION: &str = "update_purchase_order";

/// Changes header fields and/or the status of a purchase order.
///
/// `None` leaves a field as persisted. Header fields may only change while
/// the persisted order is a draft; the status follows the transition table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePurchaseOrderCommand {
    pub id: i64,
    pub supplier_id: Option<i64>,
    pub warehouse_id: Option<i64>,
    pub ordered_at: Option<DateTime<Utc>>,
    pub expected_at: Option<DateTime<Utc>>,
    #[validate(length(max = 100))]
    pub reference: Option<String>,
    pub status: Option<PurchaseOrderStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePurchaseOrderResult {
    pub purchase_order: purchase_order::Model,
    pub changed_fields: Vec<String>,
    pub previous_status: PurchaseOrderStatus,
}

impl UpdatePurchaseOrderResult {
    pub fn status_changed(&self) -> bool {
        self.previous_status != self.purchase_order.status
    }
}

#[async_trait]
impl Command for UpdatePurchaseOrderCommand {
    type Result = UpdatePurchaseOrderResult;

    #[instrument(skip(self, db_pool, event_sender), fields(purchase_order_id = self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let result = observe(OPERATION, self.update(&db_pool).await)?;
        let po = &result.purchase_order;

        if !result.changed_fields.is_empty() {
            info!(purchase_order = %po.number(), fields = ?result.changed_fields, "Purchase order updated");
            event_sender.send_or_log(Event::PurchaseOrderUpdated {
                purchase_order_id: po.id,
            });
        }
        if result.status_changed() {
            info!(
                purchase_order = %po.number(),
                from = %result.previous_status,
                to = %po.status,
                "Purchase order status changed"
            );
            event_sender.send_or_log(Event::PurchaseOrderStatusChanged {
                purchase_order_id: po.id,
                old_status: result.previous_status,
                new_status: po.status,
            });
        }

        Ok(result)
    }
}

impl UpdatePurchaseOrderCommand {
    /// Names of the header fields this command would change on `persisted`.
    pub fn changed_fields(&self, persisted: &purchase_order::Model) -> Vec<String> {
        let mut changed = Vec::new();
        if self.supplier_id.map_or(false, |v| v != persisted.supplier_id) {
            changed.push("supplier_id".to_string());
        }
        if self.warehouse_id.map_or(false, |v| v != persisted.warehouse_id) {
            changed.push("warehouse_id".to_string());
        }
        if self.ordered_at.map_or(false, |v| v != persisted.ordered_at) {
            changed.push("ordered_at".to_string());
        }
        if self.expected_at.map_or(false, |v| v != persisted.expected_at) {
            changed.push("expected_at".to_string());
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

    async fn update(&self, db: &DbPool) -> Result<UpdatePurchaseOrderResult, ServiceError> {
        self.validate()?;

        let tx = TrackedTransaction::begin(db, OPERATION).await?;
        let txn = tx.conn();

        let persisted = lookup::lock_purchase_order(txn, self.id).await?;
        let new_status = self.status.unwrap_or(persisted.status);
        validate_transition(
            persisted.status,
            new_status,
            PurchaseOrderStatus::transitions(),
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
            return Ok(UpdatePurchaseOrderResult {
                purchase_order: persisted,
                changed_fields,
                previous_status,
            });
        }

        let mut active: purchase_order::ActiveModel = persisted.into();
        if let Some(supplier_id) = self.supplier_id {
            lookup::require_supplier(txn, supplier_id).await?;
            active.supplier_id = Set(supplier_id);
        }
        if let Some(warehouse_id) = self.warehouse_id {
            lookup::require_warehouse(txn, warehouse_id).await?;
            active.warehouse_id = Set(warehouse_id);
        }
        if let Some(ordered_at) = self.ordered_at {
            active.ordered_at = Set(ordered_at);
        }
        if let Some(expected_at) = self.expected_at {
            active.expected_at = Set(expected_at);
        }
        if let Some(reference) = &self.reference {
            active.reference = Set(reference.clone());
        }
        active.status = Set(new_status);
        active.updated_at = Set(Utc::now());

        let purchase_order = active
            .update(txn)
            .await
            .map_err(ServiceError::db_error)?;

        tx.commit().await?;
        Ok(UpdatePurchaseOrderResult {
            purchase_order,
            changed_fields,
            previous_status,
        })
    }
}
