use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    commands::{observe, validate_amount, Command},
    db::{DbPool, TrackedTransaction},
    entities::{purchase_order, purchase_order_line, PurchaseOrderStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    services::lookup,
};

const OPERATION: &str = "create_purchase_order";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PurchaseOrderLineInput {
    pub product_id: i64,
    #[validate(custom = "validate_amount")]
    pub quantity: Decimal,
    #[validate(custom = "validate_amount")]
    pub unit_price: Decimal,
}

/// Creates a purchase order in `draft`, optionally with its first lines.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePurchaseOrderCommand {
    pub supplier_id: i64,
    pub warehouse_id: i64,
    pub ordered_at: DateTime<Utc>,
    pub expected_at: DateTime<Utc>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub reference: String,
    #[serde(default)]
    pub lines: Vec<PurchaseOrderLineInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePurchaseOrderResult {
    pub purchase_order: purchase_order::Model,
    pub lines: Vec<purchase_order_line::Model>,
}

#[async_trait]
impl Command for CreatePurchaseOrderCommand {
    type Result = CreatePurchaseOrderResult;

    #[instrument(skip(self, db_pool, event_sender), fields(supplier_id = self.supplier_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let created = observe(OPERATION, self.create(&db_pool).await)?;

        info!(purchase_order = %created.purchase_order.number(), "Purchase order created");
        event_sender.send_or_log(Event::PurchaseOrderCreated {
            purchase_order_id: created.purchase_order.id,
        });
        for line in &created.lines {
            event_sender.send_or_log(Event::PurchaseOrderLineAdded {
                purchase_order_id: created.purchase_order.id,
                line_id: line.id,
            });
        }

        Ok(created)
    }
}

impl CreatePurchaseOrderCommand {
    async fn create(&self, db: &DbPool) -> Result<CreatePurchaseOrderResult, ServiceError> {
        self.validate()?;
        for line in &self.lines {
            line.validate()?;
        }

        let tx = TrackedTransaction::begin(db, OPERATION).await?;
        let txn = tx.conn();

        lookup::require_supplier(txn, self.supplier_id).await?;
        lookup::require_warehouse(txn, self.warehouse_id).await?;

        let now = Utc::now();
        let purchase_order = purchase_order::ActiveModel {
            supplier_id: Set(self.supplier_id),
            warehouse_id: Set(self.warehouse_id),
            ordered_at: Set(self.ordered_at),
            expected_at: Set(self.expected_at),
            status: Set(PurchaseOrderStatus::Draft),
            reference: Set(self.reference.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(ServiceError::db_error)?;

        let mut lines = Vec::with_capacity(self.lines.len());
        for input in &self.lines {
            lines.push(insert_line(txn, purchase_order.id, input).await?);
        }

        tx.commit().await?;
        Ok(CreatePurchaseOrderResult {
            purchase_order,
            lines,
        })
    }
}

/// Inserts a line on a purchase order the caller has already checked is a draft.
pub(crate) async fn insert_line<C: ConnectionTrait>(
    conn: &C,
    purchase_order_id: i64,
    input: &PurchaseOrderLineInput,
) -> Result<purchase_order_line::Model, ServiceError> {
    lookup::require_product(conn, input.product_id).await?;

    purchase_order_line::ActiveModel {
        purchase_order_id: Set(purchase_order_id),
        product_id: Set(input.product_id),
        quantity: Set(input.quantity),
        unit_price: Set(input.unit_price),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(ServiceError::db_error)
}
