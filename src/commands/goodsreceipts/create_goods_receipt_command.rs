use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    commands::{observe, validate_amount, Command},
    db::{DbPool, TrackedTransaction},
    entities::{goods_receipt, goods_receipt_line, GoodsReceiptStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    services::lookup,
};

const OPERATION: &str = "create_goods_receipt";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GoodsReceiptLineInput {
    pub purchase_order_line_id: Option<i64>,
    pub product_id: i64,
    #[validate(custom = "validate_amount")]
    pub quantity: Decimal,
    pub expiry_date: Option<NaiveDate>,
    #[validate(custom = "validate_amount")]
    pub unit_price: Decimal,
    #[validate(length(max = 100))]
    pub lot_number: Option<String>,
}

/// Creates a goods receipt with no purchase order behind it.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateGoodsReceiptCommand {
    pub supplier_id: i64,
    pub warehouse_id: i64,
    pub received_at: DateTime<Utc>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub reference: String,
    #[validate(length(max = 150))]
    pub created_by: Option<String>,
    #[serde(default)]
    pub lines: Vec<GoodsReceiptLineInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGoodsReceiptResult {
    pub goods_receipt: goods_receipt::Model,
    pub lines: Vec<goods_receipt_line::Model>,
}

#[async_trait]
impl Command for CreateGoodsReceiptCommand {
    type Result = CreateGoodsReceiptResult;

    #[instrument(skip(self, db_pool, event_sender), fields(supplier_id = self.supplier_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let created = observe(OPERATION, self.create(&db_pool).await)?;

        info!(goods_receipt = %created.goods_receipt.number(), "Goods receipt created");
        event_sender.send_or_log(Event::GoodsReceiptCreated {
            goods_receipt_id: created.goods_receipt.id,
            purchase_order_id: None,
            line_count: created.lines.len(),
        });
        Ok(created)
    }
}

impl CreateGoodsReceiptCommand {
    async fn create(&self, db: &DbPool) -> Result<CreateGoodsReceiptResult, ServiceError> {
        self.validate()?;
        for line in &self.lines {
            line.validate()?;
            if line.purchase_order_line_id.is_some() {
                return Err(ServiceError::ValidationError(
                    "purchase_order_line_id: a goods receipt without a purchase order cannot fulfil purchase order lines".to_string(),
                ));
            }
        }

        let tx = TrackedTransaction::begin(db, OPERATION).await?;
        let txn = tx.conn();

        lookup::require_supplier(txn, self.supplier_id).await?;
        lookup::require_warehouse(txn, self.warehouse_id).await?;

        let goods_receipt = insert_header(
            txn,
            None,
            self.supplier_id,
            self.warehouse_id,
            self.received_at,
            &self.reference,
            self.created_by.clone(),
        )
        .await?;

        let mut lines = Vec::with_capacity(self.lines.len());
        for input in &self.lines {
            lines.push(insert_line(txn, goods_receipt.id, input).await?);
        }

        tx.commit().await?;
        Ok(CreateGoodsReceiptResult {
            goods_receipt,
            lines,
        })
    }
}

pub(crate) async fn insert_header<C: ConnectionTrait>(
    conn: &C,
    purchase_order_id: Option<i64>,
    supplier_id: i64,
    warehouse_id: i64,
    received_at: DateTime<Utc>,
    reference: &str,
    created_by: Option<String>,
) -> Result<goods_receipt::Model, ServiceError> {
    let now = Utc::now();
    goods_receipt::ActiveModel {
        purchase_order_id: Set(purchase_order_id),
        supplier_id: Set(supplier_id),
        warehouse_id: Set(warehouse_id),
        received_at: Set(received_at),
        status: Set(GoodsReceiptStatus::Draft),
        reference: Set(reference.to_string()),
        created_by: Set(created_by),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(ServiceError::db_error)
}

/// Inserts a line on a goods receipt the caller has already checked is a
/// draft and, for linked lines, that the link is allowed.
pub(crate) async fn insert_line<C: ConnectionTrait>(
    conn: &C,
    goods_receipt_id: i64,
    input: &GoodsReceiptLineInput,
) -> Result<goods_receipt_line::Model, ServiceError> {
    lookup::require_product(conn, input.product_id).await?;

    goods_receipt_line::ActiveModel {
        goods_receipt_id: Set(goods_receipt_id),
        purchase_order_line_id: Set(input.purchase_order_line_id),
        product_id: Set(input.product_id),
        quantity: Set(input.quantity),
        expiry_date: Set(input.expiry_date),
        unit_price: Set(input.unit_price),
        lot_number: Set(input.lot_number.clone()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(ServiceError::db_error)
}
