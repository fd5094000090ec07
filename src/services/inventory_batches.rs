//! Inventory Batch Store: append-only stock records created by goods
//! receipt closure, one per receipt line.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};
use sea_orm::sea_query::JoinType;
use tracing::debug;

use crate::entities::{goods_receipt, goods_receipt_line, inventory_batch};
use crate::errors::ServiceError;

/// Lot number for a batch: the line's own lot number when it has one,
/// otherwise `{GRV number}-{LINE number}`.
pub fn lot_number_for(grv: &goods_receipt::Model, line: &goods_receipt_line::Model) -> String {
    match line.lot_number.as_deref().map(str::trim) {
        Some(lot) if !lot.is_empty() => lot.to_string(),
        _ => format!("{}-{}", grv.number(), line.number()),
    }
}

/// Inserts one batch per line, in line order.
///
/// Every line must carry an expiry date; callers check this before writing
/// anything else.
pub async fn create_batches_for_lines<C: ConnectionTrait>(
    conn: &C,
    grv: &goods_receipt::Model,
    lines: &[goods_receipt_line::Model],
) -> Result<Vec<inventory_batch::Model>, ServiceError> {
    let now = Utc::now();
    let mut batches = Vec::with_capacity(lines.len());

    for line in lines {
        let expiry_date = line.expiry_date.ok_or_else(|| ServiceError::MissingExpiryDates {
            goods_receipt: grv.number(),
            lines: vec![line.number()],
        })?;

        let batch = inventory_batch::ActiveModel {
            goods_receipt_line_id: Set(Some(line.id)),
            product_id: Set(line.product_id),
            warehouse_id: Set(grv.warehouse_id),
            quantity: Set(line.quantity),
            expiry_date: Set(expiry_date),
            lot_number: Set(lot_number_for(grv, line)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(ServiceError::db_error)?;

        debug!(
            batch_id = batch.id,
            goods_receipt_line_id = line.id,
            "Inventory batch created"
        );
        batches.push(batch);
    }

    Ok(batches)
}

pub async fn line_has_batch<C: ConnectionTrait>(
    conn: &C,
    goods_receipt_line_id: i64,
) -> Result<bool, ServiceError> {
    let count = inventory_batch::Entity::find()
        .filter(inventory_batch::Column::GoodsReceiptLineId.eq(goods_receipt_line_id))
        .count(conn)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(count > 0)
}

/// Batches created from the lines of one goods receipt.
pub async fn batches_for_goods_receipt<C: ConnectionTrait>(
    conn: &C,
    goods_receipt_id: i64,
) -> Result<Vec<inventory_batch::Model>, ServiceError> {
    inventory_batch::Entity::find()
        .join(
            JoinType::InnerJoin,
            inventory_batch::Relation::GoodsReceiptLine.def(),
        )
        .filter(goods_receipt_line::Column::GoodsReceiptId.eq(goods_receipt_id))
        .order_by_asc(inventory_batch::Column::Id)
        .all(conn)
        .await
        .map_err(ServiceError::db_error)
}

/// Batches of a product, optionally restricted to one warehouse, oldest expiry first.
pub async fn batches_for_product<C: ConnectionTrait>(
    conn: &C,
    product_id: i64,
    warehouse_id: Option<i64>,
) -> Result<Vec<inventory_batch::Model>, ServiceError> {
    let mut query = inventory_batch::Entity::find()
        .filter(inventory_batch::Column::ProductId.eq(product_id));
    if let Some(warehouse_id) = warehouse_id {
        query = query.filter(inventory_batch::Column::WarehouseId.eq(warehouse_id));
    }

    query
        .order_by_asc(inventory_batch::Column::ExpiryDate)
        .order_by_asc(inventory_batch::Column::Id)
        .all(conn)
        .await
        .map_err(ServiceError::db_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::GoodsReceiptStatus;
    use rust_decimal_macros::dec;

    fn grv() -> goods_receipt::Model {
        goods_receipt::Model {
            id: 7,
            purchase_order_id: None,
            supplier_id: 1,
            warehouse_id: 1,
            received_at: Utc::now(),
            status: GoodsReceiptStatus::Draft,
            reference: String::new(),
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(lot_number: Option<&str>) -> goods_receipt_line::Model {
        goods_receipt_line::Model {
            id: 12,
            goods_receipt_id: 7,
            purchase_order_line_id: None,
            product_id: 3,
            quantity: dec!(5),
            expiry_date: None,
            unit_price: dec!(1.50),
            lot_number: lot_number.map(str::to_string),
        }
    }

    #[test]
    fn lot_number_defaults_to_document_numbers() {
        assert_eq!(lot_number_for(&grv(), &line(None)), "GRV000007-LINE000012");
        assert_eq!(lot_number_for(&grv(), &line(Some("  "))), "GRV000007-LINE000012");
    }

    #[test]
    fn explicit_lot_number_wins() {
        assert_eq!(lot_number_for(&grv(), &line(Some("LOT-A1"))), "LOT-A1");
    }
}
