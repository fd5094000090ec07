//! Goods receipt closure: the draft to closed transition together with the
//! inventory batches and purchase order re-evaluation it triggers.
//!
//! Everything here runs on the caller's transaction. Any error leaves the
//! caller to drop that transaction, which discards the status write and every
//! batch inserted so far.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use tracing::{info, instrument};

use crate::entities::{
    goods_receipt, goods_receipt_line, inventory_batch, purchase_order, GoodsReceiptStatus,
    PurchaseOrderStatus,
};
use crate::errors::ServiceError;
use crate::services::{inventory_batches, ledger, lookup};
use crate::workflow::{validate_transition, DocumentStatus};

/// What a closure produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosureOutcome {
    pub goods_receipt: goods_receipt::Model,
    pub batches: Vec<inventory_batch::Model>,
    /// The linked purchase order, when this closure moved it to `received`.
    pub purchase_order_received: Option<purchase_order::Model>,
}

/// Numbers of the lines that still lack an expiry date.
pub fn lines_missing_expiry(lines: &[goods_receipt_line::Model]) -> Vec<String> {
    lines
        .iter()
        .filter(|line| line.expiry_date.is_none())
        .map(goods_receipt_line::Model::number)
        .collect()
}

/// Rejects closure while any line lacks an expiry date.
pub fn ensure_closable(
    grv: &goods_receipt::Model,
    lines: &[goods_receipt_line::Model],
) -> Result<(), ServiceError> {
    let missing = lines_missing_expiry(lines);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::MissingExpiryDates {
            goods_receipt: grv.number(),
            lines: missing,
        })
    }
}

/// Closes a draft goods receipt.
///
/// `changes` starts from the persisted row (`persisted`) with any header
/// edits from the same request already applied. Writes it with status
/// `closed`, creates one batch per line and moves the linked purchase order
/// to `received` once nothing on it is left to close.
#[instrument(skip_all, fields(goods_receipt_id = persisted.id))]
pub async fn close_goods_receipt<C: ConnectionTrait>(
    conn: &C,
    persisted: &goods_receipt::Model,
    mut changes: goods_receipt::ActiveModel,
    lines: &[goods_receipt_line::Model],
) -> Result<ClosureOutcome, ServiceError> {
    ensure_closable(persisted, lines)?;

    changes.status = Set(GoodsReceiptStatus::Closed);
    changes.updated_at = Set(Utc::now());
    let grv = changes
        .update(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let batches = inventory_batches::create_batches_for_lines(conn, &grv, lines).await?;

    let purchase_order_received = match grv.purchase_order_id {
        Some(purchase_order_id) => receive_if_complete(conn, purchase_order_id).await?,
        None => None,
    };

    info!(
        goods_receipt = %grv.number(),
        batches = batches.len(),
        purchase_order_received = purchase_order_received.is_some(),
        "Goods receipt closed"
    );

    Ok(ClosureOutcome {
        goods_receipt: grv,
        batches,
        purchase_order_received,
    })
}

/// Moves the purchase order to `received` when every line is covered by
/// closed receipts. Returns the updated order only if its status changed.
async fn receive_if_complete<C: ConnectionTrait>(
    conn: &C,
    purchase_order_id: i64,
) -> Result<Option<purchase_order::Model>, ServiceError> {
    let po = lookup::lock_purchase_order(conn, purchase_order_id).await?;
    let ledger = ledger::load_purchase_order_ledger(conn, po.id).await?;

    if !ledger.is_fully_received() || po.status == PurchaseOrderStatus::Received {
        return Ok(None);
    }

    validate_transition(
        po.status,
        PurchaseOrderStatus::Received,
        PurchaseOrderStatus::transitions(),
    )?;

    let mut active: purchase_order::ActiveModel = po.into();
    active.status = Set(PurchaseOrderStatus::Received);
    active.updated_at = Set(Utc::now());
    let po = active
        .update(conn)
        .await
        .map_err(ServiceError::db_error)?;

    info!(purchase_order = %po.number(), "Purchase order fully received");
    Ok(Some(po))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn grv() -> goods_receipt::Model {
        goods_receipt::Model {
            id: 2,
            purchase_order_id: None,
            supplier_id: 1,
            warehouse_id: 1,
            received_at: Utc::now(),
            status: GoodsReceiptStatus::Draft,
            reference: String::new(),
            created_by: Some("clerk".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(id: i64, expiry: Option<NaiveDate>) -> goods_receipt_line::Model {
        goods_receipt_line::Model {
            id,
            goods_receipt_id: 2,
            purchase_order_line_id: None,
            product_id: 1,
            quantity: dec!(1),
            expiry_date: expiry,
            unit_price: dec!(1),
            lot_number: None,
        }
    }

    #[test]
    fn lists_every_line_without_expiry() {
        let expiry = NaiveDate::from_ymd_opt(2030, 1, 1);
        let lines = vec![line(1, None), line(2, expiry), line(3, None)];
        assert_eq!(lines_missing_expiry(&lines), vec!["LINE000001", "LINE000003"]);
        assert_matches!(
            ensure_closable(&grv(), &lines),
            Err(ServiceError::MissingExpiryDates { ref goods_receipt, ref lines })
                if goods_receipt == "GRV000002" && lines.len() == 2
        );
    }

    #[test]
    fn receipt_without_lines_is_closable() {
        assert!(ensure_closable(&grv(), &[]).is_ok());
    }
}
