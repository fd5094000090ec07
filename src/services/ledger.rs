//! Outstanding-quantity accounting between purchase order lines and the
//! goods receipt lines that fulfil them.
//!
//! Nothing here is stored: every figure is derived from the ordered quantity
//! and the receipts currently recorded against a line.

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::HashMap;

use crate::entities::{
    goods_receipt, goods_receipt_line, purchase_order_line, GoodsReceiptStatus,
};
use crate::errors::ServiceError;

/// Receipt statuses that count against `outstanding_for_receipt`.
pub const RECEIPT_STATUSES: &[GoodsReceiptStatus] =
    &[GoodsReceiptStatus::Draft, GoodsReceiptStatus::Closed];

/// Receipt statuses that count against `outstanding_for_closure`.
pub const CLOSURE_STATUSES: &[GoodsReceiptStatus] = &[GoodsReceiptStatus::Closed];

/// One purchase order line and the receipts recorded against it.
#[derive(Debug, Clone, PartialEq)]
pub struct LineLedger {
    pub purchase_order_line_id: i64,
    pub ordered: Decimal,
    receipts: Vec<(GoodsReceiptStatus, Decimal)>,
}

impl LineLedger {
    pub fn new(purchase_order_line_id: i64, ordered: Decimal) -> Self {
        Self {
            purchase_order_line_id,
            ordered,
            receipts: Vec::new(),
        }
    }

    pub fn record_receipt(&mut self, status: GoodsReceiptStatus, quantity: Decimal) {
        self.receipts.push((status, quantity));
    }

    /// Sum of receipt quantities whose goods receipt status is in `statuses`.
    /// Cancelled receipts never count.
    pub fn received_with_status(&self, statuses: &[GoodsReceiptStatus]) -> Decimal {
        self.receipts
            .iter()
            .filter(|(status, _)| {
                *status != GoodsReceiptStatus::Cancelled && statuses.contains(status)
            })
            .map(|(_, quantity)| *quantity)
            .sum()
    }

    /// Quantity still available to put on a new goods receipt.
    pub fn outstanding_for_receipt(&self) -> Decimal {
        self.ordered - self.received_with_status(RECEIPT_STATUSES)
    }

    /// Quantity not yet covered by closed goods receipts.
    pub fn outstanding_for_closure(&self) -> Decimal {
        self.ordered - self.received_with_status(CLOSURE_STATUSES)
    }

    pub fn summary(&self) -> LineOutstanding {
        LineOutstanding {
            purchase_order_line_id: self.purchase_order_line_id,
            ordered: self.ordered,
            received_draft_or_closed: self.received_with_status(RECEIPT_STATUSES),
            received_closed: self.received_with_status(CLOSURE_STATUSES),
            outstanding_for_receipt: self.outstanding_for_receipt(),
            outstanding_for_closure: self.outstanding_for_closure(),
        }
    }
}

/// Serializable snapshot of a [`LineLedger`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineOutstanding {
    pub purchase_order_line_id: i64,
    pub ordered: Decimal,
    pub received_draft_or_closed: Decimal,
    pub received_closed: Decimal,
    pub outstanding_for_receipt: Decimal,
    pub outstanding_for_closure: Decimal,
}

/// Ledgers for every line of one purchase order, in line id order.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseOrderLedger {
    pub purchase_order_id: i64,
    lines: Vec<LineLedger>,
}

impl PurchaseOrderLedger {
    pub fn new(purchase_order_id: i64, lines: Vec<LineLedger>) -> Self {
        Self {
            purchase_order_id,
            lines,
        }
    }

    pub fn lines(&self) -> &[LineLedger] {
        &self.lines
    }

    pub fn line(&self, purchase_order_line_id: i64) -> Option<&LineLedger> {
        self.lines
            .iter()
            .find(|l| l.purchase_order_line_id == purchase_order_line_id)
    }

    /// True when no line has anything left to close. A purchase order
    /// without lines is trivially fully received.
    pub fn is_fully_received(&self) -> bool {
        self.lines
            .iter()
            .all(|line| line.outstanding_for_closure() <= Decimal::ZERO)
    }
}

/// Loads the ledger of every line on a purchase order.
pub async fn load_purchase_order_ledger<C: ConnectionTrait>(
    conn: &C,
    purchase_order_id: i64,
) -> Result<PurchaseOrderLedger, ServiceError> {
    let lines = purchase_order_line::Entity::find()
        .filter(purchase_order_line::Column::PurchaseOrderId.eq(purchase_order_id))
        .order_by_asc(purchase_order_line::Column::Id)
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let ledgers = ledgers_for_lines(conn, lines).await?;
    Ok(PurchaseOrderLedger::new(purchase_order_id, ledgers))
}

/// Loads the ledger of a single purchase order line.
pub async fn load_line_ledger<C: ConnectionTrait>(
    conn: &C,
    purchase_order_line_id: i64,
) -> Result<LineLedger, ServiceError> {
    let line = purchase_order_line::Entity::find_by_id(purchase_order_line_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "Purchase order line {} not found",
                purchase_order_line_id
            ))
        })?;

    let mut ledgers = ledgers_for_lines(conn, vec![line]).await?;
    ledgers.pop().ok_or_else(|| {
        ServiceError::InternalError("ledger lookup returned no line".to_string())
    })
}

async fn ledgers_for_lines<C: ConnectionTrait>(
    conn: &C,
    lines: Vec<purchase_order_line::Model>,
) -> Result<Vec<LineLedger>, ServiceError> {
    if lines.is_empty() {
        return Ok(Vec::new());
    }

    let line_ids: Vec<i64> = lines.iter().map(|l| l.id).collect();
    let receipts = goods_receipt_line::Entity::find()
        .filter(goods_receipt_line::Column::PurchaseOrderLineId.is_in(line_ids))
        .find_also_related(goods_receipt::Entity)
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let mut ledgers: Vec<LineLedger> = lines
        .iter()
        .map(|l| LineLedger::new(l.id, l.quantity))
        .collect();
    let index: HashMap<i64, usize> = ledgers
        .iter()
        .enumerate()
        .map(|(i, l)| (l.purchase_order_line_id, i))
        .collect();

    for (receipt_line, receipt) in receipts {
        let (Some(po_line_id), Some(receipt)) = (receipt_line.purchase_order_line_id, receipt)
        else {
            continue;
        };
        if let Some(&i) = index.get(&po_line_id) {
            ledgers[i].record_receipt(receipt.status, receipt_line.quantity);
        }
    }

    Ok(ledgers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn line(ordered: Decimal, receipts: &[(GoodsReceiptStatus, Decimal)]) -> LineLedger {
        let mut ledger = LineLedger::new(1, ordered);
        for (status, quantity) in receipts {
            ledger.record_receipt(*status, *quantity);
        }
        ledger
    }

    #[test]
    fn no_receipts_leaves_everything_outstanding() {
        let ledger = line(dec!(10), &[]);
        assert_eq!(ledger.outstanding_for_receipt(), dec!(10));
        assert_eq!(ledger.outstanding_for_closure(), dec!(10));
    }

    #[test_case(GoodsReceiptStatus::Draft, dec!(4), dec!(10) ; "draft reduces receipt only")]
    #[test_case(GoodsReceiptStatus::Closed, dec!(4), dec!(4) ; "closed reduces both")]
    #[test_case(GoodsReceiptStatus::Cancelled, dec!(10), dec!(10) ; "cancelled reduces neither")]
    fn receipt_status_effects(
        status: GoodsReceiptStatus,
        expected_receipt: Decimal,
        expected_closure: Decimal,
    ) {
        let ledger = line(dec!(10), &[(status, dec!(6))]);
        assert_eq!(ledger.outstanding_for_receipt(), expected_receipt);
        assert_eq!(ledger.outstanding_for_closure(), expected_closure);
    }

    #[test]
    fn cancelled_is_excluded_even_when_requested() {
        let ledger = line(dec!(5), &[(GoodsReceiptStatus::Cancelled, dec!(5))]);
        assert_eq!(
            ledger.received_with_status(&[GoodsReceiptStatus::Cancelled]),
            Decimal::ZERO
        );
    }

    #[test]
    fn over_receipt_goes_negative() {
        let ledger = line(
            dec!(10),
            &[
                (GoodsReceiptStatus::Closed, dec!(6)),
                (GoodsReceiptStatus::Closed, dec!(6)),
            ],
        );
        assert_eq!(ledger.outstanding_for_closure(), dec!(-2));
    }

    #[test]
    fn fully_received_needs_every_line_closed_out() {
        let closed = line(dec!(10), &[(GoodsReceiptStatus::Closed, dec!(10))]);
        let mut partial = LineLedger::new(2, dec!(3));
        partial.record_receipt(GoodsReceiptStatus::Draft, dec!(3));

        assert!(PurchaseOrderLedger::new(1, vec![closed.clone()]).is_fully_received());
        assert!(!PurchaseOrderLedger::new(1, vec![closed, partial]).is_fully_received());
    }

    #[test]
    fn empty_purchase_order_is_fully_received() {
        assert!(PurchaseOrderLedger::new(1, vec![]).is_fully_received());
    }

    #[test]
    fn summary_reports_all_figures() {
        let ledger = line(
            dec!(10),
            &[
                (GoodsReceiptStatus::Closed, dec!(3)),
                (GoodsReceiptStatus::Draft, dec!(2)),
            ],
        );
        let summary = ledger.summary();
        assert_eq!(summary.received_closed, dec!(3));
        assert_eq!(summary.received_draft_or_closed, dec!(5));
        assert_eq!(summary.outstanding_for_receipt, dec!(5));
        assert_eq!(summary.outstanding_for_closure, dec!(7));
    }
}
