//! Transition tables for the procurement documents.

use crate::entities::{GoodsReceiptStatus, PurchaseOrderStatus};

use super::state_machine::{DocumentStatus, TransitionTable};

pub static PURCHASE_ORDER_TRANSITIONS: TransitionTable<PurchaseOrderStatus> = TransitionTable::new(
    "purchase order",
    &[
        (
            PurchaseOrderStatus::Draft,
            &[PurchaseOrderStatus::Submitted, PurchaseOrderStatus::Cancelled],
        ),
        (
            PurchaseOrderStatus::Submitted,
            &[PurchaseOrderStatus::Received, PurchaseOrderStatus::Cancelled],
        ),
        (PurchaseOrderStatus::Received, &[]),
        (PurchaseOrderStatus::Cancelled, &[]),
    ],
);

// Nothing enters `cancelled`; the status exists for stored data only.
pub static GOODS_RECEIPT_TRANSITIONS: TransitionTable<GoodsReceiptStatus> = TransitionTable::new(
    "goods receipt",
    &[
        (GoodsReceiptStatus::Draft, &[GoodsReceiptStatus::Closed]),
        (GoodsReceiptStatus::Closed, &[]),
    ],
);

impl DocumentStatus for PurchaseOrderStatus {
    fn transitions() -> &'static TransitionTable<Self> {
        &PURCHASE_ORDER_TRANSITIONS
    }
}

impl DocumentStatus for GoodsReceiptStatus {
    fn transitions() -> &'static TransitionTable<Self> {
        &GOODS_RECEIPT_TRANSITIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::validate_transition;
    use proptest::prelude::*;
    use rstest::rstest;
    use sea_orm::Iterable;

    #[rstest]
    #[case(PurchaseOrderStatus::Draft, PurchaseOrderStatus::Submitted, true)]
    #[case(PurchaseOrderStatus::Draft, PurchaseOrderStatus::Cancelled, true)]
    #[case(PurchaseOrderStatus::Draft, PurchaseOrderStatus::Received, false)]
    #[case(PurchaseOrderStatus::Submitted, PurchaseOrderStatus::Received, true)]
    #[case(PurchaseOrderStatus::Submitted, PurchaseOrderStatus::Cancelled, true)]
    #[case(PurchaseOrderStatus::Submitted, PurchaseOrderStatus::Draft, false)]
    #[case(PurchaseOrderStatus::Received, PurchaseOrderStatus::Cancelled, false)]
    #[case(PurchaseOrderStatus::Cancelled, PurchaseOrderStatus::Draft, false)]
    #[case(PurchaseOrderStatus::Received, PurchaseOrderStatus::Received, true)]
    fn purchase_order_transitions(
        #[case] from: PurchaseOrderStatus,
        #[case] to: PurchaseOrderStatus,
        #[case] ok: bool,
    ) {
        assert_eq!(
            validate_transition(from, to, PurchaseOrderStatus::transitions()).is_ok(),
            ok
        );
    }

    #[rstest]
    #[case(GoodsReceiptStatus::Draft, GoodsReceiptStatus::Closed, true)]
    #[case(GoodsReceiptStatus::Draft, GoodsReceiptStatus::Cancelled, false)]
    #[case(GoodsReceiptStatus::Closed, GoodsReceiptStatus::Draft, false)]
    #[case(GoodsReceiptStatus::Closed, GoodsReceiptStatus::Cancelled, false)]
    #[case(GoodsReceiptStatus::Cancelled, GoodsReceiptStatus::Draft, false)]
    #[case(GoodsReceiptStatus::Closed, GoodsReceiptStatus::Closed, true)]
    fn goods_receipt_transitions(
        #[case] from: GoodsReceiptStatus,
        #[case] to: GoodsReceiptStatus,
        #[case] ok: bool,
    ) {
        assert_eq!(
            validate_transition(from, to, GoodsReceiptStatus::transitions()).is_ok(),
            ok
        );
    }

    #[test]
    fn no_goods_receipt_status_leads_to_cancelled() {
        for from in GoodsReceiptStatus::iter() {
            assert!(!GOODS_RECEIPT_TRANSITIONS
                .allowed_from(from)
                .contains(&GoodsReceiptStatus::Cancelled));
        }
    }

    #[test]
    fn terminal_purchase_order_message_reports_none() {
        let err = validate_transition(
            PurchaseOrderStatus::Received,
            PurchaseOrderStatus::Draft,
            &PURCHASE_ORDER_TRANSITIONS,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot change purchase order status from 'received' to 'draft'. Allowed: None."
        );
    }

    fn po_status() -> impl Strategy<Value = PurchaseOrderStatus> {
        prop::sample::select(PurchaseOrderStatus::iter().collect::<Vec<_>>())
    }

    proptest! {
        #[test]
        fn purchase_order_table_property(a in po_status(), b in po_status()) {
            let listed = PURCHASE_ORDER_TRANSITIONS.allowed_from(a).contains(&b);
            prop_assert_eq!(
                validate_transition(a, b, &PURCHASE_ORDER_TRANSITIONS).is_ok(),
                a == b || listed
            );
        }
    }
}
