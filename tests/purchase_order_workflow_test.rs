mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use stateset_procurement::{
    commands::purchaseorders::{
        AddPurchaseOrderLineCommand, CreatePurchaseOrderCommand, PurchaseOrderLineInput, UpdatePurchaseOrderCommand,
        UpdatePurchaseOrderLineCommand,
    },
    entities::{
        goods_receipt, goods_receipt_line, purchase_order, purchase_order_line,
        GoodsReceiptStatus, PurchaseOrderStatus,
    },
    errors::ServiceError,
    events::Event,
    queries::ListPurchaseOrdersQuery,
};

use common::{at, TestApp};

#[tokio::test]
async fn create_starts_in_draft_and_publishes_events() {
    let mut app = TestApp::new().await;
    let product = app.catalog.product_a;

    let po = app.draft_po(&[(product, dec!(10), dec!(5))]).await;

    assert_eq!(po.status, PurchaseOrderStatus::Draft);
    assert_eq!(po.number(), format!("PO{:06}", po.id));

    let view = app.service().get_purchase_order(po.id).await.unwrap();
    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.outstanding[0].ordered, dec!(10));
    assert!(!view.fully_received);

    let events = app.drain_events();
    assert_matches!(events[0], Event::PurchaseOrderCreated { purchase_order_id } if purchase_order_id == po.id);
    assert_matches!(events[1], Event::PurchaseOrderLineAdded { .. });
}

#[tokio::test]
async fn create_rejects_unknown_supplier() {
    let app = TestApp::new().await;
    let result = app
        .service()
        .create_purchase_order(CreatePurchaseOrderCommand {
            supplier_id: 9_999,
            warehouse_id: app.catalog.warehouse_id,
            ordered_at: at(2024, 3, 1),
            expected_at: at(2024, 3, 2),
            reference: String::new(),
            lines: vec![],
        })
        .await;

    assert_matches!(result, Err(ServiceError::NotFound(_)));
    let count = purchase_order::Entity::find().count(app.engine.db.as_ref()).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn negative_quantity_is_rejected() {
    let app = TestApp::new().await;
    let po = app.draft_po(&[]).await;

    let result = app
        .service()
        .add_purchase_order_line(AddPurchaseOrderLineCommand {
            purchase_order_id: po.id,
            line: PurchaseOrderLineInput {
                product_id: app.catalog.product_a,
                quantity: dec!(-1),
                unit_price: dec!(5),
            },
        })
        .await;

    assert_matches!(result, Err(ServiceError::ValidationError(msg)) if msg.contains("quantity"));
}

#[tokio::test]
async fn amounts_must_fit_two_decimal_places_and_ten_digits() {
    let app = TestApp::new().await;
    let po = app.draft_po(&[]).await;

    for (quantity, unit_price, field) in [
        (dec!(1.005), dec!(5), "quantity"),
        (dec!(123456789012.5), dec!(5), "quantity"),
        (dec!(1), dec!(0.125), "unit_price"),
    ] {
        let result = app
            .service()
            .add_purchase_order_line(AddPurchaseOrderLineCommand {
                purchase_order_id: po.id,
                line: PurchaseOrderLineInput {
                    product_id: app.catalog.product_a,
                    quantity,
                    unit_price,
                },
            })
            .await;
        assert_matches!(result, Err(ServiceError::ValidationError(msg)) if msg.contains(field));
    }

    let view = app.service().get_purchase_order(po.id).await.unwrap();
    assert!(view.lines.is_empty());

    let line = app
        .service()
        .add_purchase_order_line(AddPurchaseOrderLineCommand {
            purchase_order_id: po.id,
            line: PurchaseOrderLineInput {
                product_id: app.catalog.product_a,
                quantity: dec!(99999999.99),
                unit_price: dec!(1.50),
            },
        })
        .await
        .unwrap();
    assert_eq!(line.quantity, dec!(99999999.99));
}

#[tokio::test]
async fn status_follows_transition_table() {
    let app = TestApp::new().await;
    let po = app.draft_po(&[(app.catalog.product_a, dec!(1), dec!(1))]).await;

    let skipped = app
        .service()
        .set_purchase_order_status(po.id, PurchaseOrderStatus::Received)
        .await;
    assert_matches!(
        skipped,
        Err(ServiceError::InvalidTransition { ref from, ref to, ref allowed, .. })
            if from == "draft" && to == "received"
                && allowed == &vec!["submitted".to_string(), "cancelled".to_string()]
    );

    let submitted = app.service().submit_purchase_order(po.id).await.unwrap();
    assert!(submitted.status_changed());
    assert_eq!(submitted.purchase_order.status, PurchaseOrderStatus::Submitted);

    let cancelled = app.service().cancel_purchase_order(po.id).await.unwrap();
    assert_eq!(cancelled.purchase_order.status, PurchaseOrderStatus::Cancelled);

    let reopened = app.service().submit_purchase_order(po.id).await;
    assert_matches!(reopened, Err(ServiceError::InvalidTransition { ref allowed, .. }) if allowed.is_empty());
}

#[tokio::test]
async fn submitted_order_rejects_header_edits_but_accepts_status() {
    let app = TestApp::new().await;
    let po = app.submitted_po(&[(app.catalog.product_a, dec!(10), dec!(5))]).await;

    let edit = app
        .service()
        .update_purchase_order(UpdatePurchaseOrderCommand {
            id: po.id,
            reference: Some("changed".to_string()),
            warehouse_id: Some(app.catalog.other_warehouse_id),
            ..Default::default()
        })
        .await;
    assert_matches!(
        edit,
        Err(ServiceError::ImmutableFieldChanged { ref fields, .. })
            if fields == &vec!["warehouse_id".to_string(), "reference".to_string()]
    );

    // Unchanged values alongside a status change are not edits.
    let cancelled = app
        .service()
        .update_purchase_order(UpdatePurchaseOrderCommand {
            id: po.id,
            reference: Some(po.reference.clone()),
            status: Some(PurchaseOrderStatus::Cancelled),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(cancelled.changed_fields.is_empty());
    assert_eq!(cancelled.purchase_order.status, PurchaseOrderStatus::Cancelled);
}

#[tokio::test]
async fn draft_header_edit_is_persisted() {
    let app = TestApp::new().await;
    let po = app.draft_po(&[]).await;

    let result = app
        .service()
        .update_purchase_order(UpdatePurchaseOrderCommand {
            id: po.id,
            supplier_id: Some(app.catalog.other_supplier_id),
            reference: Some("REV-2".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(result.changed_fields, vec!["supplier_id", "reference"]);
    let stored = app.service().get_purchase_order(po.id).await.unwrap().purchase_order;
    assert_eq!(stored.supplier_id, app.catalog.other_supplier_id);
    assert_eq!(stored.reference, "REV-2");
}

#[tokio::test]
async fn identical_update_is_a_no_op() {
    let mut app = TestApp::new().await;
    let po = app.draft_po(&[(app.catalog.product_a, dec!(3), dec!(2))]).await;
    app.drain_events();

    let result = app
        .service()
        .update_purchase_order(UpdatePurchaseOrderCommand {
            id: po.id,
            supplier_id: Some(po.supplier_id),
            warehouse_id: Some(po.warehouse_id),
            reference: Some(po.reference.clone()),
            status: Some(PurchaseOrderStatus::Draft),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(result.changed_fields.is_empty());
    assert!(!result.status_changed());
    assert_eq!(result.purchase_order.updated_at, po.updated_at);
    assert!(app.drain_events().is_empty());
}

#[tokio::test]
async fn lines_are_frozen_once_submitted() {
    let app = TestApp::new().await;
    let po = app.submitted_po(&[(app.catalog.product_a, dec!(10), dec!(5))]).await;
    let line_id = app.service().get_purchase_order(po.id).await.unwrap().lines[0].id;

    let add = app
        .service()
        .add_purchase_order_line(AddPurchaseOrderLineCommand {
            purchase_order_id: po.id,
            line: PurchaseOrderLineInput {
                product_id: app.catalog.product_b,
                quantity: dec!(1),
                unit_price: dec!(1),
            },
        })
        .await;
    assert_matches!(add, Err(ServiceError::ParentNotDraft { ref status, .. }) if status == "submitted");

    let edit = app
        .service()
        .update_purchase_order_line(UpdatePurchaseOrderLineCommand {
            purchase_order_id: po.id,
            line_id,
            quantity: Some(dec!(20)),
            ..Default::default()
        })
        .await;
    assert_matches!(edit, Err(ServiceError::ParentNotDraft { .. }));

    let delete = app.service().delete_purchase_order_line(po.id, line_id).await;
    assert_matches!(delete, Err(ServiceError::ParentNotDraft { .. }));
}

#[tokio::test]
async fn draft_lines_can_be_edited_and_removed() {
    let app = TestApp::new().await;
    let po = app.draft_po(&[(app.catalog.product_a, dec!(10), dec!(5))]).await;
    let line_id = app.service().get_purchase_order(po.id).await.unwrap().lines[0].id;

    let edited = app
        .service()
        .update_purchase_order_line(UpdatePurchaseOrderLineCommand {
            purchase_order_id: po.id,
            line_id,
            quantity: Some(dec!(12)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(edited.quantity, dec!(12));

    app.service().delete_purchase_order_line(po.id, line_id).await.unwrap();
    let view = app.service().get_purchase_order(po.id).await.unwrap();
    assert!(view.lines.is_empty());
    assert!(view.fully_received);
}

#[tokio::test]
async fn line_of_another_order_is_not_found() {
    let app = TestApp::new().await;
    let first = app.draft_po(&[(app.catalog.product_a, dec!(1), dec!(1))]).await;
    let second = app.draft_po(&[]).await;
    let line_id = app.service().get_purchase_order(first.id).await.unwrap().lines[0].id;

    let result = app.service().delete_purchase_order_line(second.id, line_id).await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn only_drafts_can_be_deleted() {
    let mut app = TestApp::new().await;
    let draft = app.draft_po(&[(app.catalog.product_a, dec!(1), dec!(1))]).await;
    let submitted = app.submitted_po(&[(app.catalog.product_a, dec!(1), dec!(1))]).await;

    let refused = app.service().delete_purchase_order(submitted.id).await;
    assert_matches!(refused, Err(ServiceError::NotDraft { ref document, .. }) if *document == submitted.number());

    app.drain_events();
    app.service().delete_purchase_order(draft.id).await.unwrap();
    assert_eq!(
        app.drain_events(),
        vec![Event::PurchaseOrderDeleted { purchase_order_id: draft.id }]
    );

    let db = app.engine.db.as_ref();
    assert!(purchase_order::Entity::find_by_id(draft.id).one(db).await.unwrap().is_none());
    let orphan_lines = purchase_order_line::Entity::find().count(db).await.unwrap();
    assert_eq!(orphan_lines, 1, "only the submitted order's line remains");
}

#[tokio::test]
async fn referenced_line_is_protected() {
    let app = TestApp::new().await;
    let po = app.draft_po(&[(app.catalog.product_a, dec!(5), dec!(1))]).await;
    let line_id = app.service().get_purchase_order(po.id).await.unwrap().lines[0].id;

    // A receipt line pointing at a draft order only arises from imported data.
    let db = app.engine.db.as_ref();
    let grv = goods_receipt::ActiveModel {
        purchase_order_id: Set(Some(po.id)),
        supplier_id: Set(po.supplier_id),
        warehouse_id: Set(po.warehouse_id),
        received_at: Set(at(2024, 3, 5)),
        status: Set(GoodsReceiptStatus::Draft),
        reference: Set(String::new()),
        created_by: Set(None),
        created_at: Set(at(2024, 3, 5)),
        updated_at: Set(at(2024, 3, 5)),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
    goods_receipt_line::ActiveModel {
        goods_receipt_id: Set(grv.id),
        purchase_order_line_id: Set(Some(line_id)),
        product_id: Set(app.catalog.product_a),
        quantity: Set(dec!(5)),
        expiry_date: Set(None),
        unit_price: Set(dec!(1)),
        lot_number: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    let line_delete = app.service().delete_purchase_order_line(po.id, line_id).await;
    assert_matches!(line_delete, Err(ServiceError::ReferencedEntityProtected(_)));

    let po_delete = app.service().delete_purchase_order(po.id).await;
    assert_matches!(po_delete, Err(ServiceError::ReferencedEntityProtected(_)));
}

#[tokio::test]
async fn list_filters_by_status() {
    let app = TestApp::new().await;
    app.draft_po(&[]).await;
    let submitted = app.submitted_po(&[]).await;

    let listed = app
        .service()
        .list_purchase_orders(ListPurchaseOrdersQuery {
            status: Some(PurchaseOrderStatus::Submitted),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, submitted.id);

    let all = app
        .service()
        .list_purchase_orders(ListPurchaseOrdersQuery::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}
