mod common;

use futures::future::join_all;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use stateset_procurement::{
    commands::goodsreceipts::UpdateGoodsReceiptLineCommand,
    entities::{inventory_batch, PurchaseOrderStatus},
};

use common::{expiry, TestApp};

#[tokio::test]
async fn concurrent_closes_of_one_receipt_cascade_once() {
    let app = TestApp::with_pool(8).await;
    let po = app.submitted_po(&[(app.catalog.product_a, dec!(10), dec!(5))]).await;
    let created = app.receipt_from_po(po.id).await;
    let grv_id = created.goods_receipt.id;
    app.service()
        .update_goods_receipt_line(UpdateGoodsReceiptLineCommand {
            goods_receipt_id: grv_id,
            line_id: created.lines[0].id,
            expiry_date: Some(expiry(2025, 1, 31)),
            ..Default::default()
        })
        .await
        .unwrap();

    let service = app.service().clone();
    let attempts = (0..8).map(|_| {
        let service = service.clone();
        tokio::spawn(async move { service.close_goods_receipt(grv_id).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task completes").expect("close succeeds"))
        .collect();

    let cascades = results.iter().filter(|r| r.closure.is_some()).count();
    assert_eq!(cascades, 1);

    let batches = inventory_batch::Entity::find().count(app.engine.db.as_ref()).await.unwrap();
    assert_eq!(batches, 1);
    let view = app.service().get_purchase_order(po.id).await.unwrap();
    assert_eq!(view.purchase_order.status, PurchaseOrderStatus::Received);
}

#[tokio::test]
async fn concurrent_receipts_against_one_order_each_close() {
    let app = TestApp::with_pool(8).await;
    let po = app.submitted_po(&[(app.catalog.product_a, dec!(10), dec!(5))]).await;

    let first = app.receipt_from_po(po.id).await;
    app.service()
        .update_goods_receipt_line(UpdateGoodsReceiptLineCommand {
            goods_receipt_id: first.goods_receipt.id,
            line_id: first.lines[0].id,
            quantity: Some(dec!(4)),
            expiry_date: Some(expiry(2025, 1, 31)),
            ..Default::default()
        })
        .await
        .unwrap();
    let second = app.receipt_from_po(po.id).await;
    assert_eq!(second.lines[0].quantity, dec!(6));
    app.service()
        .update_goods_receipt_line(UpdateGoodsReceiptLineCommand {
            goods_receipt_id: second.goods_receipt.id,
            line_id: second.lines[0].id,
            expiry_date: Some(expiry(2025, 2, 28)),
            ..Default::default()
        })
        .await
        .unwrap();

    let service = app.service().clone();
    let ids = [first.goods_receipt.id, second.goods_receipt.id];
    let results = join_all(ids.map(|id| {
        let service = service.clone();
        tokio::spawn(async move { service.close_goods_receipt(id).await })
    }))
    .await;

    let received: usize = results
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .filter(|r| {
            r.closure
                .as_ref()
                .map_or(false, |c| c.purchase_order_received.is_some())
        })
        .count();
    // Whichever close lands last sees the order complete.
    assert_eq!(received, 1);

    let view = app.service().get_purchase_order(po.id).await.unwrap();
    assert_eq!(view.purchase_order.status, PurchaseOrderStatus::Received);
    assert!(view.fully_received);
}
