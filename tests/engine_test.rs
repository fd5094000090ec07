mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use std::time::Duration;
use stateset_procurement::{
    commands::goodsreceipts::UpdateGoodsReceiptLineCommand,
    config::AppConfig,
    errors::ServiceError,
    metrics::{self, GRV_CLOSURES},
    ProcurementEngine,
};

use common::{expiry, TestApp};

#[tokio::test]
async fn invalid_configuration_is_rejected_before_connecting() {
    let cfg = AppConfig {
        db_min_connections: 4,
        db_max_connections: 2,
        ..AppConfig::with_database_url("sqlite::memory:")
    };

    let err = ProcurementEngine::start(cfg).await.err().expect("start fails");
    assert_matches!(err, ServiceError::ValidationError(msg) if msg.contains("db_min_connections"));
}

#[tokio::test]
async fn event_receiver_is_handed_out_once() {
    let mut app = TestApp::new().await;
    assert!(app.engine.take_events().is_none());
    assert!(app.engine.spawn_event_logger().is_none());
}

#[tokio::test]
async fn operations_complete_when_nobody_consumes_events() {
    let app = TestApp::build(|cfg| cfg.event_channel_capacity = 1, false).await;

    for _ in 0..4 {
        let created = tokio::time::timeout(
            Duration::from_secs(5),
            app.draft_po(&[(app.catalog.product_a, dec!(1), dec!(2))]),
        )
        .await;
        assert!(created.is_ok(), "create blocked on a full event channel");
    }

    let orders = app
        .service()
        .list_purchase_orders(Default::default())
        .await
        .unwrap();
    assert_eq!(orders.len(), 4);
}

#[tokio::test]
async fn closures_show_up_in_metrics() {
    let app = TestApp::new().await;
    let po = app.submitted_po(&[(app.catalog.product_a, dec!(2), dec!(1))]).await;
    let created = app.receipt_from_po(po.id).await;
    app.service()
        .update_goods_receipt_line(UpdateGoodsReceiptLineCommand {
            goods_receipt_id: created.goods_receipt.id,
            line_id: created.lines[0].id,
            expiry_date: Some(expiry(2025, 6, 30)),
            ..Default::default()
        })
        .await
        .unwrap();

    let before = GRV_CLOSURES.get();
    app.service()
        .close_goods_receipt(created.goods_receipt.id)
        .await
        .unwrap();
    assert!(GRV_CLOSURES.get() > before);

    let text = metrics::gather();
    assert!(text.contains("procurement_grv_closures_total"));
    assert!(text.contains("update_goods_receipt"));
}
