#![allow(dead_code)]

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use stateset_procurement::{
    commands::goodsreceipts::{CreateGoodsReceiptFromPoCommand, CreateGoodsReceiptResult},
    commands::purchaseorders::{CreatePurchaseOrderCommand, PurchaseOrderLineInput},
    config::AppConfig,
    entities::{category, product, purchase_order, supplier, unit_of_measure, warehouse},
    events::Event,
    ProcurementEngine,
};
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Catalog rows every scenario can reference.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    pub supplier_id: i64,
    pub other_supplier_id: i64,
    pub warehouse_id: i64,
    pub other_warehouse_id: i64,
    pub product_a: i64,
    pub product_b: i64,
}

/// Engine over a throwaway SQLite file with a seeded catalog.
pub struct TestApp {
    pub engine: ProcurementEngine,
    pub catalog: Catalog,
    events: Option<mpsc::Receiver<Event>>,
    _dir: TempDir,
}

impl TestApp {
    /// Single pooled connection, events collected for assertions.
    pub async fn new() -> Self {
        Self::build(|_| {}, true).await
    }

    /// Engine with a pool of `connections`, so concurrent commands run on
    /// separate connections.
    pub async fn with_pool(connections: u32) -> Self {
        Self::build(|cfg| cfg.db_max_connections = connections, true).await
    }

    /// `take_events = false` leaves the receiver inside the engine, as a
    /// host that never consumes events would.
    pub async fn build(configure: impl FnOnce(&mut AppConfig), take_events: bool) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("procurement_test.db");

        let mut cfg = AppConfig::with_database_url(format!("sqlite://{}?mode=rwc", path.display()));
        cfg.environment = "test".to_string();
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.auto_migrate = true;
        configure(&mut cfg);

        let mut engine = ProcurementEngine::start(cfg).await.expect("engine starts");
        let events = if take_events {
            Some(engine.take_events().expect("event receiver"))
        } else {
            None
        };
        let catalog = seed_catalog(&engine).await;

        Self {
            engine,
            catalog,
            events,
            _dir: dir,
        }
    }

    pub fn service(&self) -> &stateset_procurement::services::ProcurementService {
        &self.engine.service
    }

    /// Events published so far, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        if let Some(rx) = self.events.as_mut() {
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
        }
        events
    }

    pub async fn draft_po(&self, lines: &[(i64, Decimal, Decimal)]) -> purchase_order::Model {
        let result = self
            .service()
            .create_purchase_order(CreatePurchaseOrderCommand {
                supplier_id: self.catalog.supplier_id,
                warehouse_id: self.catalog.warehouse_id,
                ordered_at: at(2024, 3, 1),
                expected_at: at(2024, 3, 15),
                reference: "PO-REF".to_string(),
                lines: lines
                    .iter()
                    .map(|&(product_id, quantity, unit_price)| PurchaseOrderLineInput {
                        product_id,
                        quantity,
                        unit_price,
                    })
                    .collect(),
            })
            .await
            .expect("purchase order created");
        result.purchase_order
    }

    pub async fn submitted_po(&self, lines: &[(i64, Decimal, Decimal)]) -> purchase_order::Model {
        let po = self.draft_po(lines).await;
        self.service()
            .submit_purchase_order(po.id)
            .await
            .expect("purchase order submitted")
            .purchase_order
    }

    pub async fn receipt_from_po(&self, purchase_order_id: i64) -> CreateGoodsReceiptResult {
        self.service()
            .create_goods_receipt_from_po(CreateGoodsReceiptFromPoCommand {
                purchase_order_id,
                received_at: at(2024, 3, 10),
                reference: String::new(),
                created_by: Some("receiving".to_string()),
            })
            .await
            .expect("goods receipt created")
    }
}

pub fn at(year: i32, month: u32, day: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 9, 0, 0).unwrap()
}

pub fn expiry(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

async fn seed_catalog(engine: &ProcurementEngine) -> Catalog {
    let db = engine.db.as_ref();

    let unit = unit_of_measure::ActiveModel {
        name: Set("Each".to_string()),
        short_code: Set("ea".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
    let category = category::ActiveModel {
        name: Set("Perishables".to_string()),
        parent_id: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    let mut products = Vec::new();
    for (name, sku) in [("Milk 1L", "MILK-1L"), ("Yoghurt 500g", "YOG-500")] {
        let p = product::ActiveModel {
            name: Set(name.to_string()),
            sku: Set(sku.to_string()),
            description: Set(String::new()),
            category_id: Set(Some(category.id)),
            unit_id: Set(unit.id),
            active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
        products.push(p.id);
    }

    let mut suppliers = Vec::new();
    for name in ["Dairy Co", "Farm Fresh"] {
        let s = supplier::ActiveModel {
            name: Set(name.to_string()),
            contact_name: Set("Sam".to_string()),
            email: Set(format!("orders@{}.example", name.replace(' ', "").to_lowercase())),
            phone: Set("555-0100".to_string()),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
        suppliers.push(s.id);
    }

    let mut warehouses = Vec::new();
    for name in ["Main", "Overflow"] {
        let w = warehouse::ActiveModel {
            name: Set(name.to_string()),
            location: Set("Dock 1".to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
        warehouses.push(w.id);
    }

    Catalog {
        supplier_id: suppliers[0],
        other_supplier_id: suppliers[1],
        warehouse_id: warehouses[0],
        other_warehouse_id: warehouses[1],
        product_a: products[0],
        product_b: products[1],
    }
}
