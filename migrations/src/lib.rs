pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_catalog_tables;
mod m20250601_000002_create_purchase_order_tables;
mod m20250601_000003_create_goods_receipt_tables;
mod m20250601_000004_create_inventory_batches_table;
mod m20250601_000005_add_procurement_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_catalog_tables::Migration),
            Box::new(m20250601_000002_create_purchase_order_tables::Migration),
            Box::new(m20250601_000003_create_goods_receipt_tables::Migration),
            Box::new(m20250601_000004_create_inventory_batches_table::Migration),
            Box::new(m20250601_000005_add_procurement_indexes::Migration),
        ]
    }
}
