//! sea-orm entities for the procurement schema.
//!
//! Catalog tables (`category`, `unit_of_measure`, `product`, `supplier`,
//! `warehouse`) are reference data; documents and batches are owned by the
//! workflow engine.

// Catalog reference data
pub mod category;
pub mod product;
pub mod supplier;
pub mod unit_of_measure;
pub mod warehouse;

// Procurement documents
pub mod goods_receipt;
pub mod goods_receipt_line;
pub mod purchase_order;
pub mod purchase_order_line;

// Received stock
pub mod inventory_batch;

pub use goods_receipt::GoodsReceiptStatus;
pub use purchase_order::PurchaseOrderStatus;
