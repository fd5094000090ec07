pub mod add_goods_receipt_line_command;
pub mod create_goods_receipt_command;
pub mod create_goods_receipt_from_po_command;
pub mod delete_goods_receipt_command;
pub mod delete_goods_receipt_line_command;
pub mod update_goods_receipt_command;
pub mod update_goods_receipt_line_command;

pub use add_goods_receipt_line_command::AddGoodsReceiptLineCommand;
pub use create_goods_receipt_command::{
    CreateGoodsReceiptCommand, CreateGoodsReceiptResult, GoodsReceiptLineInput,
};
pub use create_goods_receipt_from_po_command::CreateGoodsReceiptFromPoCommand;
pub use delete_goods_receipt_command::DeleteGoodsReceiptCommand;
pub use delete_goods_receipt_line_command::DeleteGoodsReceiptLineCommand;
pub use update_goods_receipt_command::{UpdateGoodsReceiptCommand, UpdateGoodsReceiptResult};
pub use update_goods_receipt_line_command::UpdateGoodsReceiptLineCommand;

use sea_orm::ConnectionTrait;

use crate::entities::{goods_receipt, goods_receipt_line};
use crate::errors::ServiceError;
use crate::services::lookup;

/// Locks a goods receipt whose lines are about to change and requires it
/// to still be a draft.
pub(crate) async fn lock_draft_parent<C: ConnectionTrait>(
    conn: &C,
    goods_receipt_id: i64,
) -> Result<goods_receipt::Model, ServiceError> {
    let grv = lookup::lock_goods_receipt(conn, goods_receipt_id).await?;
    if !grv.is_draft() {
        return Err(ServiceError::ParentNotDraft {
            document: grv.number(),
            status: grv.status.to_string(),
        });
    }
    Ok(grv)
}

/// Loads a line and requires it to belong to `grv`.
pub(crate) async fn line_of<C: ConnectionTrait>(
    conn: &C,
    grv: &goods_receipt::Model,
    line_id: i64,
) -> Result<goods_receipt_line::Model, ServiceError> {
    let line = lookup::find_goods_receipt_line(conn, line_id).await?;
    if line.goods_receipt_id != grv.id {
        return Err(ServiceError::NotFound(format!(
            "Goods receipt line {} not found on {}",
            line_id,
            grv.number()
        )));
    }
    Ok(line)
}

/// A receipt line may only fulfil a line of the purchase order its goods
/// receipt was raised against.
pub(crate) async fn check_po_line_link<C: ConnectionTrait>(
    conn: &C,
    grv: &goods_receipt::Model,
    purchase_order_line_id: i64,
) -> Result<(), ServiceError> {
    let po_line = lookup::find_purchase_order_line(conn, purchase_order_line_id).await?;
    match grv.purchase_order_id {
        Some(purchase_order_id) if purchase_order_id == po_line.purchase_order_id => Ok(()),
        Some(_) => Err(ServiceError::ValidationError(format!(
            "purchase_order_line_id: line {} belongs to a different purchase order than {}",
            purchase_order_line_id,
            grv.number()
        ))),
        None => Err(ServiceError::ValidationError(format!(
            "purchase_order_line_id: {} is not linked to a purchase order",
            grv.number()
        ))),
    }
}
