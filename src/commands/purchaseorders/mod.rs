pub mod add_purchase_order_line_command;
pub mod create_purchase_order_command;
pub mod delete_purchase_order_command;
pub mod delete_purchase_order_line_command;
pub mod update_purchase_order_command;
pub mod update_purchase_order_line_command;

pub use add_purchase_order_line_command::AddPurchaseOrderLineCommand;
pub use create_purchase_order_command::{
    CreatePurchaseOrderCommand, CreatePurchaseOrderResult, PurchaseOrderLineInput,
};
pub use delete_purchase_order_command::DeletePurchaseOrderCommand;
pub use delete_purchase_order_line_command::DeletePurchaseOrderLineCommand;
pub use update_purchase_order_command::{UpdatePurchaseOrderCommand, UpdatePurchaseOrderResult};
pub use update_purchase_order_line_command::UpdatePurchaseOrderLineCommand;

use sea_orm::ConnectionTrait;

use crate::entities::purchase_order;
use crate::errors::ServiceError;
use crate::services::lookup;

/// Locks a purchase order whose lines are about to change and requires it
/// to still be a draft.
pub(crate) async fn lock_draft_parent<C: ConnectionTrait>(
    conn: &C,
    purchase_order_id: i64,
) -> Result<purchase_order::Model, ServiceError> {
    let po = lookup::lock_purchase_order(conn, purchase_order_id).await?;
    if !po.is_draft() {
        return Err(ServiceError::ParentNotDraft {
            document: po.number(),
            status: po.status.to_string(),
        });
    }
    Ok(po)
}
