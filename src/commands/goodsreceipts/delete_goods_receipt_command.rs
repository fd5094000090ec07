use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QuerySelect,
    RelationTrait,
};
use sea_orm::sea_query::JoinType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    commands::{observe, Command},
    db::{DbPool, TrackedTransaction},
    entities::{goods_receipt_line, inventory_batch},
    errors::ServiceError,
    events::{Event, EventSender},
    services::lookup,
};

const OPERATION: &str = "delete_goods_receipt";

/// Deletes a draft goods receipt together with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DeleteGoodsReceiptCommand {
    pub id: i64,
}

#[async_trait]
impl Command for DeleteGoodsReceiptCommand {
    type Result = ();

    #[instrument(skip(self, db_pool, event_sender), fields(goods_receipt_id = self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        observe(OPERATION, self.delete(&db_pool).await)?;

        info!(goods_receipt_id = self.id, "Goods receipt deleted");
        event_sender.send_or_log(Event::GoodsReceiptDeleted {
            goods_receipt_id: self.id,
        });
        Ok(())
    }
}

impl DeleteGoodsReceiptCommand {
    async fn delete(&self, db: &DbPool) -> Result<(), ServiceError> {
        let tx = TrackedTransaction::begin(db, OPERATION).await?;
        let txn = tx.conn();

        let grv = lookup::lock_goods_receipt(txn, self.id).await?;
        if !grv.is_draft() {
            return Err(ServiceError::NotDraft {
                document: grv.number(),
                status: grv.status.to_string(),
            });
        }

        // Drafts never have batches; rows imported in another state might.
        let batches = inventory_batch::Entity::find()
            .join(
                JoinType::InnerJoin,
                inventory_batch::Relation::GoodsReceiptLine.def(),
            )
            .filter(goods_receipt_line::Column::GoodsReceiptId.eq(grv.id))
            .count(txn)
            .await
            .map_err(ServiceError::db_error)?;
        if batches > 0 {
            return Err(ServiceError::ReferencedEntityProtected(format!(
                "{} ({} inventory batches reference its lines)",
                grv.number(),
                batches
            )));
        }

        grv.delete(txn).await.map_err(ServiceError::db_error)?;

        tx.commit().await?;
        Ok(())
    }
}
