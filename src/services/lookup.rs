//! Loading documents and catalog references inside a workflow transaction.
//!
//! Document rows are read `FOR UPDATE` so the status a check sees is the
//! status the following write replaces. SQLite has no row locks; there a
//! no-op update of the row takes the database write lock before the read,
//! so concurrent writers queue on the busy timeout instead of failing when
//! they upgrade from a read.

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, QueryFilter, QuerySelect};

use crate::entities::{
    goods_receipt, goods_receipt_line, product, purchase_order, purchase_order_line, supplier,
    warehouse,
};
use crate::errors::ServiceError;

pub async fn lock_purchase_order<C: ConnectionTrait>(
    conn: &C,
    id: i64,
) -> Result<purchase_order::Model, ServiceError> {
    if conn.get_database_backend() == DbBackend::Sqlite {
        purchase_order::Entity::update_many()
            .col_expr(
                purchase_order::Column::UpdatedAt,
                Expr::col(purchase_order::Column::UpdatedAt).into(),
            )
            .filter(purchase_order::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(ServiceError::db_error)?;
    }
    purchase_order::Entity::find_by_id(id)
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {} not found", id)))
}

pub async fn lock_goods_receipt<C: ConnectionTrait>(
    conn: &C,
    id: i64,
) -> Result<goods_receipt::Model, ServiceError> {
    if conn.get_database_backend() == DbBackend::Sqlite {
        goods_receipt::Entity::update_many()
            .col_expr(
                goods_receipt::Column::UpdatedAt,
                Expr::col(goods_receipt::Column::UpdatedAt).into(),
            )
            .filter(goods_receipt::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(ServiceError::db_error)?;
    }
    goods_receipt::Entity::find_by_id(id)
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Goods receipt {} not found", id)))
}

pub async fn find_purchase_order_line<C: ConnectionTrait>(
    conn: &C,
    id: i64,
) -> Result<purchase_order_line::Model, ServiceError> {
    purchase_order_line::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Purchase order line {} not found", id)))
}

pub async fn find_goods_receipt_line<C: ConnectionTrait>(
    conn: &C,
    id: i64,
) -> Result<goods_receipt_line::Model, ServiceError> {
    goods_receipt_line::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Goods receipt line {} not found", id)))
}

pub async fn require_supplier<C: ConnectionTrait>(conn: &C, id: i64) -> Result<(), ServiceError> {
    supplier::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .map(|_| ())
        .ok_or_else(|| ServiceError::NotFound(format!("Supplier {} not found", id)))
}

pub async fn require_warehouse<C: ConnectionTrait>(conn: &C, id: i64) -> Result<(), ServiceError> {
    warehouse::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .map(|_| ())
        .ok_or_else(|| ServiceError::NotFound(format!("Warehouse {} not found", id)))
}

pub async fn require_product<C: ConnectionTrait>(conn: &C, id: i64) -> Result<(), ServiceError> {
    product::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .map(|_| ())
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
}
