//! Database transactions tagged with an id for logging and metrics.

use metrics::{counter, histogram};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::time::Instant;
use tracing::{debug, error};
use uuid::Uuid;

use crate::errors::ServiceError;

/// An open transaction for one workflow operation.
///
/// Dropping it without calling [`TrackedTransaction::commit`] rolls back
/// every write made through [`TrackedTransaction::conn`].
pub struct TrackedTransaction {
    txn: DatabaseTransaction,
    id: Uuid,
    operation: &'static str,
    started: Instant,
}

impl TrackedTransaction {
    pub async fn begin(
        db: &DatabaseConnection,
        operation: &'static str,
    ) -> Result<Self, ServiceError> {
        let txn = db.begin().await.map_err(|e| {
            error!(operation, "Failed to start transaction: {}", e);
            ServiceError::db_error(e)
        })?;
        let id = Uuid::new_v4();

        debug!(transaction_id = %id, operation, "Starting database transaction");
        counter!("procurement_db.transaction.started", 1, "operation" => operation);

        Ok(Self {
            txn,
            id,
            operation,
            started: Instant::now(),
        })
    }

    pub fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn commit(self) -> Result<(), ServiceError> {
        let Self {
            txn,
            id,
            operation,
            started,
        } = self;

        txn.commit().await.map_err(|e| {
            error!(transaction_id = %id, operation, "Commit failed: {}", e);
            counter!("procurement_db.transaction.failed", 1, "operation" => operation);
            ServiceError::db_error(e)
        })?;

        let elapsed = started.elapsed();
        histogram!("procurement_db.transaction.duration", elapsed, "operation" => operation);
        counter!("procurement_db.transaction.committed", 1, "operation" => operation);
        debug!(transaction_id = %id, operation, "Transaction committed in {:?}", elapsed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection_with_config, DbConfig};
    use sea_orm::{ConnectionTrait, DbBackend, Statement};

    async fn memory_db() -> DatabaseConnection {
        let config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            ..Default::default()
        };
        let db = establish_connection_with_config(&config).await.unwrap();
        db.execute(Statement::from_string(
            DbBackend::Sqlite,
            "CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT NOT NULL)".to_string(),
        ))
        .await
        .unwrap();
        db
    }

    async fn count(db: &DatabaseConnection) -> i64 {
        let row = db
            .query_one(Statement::from_string(
                DbBackend::Sqlite,
                "SELECT COUNT(*) AS n FROM notes".to_string(),
            ))
            .await
            .unwrap()
            .unwrap();
        row.try_get("", "n").unwrap()
    }

    async fn insert_note(tx: &TrackedTransaction) {
        tx.conn()
            .execute(Statement::from_string(
                DbBackend::Sqlite,
                "INSERT INTO notes (body) VALUES ('hello')".to_string(),
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn commit_persists_writes() {
        let db = memory_db().await;
        let tx = TrackedTransaction::begin(&db, "test_commit").await.unwrap();
        insert_note(&tx).await;
        tx.commit().await.unwrap();
        assert_eq!(count(&db).await, 1);
    }

    #[tokio::test]
    async fn drop_rolls_back_writes() {
        let db = memory_db().await;
        {
            let tx = TrackedTransaction::begin(&db, "test_rollback").await.unwrap();
            insert_note(&tx).await;
        }
        assert_eq!(count(&db).await, 0);
    }
}
