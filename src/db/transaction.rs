/*!
 * Transaction Helper Utilities
 *
 * Runs a unit of work inside one database transaction: commit on `Ok`,
 * rollback on `Err`, with the caller's error type preserved.
 */

use metrics::{counter, histogram};
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionError, TransactionTrait};
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};
use uuid::Uuid;

/// Type alias for boxed future used in transactions
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Execute a function within a database transaction
///
/// This helper ensures:
/// - Automatic rollback on error
/// - Automatic commit on success
/// - The closure's own error type comes back unchanged
///
/// # Example
///
/// ```rust,ignore
/// use warehouse_ledger::db::with_transaction;
///
/// let posting = with_transaction(&db, move |txn| {
///     Box::pin(async move { service.receipt(txn, &order).await })
/// })
/// .await?;
/// ```
pub async fn with_transaction<F, T, E>(db: &DatabaseConnection, f: F) -> Result<T, E>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, E>> + Send,
    T: Send,
    E: From<DbErr> + std::error::Error + Send,
{
    let transaction_id = Uuid::new_v4();
    let start = std::time::Instant::now();

    debug!(transaction_id = %transaction_id, "Starting database transaction");
    counter!("warehouse_ledger.db.transaction.started", 1);

    let result = db.transaction::<F, T, E>(f).await;

    let elapsed = start.elapsed();
    histogram!("warehouse_ledger.db.transaction.duration", elapsed);

    match &result {
        Ok(_) => {
            counter!("warehouse_ledger.db.transaction.committed", 1);
            debug!(transaction_id = %transaction_id, "Transaction committed in {:?}", elapsed);
        }
        Err(e) => {
            counter!("warehouse_ledger.db.transaction.rolled_back", 1);
            warn!(
                transaction_id = %transaction_id,
                error = %e,
                "Transaction rolled back after {:?}",
                elapsed
            );
        }
    }

    result.map_err(|e| match e {
        TransactionError::Connection(db_err) => E::from(db_err),
        TransactionError::Transaction(err) => err,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ServiceError;
    use assert_matches::assert_matches;
    use sea_orm::{ConnectionTrait, DbBackend, Statement};

    async fn scratch_db() -> DatabaseConnection {
        let db = crate::db::establish_connection("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        db.execute(Statement::from_string(
            DbBackend::Sqlite,
            "CREATE TABLE scratch (id INTEGER PRIMARY KEY, note TEXT NOT NULL)".to_string(),
        ))
        .await
        .expect("create scratch table");
        db
    }

    async fn row_count(db: &DatabaseConnection) -> i64 {
        let row = db
            .query_one(Statement::from_string(
                DbBackend::Sqlite,
                "SELECT COUNT(*) AS n FROM scratch".to_string(),
            ))
            .await
            .expect("count query")
            .expect("one row");
        row.try_get::<i64>("", "n").expect("count column")
    }

    #[tokio::test]
    async fn test_transaction_commit() {
        let db = scratch_db().await;

        let value = with_transaction::<_, _, ServiceError>(&db, |txn| {
            Box::pin(async move {
                txn.execute(Statement::from_string(
                    DbBackend::Sqlite,
                    "INSERT INTO scratch (note) VALUES ('kept')".to_string(),
                ))
                .await?;
                Ok(42)
            })
        })
        .await
        .expect("commit");

        assert_eq!(value, 42);
        assert_eq!(row_count(&db).await, 1);
    }

    #[tokio::test]
    async fn test_transaction_rollback_on_error() {
        let db = scratch_db().await;

        let result = with_transaction::<_, (), ServiceError>(&db, |txn| {
            Box::pin(async move {
                txn.execute(Statement::from_string(
                    DbBackend::Sqlite,
                    "INSERT INTO scratch (note) VALUES ('discarded')".to_string(),
                ))
                .await?;
                Err(ServiceError::InsufficientStock("lot 1 holds 0".into()))
            })
        })
        .await;

        assert_matches!(result, Err(ServiceError::InsufficientStock(_)));
        assert_eq!(row_count(&db).await, 0);
    }
}
