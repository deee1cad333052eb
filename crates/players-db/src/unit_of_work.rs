use async_trait::async_trait;
use sqlx::SqlitePool;

use players_core::{StorageError, UnitOfWork};

use crate::{storage_error, SqliteTx};

/// SQLite transactions over a pool.
///
/// Transactions start with `BEGIN IMMEDIATE`, so each one holds the write
/// lock from its first statement. Other writers queue behind it for up to the
/// pool's busy timeout, and only a timeout surfaces as
/// `StorageError::Conflict`.
#[derive(Clone)]
pub struct SqliteUnitOfWork {
    pool: SqlitePool,
}

impl SqliteUnitOfWork {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWork for SqliteUnitOfWork {
    type Tx = SqliteTx;

    async fn begin(&self) -> Result<SqliteTx, StorageError> {
        self.pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(storage_error)
    }

    async fn commit(&self, tx: SqliteTx) -> Result<(), StorageError> {
        tx.commit().await.map_err(storage_error)
    }

    async fn rollback(&self, tx: SqliteTx) -> Result<(), StorageError> {
        tx.rollback().await.map_err(storage_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::file_pool;
    use std::time::Duration;

    use futures::FutureExt;
    use players_core::within_transaction;

    async fn count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM outbox")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn stage(tx: &mut SqliteTx) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO outbox (id, aggregate, aggregate_id, type, key, payload, created_at)
             VALUES (?, 'player', ?, 'test', 'k', x'7b7d', '2024-01-01T00:00:00Z')",
        )
        .bind(uuid::Uuid::new_v4())
        .bind(uuid::Uuid::new_v4())
        .execute(&mut **tx)
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    #[tokio::test]
    async fn test_commit_on_success() {
        let (pool, _dir) = file_pool().await;
        let uow = SqliteUnitOfWork::new(pool.clone());

        let result: Result<(), StorageError> =
            within_transaction(&uow, |tx| stage(tx).boxed()).await;

        assert!(result.is_ok());
        assert_eq!(count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_rollback_on_error_keeps_original_error() {
        let (pool, _dir) = file_pool().await;
        let uow = SqliteUnitOfWork::new(pool.clone());

        let result: Result<(), StorageError> = within_transaction(&uow, |tx| {
            async move {
                stage(tx).await?;
                Err(StorageError::NotFound("player".to_string()))
            }
            .boxed()
        })
        .await;

        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert_eq!(count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let (pool, _dir) = file_pool().await;
        let uow = SqliteUnitOfWork::new(pool.clone());

        let mut tx = uow.begin().await.unwrap();
        stage(&mut tx).await.unwrap();
        drop(tx);

        assert_eq!(count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_second_writer_waits_for_the_first() {
        let (pool, _dir) = file_pool().await;
        let uow = SqliteUnitOfWork::new(pool.clone());

        let mut first = uow.begin().await.unwrap();
        stage(&mut first).await.unwrap();

        let queued = {
            let uow = uow.clone();
            tokio::spawn(async move {
                let mut second = uow.begin().await?;
                stage(&mut second).await?;
                uow.commit(second).await
            })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!queued.is_finished());
        uow.commit(first).await.unwrap();

        queued.await.unwrap().unwrap();
        assert_eq!(count(&pool).await, 2);
    }
}
