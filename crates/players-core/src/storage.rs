//! Storage ports and the unit-of-work contract.
//!
//! Stores never look up an ambient transaction. Every call receives a
//! [`Session`] saying whether it runs on the store's default connection or
//! inside a transaction the caller opened through a [`UnitOfWork`].

use async_trait::async_trait;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::error::StorageError;
use crate::event::StatusEvent;
use crate::outbox::OutboxMessage;
use crate::player::Player;

/// Which connection a store operation runs on.
pub enum Session<'a, Tx> {
    /// No transaction; the store uses its default connection.
    Detached,
    /// Participate in the caller's open transaction.
    Bound(&'a mut Tx),
}

impl<'a, Tx> Session<'a, Tx> {
    pub fn bound(tx: &'a mut Tx) -> Self {
        Session::Bound(tx)
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, Session::Bound(_))
    }
}

/// Trait for loading and saving players.
#[async_trait]
pub trait PlayerStore<Tx: Send>: Send + Sync {
    /// Fails with `NotFound` when no player has this id.
    async fn get_by_id(&self, session: Session<'_, Tx>, id: Uuid) -> Result<Player, StorageError>;

    /// Look up by normalized email. Fails with `NotFound` when absent.
    async fn get_by_email(
        &self,
        session: Session<'_, Tx>,
        email: &str,
    ) -> Result<Player, StorageError>;

    /// Insert a new player. A duplicate id or email fails with `DuplicateKey`.
    async fn create(&self, session: Session<'_, Tx>, player: &Player) -> Result<(), StorageError>;

    /// Persist a mutated player.
    ///
    /// The write only applies if the stored version still equals
    /// `player.loaded_version()`. Otherwise nothing changes and the call
    /// fails with `VersionConflict`.
    async fn update(&self, session: Session<'_, Tx>, player: &Player) -> Result<(), StorageError>;
}

/// Append-only log of status transitions.
#[async_trait]
pub trait StatusEventStore<Tx: Send>: Send + Sync {
    async fn append(&self, session: Session<'_, Tx>, event: &StatusEvent)
        -> Result<(), StorageError>;
}

/// Append-only staging area for integration messages.
#[async_trait]
pub trait OutboxStore<Tx: Send>: Send + Sync {
    async fn enqueue(
        &self,
        session: Session<'_, Tx>,
        message: &OutboxMessage,
    ) -> Result<(), StorageError>;
}

/// Opens, commits and rolls back transactions for one storage backend.
///
/// Dropping a `Tx` without committing must discard its writes.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    type Tx: Send + 'static;

    async fn begin(&self) -> Result<Self::Tx, StorageError>;

    async fn commit(&self, tx: Self::Tx) -> Result<(), StorageError>;

    async fn rollback(&self, tx: Self::Tx) -> Result<(), StorageError>;
}

/// Run `operation` inside one transaction.
///
/// Commits when the operation succeeds and returns the commit's own error if
/// that fails. When the operation fails the transaction is rolled back and the
/// operation's error is returned unchanged; a failing rollback is only logged.
pub async fn within_transaction<U, T, E, F>(uow: &U, operation: F) -> Result<T, E>
where
    U: UnitOfWork + ?Sized,
    T: Send,
    E: From<StorageError> + Send,
    F: for<'t> FnOnce(&'t mut U::Tx) -> BoxFuture<'t, Result<T, E>> + Send,
{
    let mut tx = uow.begin().await?;

    match operation(&mut tx).await {
        Ok(value) => {
            uow.commit(tx).await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback(tx).await {
                tracing::warn!("Rollback failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
