//! In-memory implementations of the storage ports, for tests.
//!
//! Transactions buffer their writes and re-check every precondition when they
//! commit, so two transactions that loaded the same player version behave like
//! two database transactions racing on a conditional update.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::{OutboxStore, PlayerStore, Session, StatusEventStore, UnitOfWork};
use crate::error::StorageError;
use crate::event::StatusEvent;
use crate::outbox::OutboxMessage;
use crate::player::Player;

#[derive(Debug, Default)]
struct Tables {
    players: HashMap<Uuid, Player>,
    events: Vec<StatusEvent>,
    outbox: Vec<OutboxMessage>,
}

#[derive(Debug, Clone)]
enum Write {
    InsertPlayer(Player),
    UpdatePlayer(Player),
    AppendEvent(StatusEvent),
    Enqueue(OutboxMessage),
}

/// A pending in-memory transaction. Dropping it discards its writes.
#[derive(Debug, Default)]
pub struct InMemoryTx {
    writes: Vec<Write>,
}

impl InMemoryTx {
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }
}

/// Shared tables plus factories for the stores and unit of work over them.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit_of_work(&self) -> InMemoryUnitOfWork {
        InMemoryUnitOfWork { db: self.clone() }
    }

    pub fn player_store(&self) -> InMemoryPlayerStore {
        InMemoryPlayerStore { db: self.clone() }
    }

    pub fn event_store(&self) -> InMemoryStatusEventStore {
        InMemoryStatusEventStore { db: self.clone() }
    }

    pub fn outbox_store(&self) -> InMemoryOutboxStore {
        InMemoryOutboxStore { db: self.clone() }
    }

    /// Committed status events, in append order.
    pub fn status_events(&self) -> Vec<StatusEvent> {
        self.read().map(|t| t.events.clone()).unwrap_or_default()
    }

    /// Committed outbox messages, in staging order.
    pub fn outbox_messages(&self) -> Vec<OutboxMessage> {
        self.read().map(|t| t.outbox.clone()).unwrap_or_default()
    }

    /// Committed player count.
    pub fn player_count(&self) -> usize {
        self.read().map(|t| t.players.len()).unwrap_or_default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StorageError> {
        self.tables
            .read()
            .map_err(|_| StorageError::Database("in-memory tables poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StorageError> {
        self.tables
            .write()
            .map_err(|_| StorageError::Database("in-memory tables poisoned".to_string()))
    }

    /// Players as the given session sees them: committed rows overlaid with
    /// the session's own pending writes.
    fn visible_players(
        &self,
        session: &Session<'_, InMemoryTx>,
    ) -> Result<HashMap<Uuid, Player>, StorageError> {
        let mut players = self.read()?.players.clone();
        if let Session::Bound(tx) = session {
            for write in &tx.writes {
                if let Write::InsertPlayer(p) | Write::UpdatePlayer(p) = write {
                    players.insert(p.id(), p.clone());
                }
            }
        }
        Ok(players)
    }

    /// Stage a write in the session, or apply it at once when detached.
    fn record(&self, session: Session<'_, InMemoryTx>, write: Write) -> Result<(), StorageError> {
        match session {
            Session::Bound(tx) => {
                tx.writes.push(write);
                Ok(())
            }
            Session::Detached => apply(&mut *self.write()?, vec![write]),
        }
    }
}

/// Check every write against the committed tables, then apply all or none.
fn apply(tables: &mut Tables, writes: Vec<Write>) -> Result<(), StorageError> {
    let mut players = tables.players.clone();
    for write in &writes {
        match write {
            Write::InsertPlayer(player) => {
                check_insert(&players, player)?;
                players.insert(player.id(), player.clone());
            }
            Write::UpdatePlayer(player) => {
                check_update(&players, player)?;
                players.insert(player.id(), player.clone());
            }
            Write::AppendEvent(_) | Write::Enqueue(_) => {}
        }
    }

    tables.players = players;
    for write in writes {
        match write {
            Write::AppendEvent(event) => tables.events.push(event),
            Write::Enqueue(message) => tables.outbox.push(message),
            Write::InsertPlayer(_) | Write::UpdatePlayer(_) => {}
        }
    }
    Ok(())
}

fn check_insert(players: &HashMap<Uuid, Player>, player: &Player) -> Result<(), StorageError> {
    if players.contains_key(&player.id()) {
        return Err(StorageError::DuplicateKey(format!("players.id {}", player.id())));
    }
    if players.values().any(|p| p.email() == player.email()) {
        return Err(StorageError::DuplicateKey(format!(
            "players.email {}",
            player.email()
        )));
    }
    Ok(())
}

fn check_update(players: &HashMap<Uuid, Player>, player: &Player) -> Result<(), StorageError> {
    let expected = player.loaded_version();
    match players.get(&player.id()) {
        Some(current) if current.version() == expected => Ok(()),
        _ => Err(StorageError::VersionConflict {
            id: player.id(),
            expected,
        }),
    }
}

pub struct InMemoryUnitOfWork {
    db: InMemoryDatabase,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<InMemoryTx, StorageError> {
        Ok(InMemoryTx::default())
    }

    async fn commit(&self, tx: InMemoryTx) -> Result<(), StorageError> {
        apply(&mut *self.db.write()?, tx.writes)
    }

    async fn rollback(&self, tx: InMemoryTx) -> Result<(), StorageError> {
        drop(tx);
        Ok(())
    }
}

pub struct InMemoryPlayerStore {
    db: InMemoryDatabase,
}

#[async_trait]
impl PlayerStore<InMemoryTx> for InMemoryPlayerStore {
    async fn get_by_id(
        &self,
        session: Session<'_, InMemoryTx>,
        id: Uuid,
    ) -> Result<Player, StorageError> {
        self.db
            .visible_players(&session)?
            .remove(&id)
            .map(Player::reloaded)
            .ok_or_else(|| StorageError::NotFound(format!("player {id}")))
    }

    async fn get_by_email(
        &self,
        session: Session<'_, InMemoryTx>,
        email: &str,
    ) -> Result<Player, StorageError> {
        self.db
            .visible_players(&session)?
            .into_values()
            .find(|p| p.email() == email)
            .map(Player::reloaded)
            .ok_or_else(|| StorageError::NotFound(format!("player with email {email}")))
    }

    async fn create(
        &self,
        session: Session<'_, InMemoryTx>,
        player: &Player,
    ) -> Result<(), StorageError> {
        check_insert(&self.db.visible_players(&session)?, player)?;
        self.db.record(session, Write::InsertPlayer(player.clone()))
    }

    async fn update(
        &self,
        session: Session<'_, InMemoryTx>,
        player: &Player,
    ) -> Result<(), StorageError> {
        check_update(&self.db.visible_players(&session)?, player)?;
        self.db.record(session, Write::UpdatePlayer(player.clone()))
    }
}

pub struct InMemoryStatusEventStore {
    db: InMemoryDatabase,
}

#[async_trait]
impl StatusEventStore<InMemoryTx> for InMemoryStatusEventStore {
    async fn append(
        &self,
        session: Session<'_, InMemoryTx>,
        event: &StatusEvent,
    ) -> Result<(), StorageError> {
        self.db.record(session, Write::AppendEvent(event.clone()))
    }
}

pub struct InMemoryOutboxStore {
    db: InMemoryDatabase,
}

#[async_trait]
impl OutboxStore<InMemoryTx> for InMemoryOutboxStore {
    async fn enqueue(
        &self,
        session: Session<'_, InMemoryTx>,
        message: &OutboxMessage,
    ) -> Result<(), StorageError> {
        self.db.record(session, Write::Enqueue(message.clone()))
    }
}
