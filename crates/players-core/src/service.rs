//! Player use cases.
//!
//! Each public operation is one unit of work: the aggregate decides, the
//! stores persist, and all writes of an operation commit or roll back together.
//! Nothing here retries; conflicts go back to the caller.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::address::Address;
use crate::clock::Clock;
use crate::error::{PlayerError, StorageError, ValidationError};
use crate::event::StatusEvent;
use crate::outbox::OutboxMessage;
use crate::player::{Metadata, NewPlayer, Player};
use crate::status::{ActorType, Gender, Status};
use crate::storage::{
    within_transaction, OutboxStore, PlayerStore, Session, StatusEventStore, UnitOfWork,
};

/// Input for registering a player. Plain data, as a transport layer decoded it.
#[derive(Debug, Clone, Default)]
pub struct CreatePlayer {
    pub email: String,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub country_code: Option<String>,
    pub locale: Option<String>,
    pub time_zone: Option<String>,
    pub registration_ip: Option<String>,
    pub metadata: Metadata,
    pub registered_at: Option<DateTime<Utc>>,
}

impl CreatePlayer {
    /// Normalize into aggregate parameters. Pure, so it runs before any I/O.
    ///
    /// Blank optional text counts as absent. Country codes are upper-cased;
    /// gender defaults to `none`.
    pub fn into_params(self) -> Result<NewPlayer, ValidationError> {
        let address = Address::new(
            non_blank(self.country_code).map(|code| code.to_uppercase()),
            non_blank(self.locale),
            non_blank(self.time_zone),
        )?;

        let gender = match non_blank(self.gender) {
            Some(gender) => gender.to_lowercase().parse()?,
            None => Gender::None,
        };

        let registration_ip = non_blank(self.registration_ip)
            .map(|ip| {
                ip.parse::<IpAddr>()
                    .map_err(|_| ValidationError::InvalidRegistrationIp(ip))
            })
            .transpose()?;

        Ok(NewPlayer {
            email: self.email,
            phone: non_blank(self.phone),
            first_name: non_blank(self.first_name),
            last_name: non_blank(self.last_name),
            birth_date: self.birth_date,
            gender,
            address,
            registration_ip,
            metadata: self.metadata,
            registered_at: self.registered_at,
        })
    }
}

/// Input for a status transition.
#[derive(Debug, Clone)]
pub struct ChangeStatus {
    pub player_id: Uuid,
    pub to_status: String,
    pub reason: String,
    pub actor: ActorType,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Application service for the player aggregate.
pub struct PlayerService<U: UnitOfWork> {
    uow: Arc<U>,
    players: Arc<dyn PlayerStore<U::Tx>>,
    events: Arc<dyn StatusEventStore<U::Tx>>,
    outbox: Option<Arc<dyn OutboxStore<U::Tx>>>,
    clock: Arc<dyn Clock>,
    transaction_timeout: Option<Duration>,
}

impl<U: UnitOfWork + 'static> PlayerService<U> {
    pub fn new(
        uow: Arc<U>,
        players: Arc<dyn PlayerStore<U::Tx>>,
        events: Arc<dyn StatusEventStore<U::Tx>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            uow,
            players,
            events,
            outbox: None,
            clock,
            transaction_timeout: None,
        }
    }

    /// Stage a `player.status.changed` message with every transition.
    pub fn with_outbox(mut self, outbox: Arc<dyn OutboxStore<U::Tx>>) -> Self {
        self.outbox = Some(outbox);
        self
    }

    /// Abandon (and roll back) any unit of work that runs longer than `limit`.
    pub fn with_transaction_timeout(mut self, limit: Duration) -> Self {
        self.transaction_timeout = Some(limit);
        self
    }

    pub fn has_outbox(&self) -> bool {
        self.outbox.is_some()
    }

    /// Register a new player.
    ///
    /// The email uniqueness check and the insert share one transaction. The
    /// storage uniqueness constraint remains the final backstop; a duplicate
    /// key reported by the store also surfaces as `Conflict`.
    pub async fn create_player(&self, cmd: CreatePlayer) -> Result<Player, PlayerError> {
        let now = self.clock.now();
        let player = Player::create(cmd.into_params()?, now)?;

        let players = Arc::clone(&self.players);
        let created = self
            .transact(move |tx| {
                Box::pin(async move {
                    match players.get_by_email(Session::Bound(&mut *tx), player.email()).await {
                        Ok(existing) => {
                            return Err(PlayerError::Conflict(format!(
                                "email {} already registered",
                                existing.email()
                            )))
                        }
                        Err(StorageError::NotFound(_)) => {}
                        Err(err) => return Err(err.into()),
                    }
                    players.create(Session::Bound(&mut *tx), &player).await?;
                    Ok(player)
                })
            })
            .await?;

        tracing::info!(player_id = %created.id(), "Player created");
        Ok(created)
    }

    /// Move a player to another status.
    ///
    /// The player update, the status event and (when configured) the outbox
    /// message are written in one transaction. A concurrent writer that got
    /// there first turns the update into `Conflict`.
    pub async fn change_status(
        &self,
        cmd: ChangeStatus,
    ) -> Result<(Player, StatusEvent), PlayerError> {
        let now = self.clock.now();
        let to: Status = cmd.to_status.trim().to_lowercase().parse()?;
        let ChangeStatus {
            player_id,
            reason,
            actor,
            ..
        } = cmd;

        let players = Arc::clone(&self.players);
        let events = Arc::clone(&self.events);
        let outbox = self.outbox.clone();
        let (player, event) = self
            .transact(move |tx| {
                Box::pin(async move {
                    let mut player = players.get_by_id(Session::Bound(&mut *tx), player_id).await?;
                    let event = player.change_status(to, &reason, actor, now)?;

                    players.update(Session::Bound(&mut *tx), &player).await?;
                    events.append(Session::Bound(&mut *tx), &event).await?;

                    if let Some(outbox) = outbox {
                        let message = OutboxMessage::status_changed(&event, now).map_err(|e| {
                            PlayerError::Internal(format!("Failed to encode outbox payload: {e}"))
                        })?;
                        outbox.enqueue(Session::Bound(&mut *tx), &message).await?;
                    }

                    Ok((player, event))
                })
            })
            .await
            .inspect_err(|err| {
                if err.is_retryable() {
                    tracing::debug!(%player_id, "Status change lost a version race: {}", err);
                }
            })?;

        tracing::info!(
            player_id = %player.id(),
            from = %event.from,
            to = %event.to,
            actor = %event.actor,
            version = player.version(),
            "Player status changed"
        );
        Ok((player, event))
    }

    /// Record a login, bumping the version under the same optimistic lock.
    pub async fn record_login(&self, player_id: Uuid) -> Result<Player, PlayerError> {
        let now = self.clock.now();

        let players = Arc::clone(&self.players);
        let player = self
            .transact(move |tx| {
                Box::pin(async move {
                    let mut player = players.get_by_id(Session::Bound(&mut *tx), player_id).await?;
                    player.mark_login(now);
                    players.update(Session::Bound(&mut *tx), &player).await?;
                    Ok(player)
                })
            })
            .await?;

        tracing::debug!(player_id = %player.id(), version = player.version(), "Login recorded");
        Ok(player)
    }

    /// Read the latest committed state. Runs outside any transaction.
    pub async fn get_player(&self, player_id: Uuid) -> Result<Player, PlayerError> {
        Ok(self.players.get_by_id(Session::Detached, player_id).await?)
    }

    async fn transact<T, F>(&self, operation: F) -> Result<T, PlayerError>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut U::Tx) -> BoxFuture<'t, Result<T, PlayerError>> + Send,
    {
        let work = within_transaction(self.uow.as_ref(), operation);
        match self.transaction_timeout {
            Some(limit) => tokio::time::timeout(limit, work).await.map_err(|_| {
                tracing::warn!("Unit of work abandoned after {}ms", limit.as_millis());
                PlayerError::Internal(format!(
                    "unit of work exceeded its {}ms deadline",
                    limit.as_millis()
                ))
            })?,
            None => work.await,
        }
    }
}
