//! The player aggregate and its status state machine.
//!
//! All mutation goes through [`Player::change_status`] or
//! [`Player::mark_login`]. Both bump `version` by exactly one. The player
//! store compares against the version the player had when it was loaded.

use std::net::IpAddr;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::address::Address;
use crate::error::ValidationError;
use crate::event::StatusEvent;
use crate::status::{ActorType, Gender, Status};
use crate::validation::Validator;

/// Opaque key/value data attached to a player.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Construction parameters for a new player.
#[derive(Debug, Clone, Default)]
pub struct NewPlayer {
    pub email: String,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Gender,
    pub address: Address,
    pub registration_ip: Option<IpAddr>,
    pub metadata: Metadata,
    pub registered_at: Option<DateTime<Utc>>,
}

/// Every persisted field of a player, as a storage layer reads it back.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub id: Uuid,
    pub email: String,
    pub phone: Option<String>,
    pub status: Status,
    pub status_reason: Option<String>,
    pub address: Address,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Gender,
    pub registration_ip: Option<IpAddr>,
    pub registered_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub metadata: Metadata,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    id: Uuid,
    email: String,
    phone: Option<String>,
    status: Status,
    status_reason: Option<String>,
    address: Address,
    first_name: Option<String>,
    last_name: Option<String>,
    birth_date: Option<NaiveDate>,
    gender: Gender,
    registration_ip: Option<IpAddr>,
    registered_at: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    metadata: Metadata,
    version: i64,
    loaded_version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Player {
    /// Create an active player at version 1.
    pub fn create(params: NewPlayer, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let email = Validator::normalize_email(&params.email);
        Validator::validate_email(&email)?;
        if let Some(phone) = &params.phone {
            Validator::validate_phone(phone)?;
        }
        params.address.validate()?;

        Ok(Self {
            id: Uuid::new_v4(),
            email,
            phone: params.phone,
            status: Status::Active,
            status_reason: None,
            address: params.address,
            first_name: params.first_name,
            last_name: params.last_name,
            birth_date: params.birth_date,
            gender: params.gender,
            registration_ip: params.registration_ip,
            registered_at: params.registered_at,
            last_login_at: None,
            metadata: params.metadata,
            version: 1,
            loaded_version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuild a player from storage, re-checking the field invariants.
    pub fn restore(snapshot: PlayerSnapshot) -> Result<Self, ValidationError> {
        Validator::validate_email(&snapshot.email)?;
        if let Some(phone) = &snapshot.phone {
            Validator::validate_phone(phone)?;
        }
        snapshot.address.validate()?;

        Ok(Self {
            id: snapshot.id,
            email: snapshot.email,
            phone: snapshot.phone,
            status: snapshot.status,
            status_reason: snapshot.status_reason,
            address: snapshot.address,
            first_name: snapshot.first_name,
            last_name: snapshot.last_name,
            birth_date: snapshot.birth_date,
            gender: snapshot.gender,
            registration_ip: snapshot.registration_ip,
            registered_at: snapshot.registered_at,
            last_login_at: snapshot.last_login_at,
            metadata: snapshot.metadata,
            version: snapshot.version,
            loaded_version: snapshot.version,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
        })
    }

    /// Move to another status.
    ///
    /// Any status may move to any other distinct status. Moving to the current
    /// status is rejected, as is a blank reason. On success the version is
    /// bumped and the transition is returned as an event.
    pub fn change_status(
        &mut self,
        to: Status,
        reason: &str,
        actor: ActorType,
        now: DateTime<Utc>,
    ) -> Result<StatusEvent, ValidationError> {
        if to == self.status {
            return Err(ValidationError::UnchangedStatus(to));
        }
        Validator::validate_reason(reason)?;

        let from = self.status;
        self.status = to;
        self.status_reason = Some(reason.to_string());
        self.version += 1;
        self.updated_at = now;

        Ok(StatusEvent::new(
            self.id,
            from,
            to,
            reason.to_string(),
            actor,
            now,
        ))
    }

    pub fn mark_login(&mut self, at: DateTime<Utc>) {
        self.last_login_at = Some(at);
        self.version += 1;
        self.updated_at = at;
    }

    /// The version this player had when it was created or restored. Stores
    /// match on it for the optimistic lock, however many mutations followed.
    pub fn loaded_version(&self) -> i64 {
        self.loaded_version
    }

    /// The same player as a fresh load from storage would return it.
    #[cfg(any(test, feature = "test-utils"))]
    pub(crate) fn reloaded(mut self) -> Self {
        self.loaded_version = self.version;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn status_reason(&self) -> Option<&str> {
        self.status_reason.as_deref()
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    pub fn birth_date(&self) -> Option<NaiveDate> {
        self.birth_date
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn registration_ip(&self) -> Option<IpAddr> {
        self.registration_ip
    }

    pub fn registered_at(&self) -> Option<DateTime<Utc>> {
        self.registered_at
    }

    pub fn last_login_at(&self) -> Option<DateTime<Utc>> {
        self.last_login_at
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
