//! Enumerations persisted as small integer codes.
//!
//! Each enum carries an explicit code table in both directions. Decoding an
//! unknown code yields `None`; callers decide how loudly to fail.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Account status. Code 0 is reserved for "unknown" and has no variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Blocked,
    Frozen,
    Closed,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Active,
        Status::Blocked,
        Status::Frozen,
        Status::Closed,
    ];

    pub fn code(self) -> i16 {
        match self {
            Status::Active => 1,
            Status::Blocked => 2,
            Status::Frozen => 3,
            Status::Closed => 4,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Status::Active),
            2 => Some(Status::Blocked),
            3 => Some(Status::Frozen),
            4 => Some(Status::Closed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Blocked => "blocked",
            Status::Frozen => "frozen",
            Status::Closed => "closed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    None,
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 4] = [Gender::None, Gender::Male, Gender::Female, Gender::Other];

    pub fn code(self) -> i16 {
        match self {
            Gender::None => 0,
            Gender::Male => 1,
            Gender::Female => 2,
            Gender::Other => 3,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Gender::None),
            1 => Some(Gender::Male),
            2 => Some(Gender::Female),
            3 => Some(Gender::Other),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::None => "none",
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gender::ALL
            .into_iter()
            .find(|gender| gender.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidGender(s.to_string()))
    }
}

/// The class of caller that triggered a status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorType {
    Player,
    Administrator,
    System,
}

impl ActorType {
    pub const ALL: [ActorType; 3] = [ActorType::Player, ActorType::Administrator, ActorType::System];

    pub fn code(self) -> i16 {
        match self {
            ActorType::Player => 1,
            ActorType::Administrator => 2,
            ActorType::System => 3,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(ActorType::Player),
            2 => Some(ActorType::Administrator),
            3 => Some(ActorType::System),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActorType::Player => "player",
            ActorType::Administrator => "administrator",
            ActorType::System => "system",
        }
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActorType::ALL
            .into_iter()
            .find(|actor| actor.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidActor(s.to_string()))
    }
}
