use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::{ActorType, Status};

/// One status transition of a player. Append-only; never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub id: Uuid,
    pub player_id: Uuid,
    pub from: Status,
    pub to: Status,
    pub reason: String,
    pub actor: ActorType,
    pub created_at: DateTime<Utc>,
}

impl StatusEvent {
    pub fn new(
        player_id: Uuid,
        from: Status,
        to: Status,
        reason: String,
        actor: ActorType,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id,
            from,
            to,
            reason,
            actor,
            created_at: at,
        }
    }

    /// Body published to integration consumers for this transition.
    pub fn payload(&self) -> StatusChangedPayload {
        StatusChangedPayload {
            id: self.id.to_string(),
            player_id: self.player_id.to_string(),
            from_status: self.from.as_str(),
            to_status: self.to.as_str(),
            reason: self.reason.clone(),
            actor_type: self.actor.as_str(),
            created_at: self.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
        }
    }
}

/// Wire shape of a `player.status.changed` message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusChangedPayload {
    pub id: String,
    pub player_id: String,
    pub from_status: &'static str,
    pub to_status: &'static str,
    pub reason: String,
    pub actor_type: &'static str,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_payload_uses_text_names() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let event = StatusEvent::new(
            Uuid::new_v4(),
            Status::Active,
            Status::Blocked,
            "fraud".to_string(),
            ActorType::Administrator,
            at,
        );

        let payload = event.payload();
        assert_eq!(payload.player_id, event.player_id.to_string());
        assert_eq!(payload.from_status, "active");
        assert_eq!(payload.to_status, "blocked");
        assert_eq!(payload.actor_type, "administrator");
        assert_eq!(payload.created_at, "2024-03-01T12:00:00.000000000Z");
    }
}
