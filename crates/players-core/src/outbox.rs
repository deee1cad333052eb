use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::event::StatusEvent;

/// Aggregate tag for messages about players.
pub const PLAYER_AGGREGATE: &str = "player";

/// Type tag for status transitions.
pub const STATUS_CHANGED: &str = "player.status.changed";

/// An integration message staged for later relay.
///
/// Staged inside the same transaction as the state change it describes.
/// `published_at` stays `None` here; only the external relay sets it.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub aggregate: String,
    pub aggregate_id: Uuid,
    pub message_type: String,
    pub key: String,
    pub payload: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl OutboxMessage {
    pub fn new<P: Serialize>(
        aggregate: &str,
        aggregate_id: Uuid,
        message_type: &str,
        key: String,
        payload: &P,
        at: DateTime<Utc>,
    ) -> Result<Self, serde_json::Error> {
        let payload = serde_json::to_vec(payload)?;
        Ok(Self {
            id: Uuid::new_v4(),
            aggregate: aggregate.to_string(),
            aggregate_id,
            message_type: message_type.to_string(),
            key,
            payload,
            created_at: at,
            published_at: None,
        })
    }

    /// Wrap a status event, keyed by the player it belongs to.
    pub fn status_changed(event: &StatusEvent, at: DateTime<Utc>) -> Result<Self, serde_json::Error> {
        Self::new(
            PLAYER_AGGREGATE,
            event.player_id,
            STATUS_CHANGED,
            event.player_id.to_string(),
            &event.payload(),
            at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{ActorType, Status};

    #[test]
    fn test_status_changed_message() {
        let player_id = Uuid::new_v4();
        let at = Utc::now();
        let event = StatusEvent::new(
            player_id,
            Status::Active,
            Status::Frozen,
            "chargeback".to_string(),
            ActorType::System,
            at,
        );

        let msg = OutboxMessage::status_changed(&event, at).unwrap();
        assert_eq!(msg.aggregate, "player");
        assert_eq!(msg.aggregate_id, player_id);
        assert_eq!(msg.message_type, "player.status.changed");
        assert_eq!(msg.key, player_id.to_string());
        assert_eq!(msg.published_at, None);

        let body: serde_json::Value = serde_json::from_slice(&msg.payload).unwrap();
        assert_eq!(body["id"], event.id.to_string());
        assert_eq!(body["to_status"], "frozen");
        assert_eq!(body["reason"], "chargeback");
        assert_eq!(body["actor_type"], "system");
    }
}
