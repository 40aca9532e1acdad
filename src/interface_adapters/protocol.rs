// Wire protocol DTOs and conversions for public sync server messages.

use crate::domain::{InputCommands, Roster, TickSnapshot};
use crate::use_cases::WorldUpdate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Session id assigned to this connection when the socket is accepted.
    Identity { session_id: String },
    // Full membership, sent to everyone on any join or leave.
    Roster(RosterDto),
    // Rounded positions and action flags, sent to everyone every tick.
    TickState(TickStateDto),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    // Spawn (or respawn) this connection's entity. No payload.
    Join,
    // Partial command batch; absent keys keep their previous value.
    Input(InputCommandsDto),
    // Explicit leave; the server closes the socket afterwards.
    Leave,
}

/// Command batch as sent by clients. Unknown keys and non-boolean values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputCommandsDto {
    #[serde(default, deserialize_with = "lenient_flag")]
    pub left: Option<bool>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub up: Option<bool>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub right: Option<bool>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub down: Option<bool>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub action: Option<bool>,
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_bool())
}

impl From<InputCommandsDto> for InputCommands {
    fn from(input: InputCommandsDto) -> Self {
        Self {
            left: input.left,
            up: input.up,
            right: input.right,
            down: input.down,
            action: input.action,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PositionDto {
    pub x: f64,
    pub y: f64,
}

/// Session id -> position for every registered session.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct RosterDto(pub BTreeMap<String, PositionDto>);

impl From<Roster> for RosterDto {
    fn from(roster: Roster) -> Self {
        Self(
            roster
                .members
                .into_iter()
                .map(|(id, entry)| {
                    let position = PositionDto {
                        x: entry.x,
                        y: entry.y,
                    };
                    (id.to_string(), position)
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct EntityStateDto {
    pub x: f64,
    pub y: f64,
    pub action: bool,
}

/// Session id -> rounded state for one tick. The tick counter stays server-side.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct TickStateDto(pub BTreeMap<String, EntityStateDto>);

impl From<TickSnapshot> for TickStateDto {
    fn from(snapshot: TickSnapshot) -> Self {
        Self(
            snapshot
                .entities
                .into_iter()
                .map(|(id, e)| {
                    let state = EntityStateDto {
                        x: e.x,
                        y: e.y,
                        action: e.action,
                    };
                    (id.to_string(), state)
                })
                .collect(),
        )
    }
}

impl From<WorldUpdate> for ServerMessage {
    fn from(update: WorldUpdate) -> Self {
        match update {
            WorldUpdate::Roster(roster) => ServerMessage::Roster(roster.into()),
            WorldUpdate::TickState(snapshot) => ServerMessage::TickState(snapshot.into()),
        }
    }
}
