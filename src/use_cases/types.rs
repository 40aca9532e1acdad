// Use-case level inputs/outputs for the game loop.

use crate::domain::{InputCommands, Roster, SessionId, TickSnapshot};

#[derive(Debug, Clone)]
pub enum GameEvent {
    Join {
        session_id: SessionId,
    },
    Leave {
        session_id: SessionId,
    },
    Input {
        session_id: SessionId,
        commands: InputCommands,
    },
}

#[derive(Debug, Clone)]
pub enum WorldUpdate {
    // Membership changed; sent on every join and leave.
    Roster(Roster),
    // Authoritative state after one tick.
    TickState(TickSnapshot),
}
