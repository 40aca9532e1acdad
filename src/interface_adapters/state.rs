use crate::use_cases::GameEvent;
use axum::extract::ws::Utf8Bytes;
use tokio::sync::{broadcast, mpsc, watch};

#[derive(Clone)]
pub struct AppState {
    // Join/leave/input events flowing from the network into the world task.
    pub input_tx: mpsc::Sender<GameEvent>,
    // Serialized rosters and tick-states, shared across all connections.
    pub world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    // Latest serialized roster for lag recovery.
    pub roster_latest_tx: watch::Sender<Utf8Bytes>,
}
