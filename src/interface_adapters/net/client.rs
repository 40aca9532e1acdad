use crate::domain::{InputCommands, SessionId};
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::new_session_id;
use crate::use_cases::{GameEvent, WorldUpdate};

use axum::{
    Error,
    extract::{
        State,
        ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{Instrument, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    InputClosed,
    WorldUpdatesClosed,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

pub async fn world_update_serializer(
    mut world_rx: broadcast::Receiver<WorldUpdate>,
    world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    roster_latest_tx: watch::Sender<Utf8Bytes>,
) {
    // Serialize each world update once and broadcast the shared bytes.
    loop {
        match world_rx.recv().await {
            Ok(update) => {
                let is_roster = matches!(update, WorldUpdate::Roster(_));
                let msg = ServerMessage::from(update);
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize world update");
                        continue;
                    }
                };

                let bytes = Utf8Bytes::from(txt);
                if is_roster {
                    // Keep the latest roster for clients that fall behind.
                    let _ = roster_latest_tx.send(bytes.clone());
                }
                let _ = world_bytes_tx.send(bytes);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    missed = n,
                    "world serializer lagged; skipping to latest update"
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("world updates channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        // The transport owns identity: one fresh id per accepted socket.
        let session_id = new_session_id();
        let span = info_span!("conn", session_id = %session_id);
        handle_socket(socket, state, session_id).instrument(span)
    })
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, session_id: SessionId) {
    // Subscribe before the first await so no broadcast is missed.
    let mut ctx = ConnCtx::new(session_id, &state);

    let identity = ServerMessage::Identity {
        session_id: ctx.session_id.to_string(),
    };
    match send_message(&mut socket, &identity).await {
        Ok(bytes) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes as u64;
        }
        Err(e) => {
            // Nothing reached the registry yet, so there is nothing to clean up.
            warn!(error = ?e, "failed to send identity");
            return;
        }
    }
    info!("client connected");

    // Main Client Loop
    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    // Serialize message safely; log JSON errors instead of panicking
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

struct ConnCtx {
    pub session_id: SessionId,
    pub input_tx: mpsc::Sender<GameEvent>,
    pub world_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    pub roster_latest_rx: watch::Receiver<Utf8Bytes>,
    // Count lag recovery rosters sent to this client.
    pub lag_recovery_count: u64,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,

    pub invalid_json: u32,

    pub last_world_lag_log: Instant,
    pub last_invalid_input_log: Instant,
}

impl ConnCtx {
    fn new(session_id: SessionId, state: &AppState) -> Self {
        let now = Instant::now() - LOG_THROTTLE;
        Self {
            session_id,
            input_tx: state.input_tx.clone(),
            world_bytes_rx: state.world_bytes_tx.subscribe(),
            roster_latest_rx: state.roster_latest_tx.subscribe(),
            lag_recovery_count: 0,

            msgs_in: 0,
            msgs_out: 0,
            bytes_in: 0,
            bytes_out: 0,

            invalid_json: 0,

            last_world_lag_log: now,
            last_invalid_input_log: now,
        }
    }
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

// Inputs are partial merges; every one must reach the world, including releases.
async fn process_input_message(
    session_id: &SessionId,
    input_tx: &mpsc::Sender<GameEvent>,
    commands: InputCommands,
) -> Result<LoopControl, NetError> {
    input_tx
        .send(GameEvent::Input {
            session_id: session_id.clone(),
            commands,
        })
        .await
        .map_err(|_| NetError::InputClosed)?;
    Ok(LoopControl::Continue)
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        session_id,
        input_tx,
        world_bytes_rx,
        roster_latest_rx,
        lag_recovery_count,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        last_world_lag_log,
        last_invalid_input_log,
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        // disconnect becomes true on error
        let disconnect: bool = tokio::select! {
            // Incoming Message from Client
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    incoming,
                    session_id,
                    input_tx,
                    msgs_in,
                    bytes_in,
                    invalid_json,
                                last_invalid_input_log,
                ).await {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            // Outgoing Roster / TickState
            world_msg = world_bytes_rx.recv() => {
                match world_msg {
                    Ok(bytes) => match forward_world_bytes(bytes, socket, msgs_out, bytes_out).await {
                        LoopControl::Continue => false,
                        LoopControl::Disconnect => true,
                    },
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(last_world_lag_log) {
                            warn!(missed = n, "world updates lagged; resending roster");
                        }

                        // Missed tick-states are superseded by the next one; a missed roster is
                        // not, so resync membership from the latest roster.
                        let latest = roster_latest_rx.borrow().clone();
                        if latest.is_empty() {
                            false
                        } else {
                            *lag_recovery_count += 1;
                            match forward_world_bytes(latest, socket, msgs_out, bytes_out).await {
                                LoopControl::Continue => false,
                                LoopControl::Disconnect => true,
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::WorldUpdatesClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(
        session_id,
        input_tx,
        *msgs_in,
        *msgs_out,
        *bytes_in,
        *bytes_out,
        *invalid_json,
        *lag_recovery_count,
    )
    .await
    {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    if let Some(err) = fatal {
        Err(err)
    } else {
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    session_id: &SessionId,
    input_tx: &mpsc::Sender<GameEvent>,
    msgs_in: &mut u64,
    bytes_in: &mut u64,
    invalid_json: &mut u32,
    last_invalid_input_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                *msgs_in += 1;
                *bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join) => {
                        // A repeated Join respawns the entity.
                        input_tx
                            .send(GameEvent::Join {
                                session_id: session_id.clone(),
                            })
                            .await
                            .map_err(|_| NetError::InputClosed)?;
                        Ok(LoopControl::Continue)
                    }
                    Ok(ClientMessage::Input(input)) => {
                        process_input_message(session_id, input_tx, input.into()).await
                    }
                    Ok(ClientMessage::Leave) => {
                        info!("client requested leave");
                        Ok(LoopControl::Disconnect)
                    }
                    Err(parse_err) => {
                        // Malformed messages are dropped without telling the client.
                        *invalid_json += 1;
                        if should_log(last_invalid_input_log) {
                            warn!(
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }
                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(data) => {
                *msgs_in += 1;
                *bytes_in += data.len() as u64;
                if should_log(last_invalid_input_log) {
                    warn!(bytes = data.len(), "binary message ignored");
                }
                Ok(LoopControl::Continue)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!("websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_world_bytes(
    world_msg: Utf8Bytes,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    let bytes_len = world_msg.len();
    match socket
        .send(Message::Text(world_msg))
        .await
        .map_err(NetError::Ws)
    {
        Ok(()) => {
            *msgs_out += 1;
            *bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send world update");
            LoopControl::Disconnect
        }
    }
}

// Runs exactly once per connection, whatever ended it.
#[allow(clippy::too_many_arguments)]
async fn disconnect_cleanup(
    session_id: &SessionId,
    input_tx: &mpsc::Sender<GameEvent>,
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
    lag_recovery_count: u64,
) -> Result<(), NetError> {
    input_tx
        .send(GameEvent::Leave {
            session_id: session_id.clone(),
        })
        .await
        .map_err(|_| NetError::InputClosed)?;

    debug!(
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        lag_recovery_count,
        "connection stats"
    );
    info!("client disconnected");
    Ok(())
}
