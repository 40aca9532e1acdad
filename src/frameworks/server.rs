// Framework bootstrap for the sync server runtime.

use crate::domain::PhysicsTuning;
use crate::frameworks::config;
use crate::interface_adapters::http::health_handler;
use crate::interface_adapters::net::{world_update_serializer, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{GameEvent, WorldSettings, WorldUpdate, world_task};

use axum::{Router, extract::ws::Utf8Bytes, routing::get};
use std::future::Future;
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};
use tokio::sync::{Notify, broadcast, mpsc, watch};

fn init_runtime() {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Serves on `listener` until the process exits.
pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    serve(listener, std::future::pending()).await
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::new(config::http_host(), config::http_port());

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    serve(listener, shutdown_signal()).await
}

async fn serve<F>(listener: tokio::net::TcpListener, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let address = listener.local_addr()?;
    let world_shutdown = Arc::new(Notify::new());
    let state = build_state(world_shutdown.clone());
    let app = router(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, "server error");
        });

    world_shutdown.notify_one();
    result
}

fn build_state(world_shutdown: Arc<Notify>) -> Arc<AppState> {
    // Setup Channels
    // input_tx/rx: All joins, leaves and inputs go to the single world task.
    let (input_tx, input_rx) = mpsc::channel::<GameEvent>(config::INPUT_CHANNEL_CAPACITY);

    // world_tx/rx: Rosters and tick-states broadcast by the world task.
    let (world_tx, _world_rx) = broadcast::channel::<WorldUpdate>(config::WORLD_BROADCAST_CAPACITY);

    // world_bytes_tx/rx: Serialized updates shared across all clients.
    let (world_bytes_tx, _world_bytes_rx) =
        broadcast::channel::<Utf8Bytes>(config::WORLD_BROADCAST_CAPACITY);
    let (roster_latest_tx, _roster_latest_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));

    let settings = WorldSettings {
        tick_interval: config::tick_interval(),
        tuning: PhysicsTuning::default(),
    };
    tracing::debug!(
        tick_interval_ms = settings.tick_interval.as_secs_f64() * 1000.0,
        "world configured"
    );

    // Subscribe the serializer before the world task can publish anything.
    tokio::spawn(world_update_serializer(
        world_tx.subscribe(),
        world_bytes_tx.clone(),
        roster_latest_tx.clone(),
    ));

    // Spawn the Game Loop (World Task)
    tokio::spawn(world_task(input_rx, world_tx, settings, world_shutdown));

    Arc::new(AppState {
        input_tx,
        world_bytes_tx,
        roster_latest_tx,
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        // Without a signal handler, keep serving instead of exiting immediately.
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
