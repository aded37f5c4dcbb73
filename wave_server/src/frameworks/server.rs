// Framework bootstrap for the wave server runtime.

use crate::frameworks::config;
use crate::interface_adapters::net::{create_world_handler, spawn_world_serializer, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{WorldRegistry, WorldSettings, spawn_idle_reaper};

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
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

/// Routes exposed by the server; split out so tests can drive it without a socket.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/worlds", post(create_world_handler))
        .with_state(state)
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state(world_settings()).await?;
    let app = app(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn world_settings() -> WorldSettings {
    let rules = config::world_rules();
    tracing::debug!(
        quorum = ?rules.quorum,
        hit_policy = ?rules.hit_policy,
        move_policy = ?rules.move_policy,
        seed = ?rules.seed,
        "world rules configured"
    );
    WorldSettings {
        input_channel_capacity: config::INPUT_CHANNEL_CAPACITY,
        world_broadcast_capacity: config::WORLD_BROADCAST_CAPACITY,
        tick_interval: config::TICK_INTERVAL,
        rules,
        idle_timeout: config::IDLE_WORLD_TIMEOUT,
    }
}

pub async fn build_state(settings: WorldSettings) -> Result<Arc<AppState>> {
    // The registry owns the set of active world tasks.
    let world_registry = Arc::new(WorldRegistry::new(settings));

    // Keep the default world pinned so it never gets retired.
    let main_world = world_registry
        .create_world(config::DEFAULT_WORLD_ID.to_string(), true)
        .await
        .map_err(|e| std::io::Error::other(format!("failed to create default world: {e}")))?;
    spawn_world_serializer(&main_world);
    spawn_idle_reaper(&world_registry, config::IDLE_SWEEP_INTERVAL);

    Ok(Arc::new(AppState {
        world_registry,
        default_world_id: Arc::from(config::DEFAULT_WORLD_ID),
    }))
}
