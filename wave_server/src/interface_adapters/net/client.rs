use crate::interface_adapters::http::json_error;
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage, StateDto};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::next_id;
use crate::domain::WorldSnapshot;
use crate::use_cases::{GameEvent, WorldHandle, WorldRegistry};

use axum::{
    Error,
    extract::{
        Query, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    http::StatusCode,
    response::Response,
};
use futures::SinkExt;
use serde_json::error::Category;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    InputClosed,
    WorldUpdatesClosed,
    ClosedBeforeWelcome,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct ConnectQuery {
    // The world id the client wants to join.
    #[serde(default)]
    world_id: Option<String>,
    // Cosmetic token shown next to the player.
    #[serde(default)]
    avatar: Option<String>,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const MAX_AVATAR_CHARS: usize = 16;
const DEFAULT_AVATAR: &str = "?";

pub async fn world_snapshot_serializer(
    mut world_rx: broadcast::Receiver<WorldSnapshot>,
    world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    world_latest_tx: watch::Sender<Utf8Bytes>,
) {
    // Serialize each snapshot once and broadcast the shared bytes.
    loop {
        match world_rx.recv().await {
            Ok(snapshot) => {
                let msg = ServerMessage::State(StateDto::from(snapshot));
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize world snapshot");
                        continue;
                    }
                };

                let bytes = Utf8Bytes::from(txt);
                // Store the latest bytes for bootstrap and lag recovery.
                let _ = world_latest_tx.send(bytes.clone());
                let _ = world_bytes_tx.send(bytes);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "world serializer lagged; skipping to latest snapshot");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("world snapshot channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub fn spawn_world_serializer(world: &WorldHandle) {
    tokio::spawn(world_snapshot_serializer(
        world.world_tx.subscribe(),
        world.world_bytes_tx.clone(),
        world.world_latest_tx.clone(),
    ));
}

fn sanitize_avatar(raw: Option<String>) -> String {
    let trimmed: String = raw
        .as_deref()
        .unwrap_or_default()
        .trim()
        .chars()
        .take(MAX_AVATAR_CHARS)
        .collect();
    if trimmed.is_empty() {
        DEFAULT_AVATAR.to_string()
    } else {
        trimmed
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Response {
    let world_id = query
        .world_id
        .unwrap_or_else(|| state.default_world_id.to_string());

    let world = match state.world_registry.get_world(&world_id).await {
        Some(world) => world,
        None => return json_error(StatusCode::NOT_FOUND, "world not found"),
    };

    let avatar = sanitize_avatar(query.avatar);
    let world_registry = state.world_registry.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, world, world_registry, avatar))
}

async fn handle_socket(
    mut socket: WebSocket,
    world: WorldHandle,
    world_registry: Arc<WorldRegistry>,
    avatar: String,
) {
    // Separate connection id for correlating logs before/after a player_id exists.
    let conn_id = next_id();
    let span = info_span!("conn", conn_id, player_id = tracing::field::Empty);
    let _enter = span.enter();

    // Register first so the world cannot be retired while we bootstrap.
    if world_registry
        .register_connection(&world.world_id)
        .await
        .is_none()
    {
        warn!(world_id = %world.world_id, "world missing during connection registration");
        let _ = send_close_with_reason(&mut socket, close_code::AGAIN, "world unavailable").await;
        return;
    }

    let mut ctx = match bootstrap_connection(&mut socket, &world, world_registry.clone(), avatar)
        .await
    {
        Ok(ctx) => ctx,
        Err(NetError::ClosedBeforeWelcome) => {
            info!("client disconnected during bootstrap");
            world_registry.register_disconnect(&world.world_id).await;
            return;
        }
        Err(e) => {
            error!(error = ?e, "failed to bootstrap connection");
            world_registry.register_disconnect(&world.world_id).await;
            let _ = send_close_with_reason(&mut socket, close_code::ERROR, "bootstrap failed").await;
            return;
        }
    };

    span.record("player_id", ctx.player_id);
    info!(
        player_id = ctx.player_id,
        world_id = %ctx.world_id,
        avatar = %ctx.avatar,
        "client connected"
    );

    // Main Client Loop
    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

#[derive(Debug, Default)]
struct ConnStats {
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
    ignored: u64,
    // Count lag recovery snapshots sent to this client.
    lag_recovery_count: u64,
}

struct LogThrottle {
    input_full: Instant,
    world_lag: Instant,
    invalid_input: Instant,
}

impl LogThrottle {
    fn new() -> Self {
        let now = Instant::now() - LOG_THROTTLE;
        Self {
            input_full: now,
            world_lag: now,
            invalid_input: now,
        }
    }
}

struct ConnCtx {
    player_id: u64,
    avatar: String,
    // World id this connection is attached to.
    world_id: Arc<str>,
    world_registry: Arc<WorldRegistry>,
    input_tx: mpsc::Sender<GameEvent>,
    world_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    world_latest_rx: watch::Receiver<Utf8Bytes>,
    stats: ConnStats,
    throttle: LogThrottle,
    close_frame: Option<CloseFrame>,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    world: &WorldHandle,
    world_registry: Arc<WorldRegistry>,
    avatar: String,
) -> Result<ConnCtx, NetError> {
    // Subscribe before any await so no snapshot slips between welcome and the loop.
    let world_bytes_rx = world.world_bytes_tx.subscribe();
    let world_latest_rx = world.world_latest_tx.subscribe();

    let player_id = next_id();
    let mut stats = ConnStats::default();

    let welcome = ServerMessage::Welcome {
        id: player_id.to_string(),
    };
    match send_message(socket, &welcome).await {
        Ok(bytes) => {
            stats.msgs_out += 1;
            stats.bytes_out += bytes as u64;
        }
        Err(NetError::Ws(e)) => {
            debug!(error = %e, "welcome send failed");
            return Err(NetError::ClosedBeforeWelcome);
        }
        Err(e) => return Err(e),
    }

    // Join happens after welcome so the client knows its id before it shows up in a snapshot.
    world
        .input_tx
        .send(GameEvent::Join {
            player_id,
            avatar: avatar.clone(),
        })
        .await
        .map_err(|_| NetError::InputClosed)?;

    // Give late joiners the current picture right away instead of waiting a tick.
    let latest = world_latest_rx.borrow().clone();
    if !latest.is_empty() {
        let len = latest.len();
        if let Err(e) = socket.send(Message::Text(latest)).await {
            // Compensate so the world does not keep a player that never connected.
            let _ = world.input_tx.send(GameEvent::Leave { player_id }).await;
            return Err(NetError::Ws(e));
        }
        stats.msgs_out += 1;
        stats.bytes_out += len as u64;
    }

    Ok(ConnCtx {
        player_id,
        avatar,
        world_id: world.world_id.clone(),
        world_registry,
        input_tx: world.input_tx.clone(),
        world_bytes_rx,
        world_latest_rx,
        stats,
        throttle: LogThrottle::new(),
        close_frame: None,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

/// Maps a parsed client message to a world event, dropping non-finite values.
fn to_game_event(player_id: u64, msg: ClientMessage) -> Option<GameEvent> {
    match msg {
        ClientMessage::Move { x, y } => {
            if !x.is_finite() || !y.is_finite() {
                return None;
            }
            Some(GameEvent::Move { player_id, x, y })
        }
        ClientMessage::Hit { enemy_id, damage } => {
            if !damage.is_finite() || damage <= 0.0 {
                return None;
            }
            let enemy_id = enemy_id.enemy_id()?;
            Some(GameEvent::Hit {
                player_id,
                enemy_id,
                damage,
            })
        }
        ClientMessage::PlayerReady { status } => Some(GameEvent::Ready { player_id, status }),
    }
}

fn forward_event(
    player_id: u64,
    input_tx: &mpsc::Sender<GameEvent>,
    event: GameEvent,
    throttle: &mut LogThrottle,
) -> Result<LoopControl, NetError> {
    match input_tx.try_send(event) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_evt)) => {
            if should_log(&mut throttle.input_full) {
                warn!(player_id, "input channel full; dropping event");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_evt)) => Err(NetError::InputClosed),
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;

    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        input_tx,
        world_bytes_rx,
        world_latest_rx,
        stats,
        throttle,
        close_frame,
        ..
    } = &mut *ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect: bool = tokio::select! {
            incoming = socket.recv() => {
                match handle_incoming_ws(incoming, player_id, input_tx, stats, throttle, close_frame) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            world_msg = world_bytes_rx.recv() => {
                match world_msg {
                    Ok(bytes) => matches!(
                        forward_world_bytes(bytes, socket, stats).await,
                        LoopControl::Disconnect
                    ),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(&mut throttle.world_lag) {
                            warn!(missed = n, "world snapshots lagged; sending latest");
                        }

                        // Snapshots are total, so the latest one fully resyncs the client.
                        let latest = world_latest_rx.borrow().clone();
                        if latest.is_empty() {
                            false
                        } else {
                            stats.lag_recovery_count += 1;
                            matches!(
                                forward_world_bytes(latest, socket, stats).await,
                                LoopControl::Disconnect
                            )
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
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(ctx).await {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    player_id: u64,
    input_tx: &mpsc::Sender<GameEvent>,
    stats: &mut ConnStats,
    throttle: &mut LogThrottle,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                stats.msgs_in += 1;
                stats.bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => match to_game_event(player_id, msg) {
                        Some(event) => forward_event(player_id, input_tx, event, throttle),
                        None => {
                            if should_log(&mut throttle.invalid_input) {
                                warn!(player_id, "invalid input values; dropping");
                            }
                            Ok(LoopControl::Continue)
                        }
                    },
                    // Well-formed JSON we do not understand: unknown type or missing fields.
                    Err(parse_err) if parse_err.classify() == Category::Data => {
                        stats.ignored += 1;
                        debug!(player_id, error = %parse_err, "ignoring unrecognized message");
                        Ok(LoopControl::Continue)
                    }
                    Err(parse_err) => {
                        stats.invalid_json += 1;
                        if should_log(&mut throttle.invalid_input) {
                            warn!(
                                player_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if stats.invalid_json > MAX_INVALID_JSON {
                            *close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                *close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(player_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(player_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_world_bytes(
    world_msg: Utf8Bytes,
    socket: &mut WebSocket,
    stats: &mut ConnStats,
) -> LoopControl {
    let bytes_len = world_msg.len();
    match socket.send(Message::Text(world_msg)).await {
        Ok(()) => {
            stats.msgs_out += 1;
            stats.bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            warn!(error = ?err, "failed to send world snapshot");
            LoopControl::Disconnect
        }
    }
}

async fn disconnect_cleanup(ctx: &ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;

    // Release the registry slot even if the world task is already gone.
    let leave = ctx
        .input_tx
        .send(GameEvent::Leave { player_id })
        .await
        .map_err(|_| NetError::InputClosed);
    ctx.world_registry.register_disconnect(&ctx.world_id).await;

    let stats = &ctx.stats;
    debug!(
        player_id,
        msgs_in = stats.msgs_in,
        msgs_out = stats.msgs_out,
        bytes_in = stats.bytes_in,
        bytes_out = stats.bytes_out,
        invalid_json = stats.invalid_json,
        ignored = stats.ignored,
        lag_recovery_count = stats.lag_recovery_count,
        "connection stats"
    );
    info!(player_id, "client disconnected");
    leave
}
