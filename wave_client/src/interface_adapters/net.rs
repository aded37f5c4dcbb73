// WebSocket transport: one session at a time, a reader task feeding the mirror and a
// writer task draining queued intents.

use crate::domain::emitter::{DEFAULT_MIN_DELTA, MoveCoalescer};
use crate::domain::{SessionStatus, Snapshot, StateMirror};
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage};

use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use serde_json::error::Category;
use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::net::TcpStream;
use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite, tungstenite::Message,
};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub enum ClientError {
    /// The WebSocket handshake failed.
    Connect(Box<tungstenite::Error>),
    /// No live session to send through.
    NotConnected,
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Connect(e) => write!(f, "failed to connect: {e}"),
            ClientError::NotConnected => write!(f, "not connected"),
        }
    }
}

impl std::error::Error for ClientError {}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// How often the writer flushes the coalesced position.
    pub send_interval: Duration,
    /// Queue depth between the handle and the writer task.
    pub outbound_capacity: usize,
    /// Smallest position change worth sending.
    pub min_delta: f32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            send_interval: Duration::from_millis(33),
            outbound_capacity: 256,
            min_delta: DEFAULT_MIN_DELTA,
        }
    }
}

#[derive(Debug)]
enum Intent {
    // Coalesced by the writer; only the newest position per send tick goes out.
    Move { x: f32, y: f32 },
    Send(ClientMessage),
}

struct Session {
    intent_tx: mpsc::Sender<Intent>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

/// Handle owned by the game side. Reads come from the mirror; writes are fire-and-forget.
pub struct NetClient {
    settings: ClientSettings,
    mirror_tx: watch::Sender<StateMirror>,
    session: Option<Session>,
    last_drop_log: Instant,
}

impl NetClient {
    pub fn new(settings: ClientSettings) -> Self {
        let (mirror_tx, _mirror_rx) = watch::channel(StateMirror::default());
        Self {
            settings,
            mirror_tx,
            session: None,
            last_drop_log: Instant::now() - LOG_THROTTLE,
        }
    }

    /// Snapshot of the mirror, cloned once so callers can read it for a whole frame.
    pub fn mirror(&self) -> StateMirror {
        self.mirror_tx.borrow().clone()
    }

    /// Change notifications for callers that prefer to await new snapshots.
    pub fn subscribe(&self) -> watch::Receiver<StateMirror> {
        self.mirror_tx.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some() && self.mirror_tx.borrow().status() == SessionStatus::Connected
    }

    /// Opens a session to `url`, closing any previous one first.
    pub async fn connect(&mut self, url: &str) -> Result<(), ClientError> {
        self.disconnect().await;

        let (ws, _response) = connect_async(url)
            .await
            .map_err(|e| ClientError::Connect(Box::new(e)))?;
        let (sink, stream) = ws.split();

        let mut session_id = 0;
        self.mirror_tx.send_modify(|m| session_id = m.begin_session());

        let closed = Arc::new(Notify::new());
        let (intent_tx, intent_rx) = mpsc::channel(self.settings.outbound_capacity.max(1));

        let reader = tokio::spawn(read_loop(
            stream,
            self.mirror_tx.clone(),
            session_id,
            closed.clone(),
        ));
        let writer = tokio::spawn(write_loop(
            sink,
            intent_rx,
            self.settings.clone(),
            closed,
        ));

        self.session = Some(Session {
            intent_tx,
            reader,
            writer,
        });
        info!(url, session = session_id, "connected");
        Ok(())
    }

    /// Closes the session (if any) and clears the mirror.
    pub async fn disconnect(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let Session {
            intent_tx,
            reader,
            mut writer,
        } = session;

        // Dropping the queue tells the writer to send a close frame and exit.
        drop(intent_tx);
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut writer)
            .await
            .is_err()
        {
            warn!("writer did not exit in time; aborting");
            writer.abort();
        }
        reader.abort();
        let _ = reader.await;

        self.mirror_tx
            .send_modify(|m| m.end_session(SessionStatus::Closed));
        info!("disconnected");
    }

    pub fn send_move(&mut self, x: f32, y: f32) -> Result<(), ClientError> {
        if !x.is_finite() || !y.is_finite() {
            return Ok(());
        }
        self.enqueue(Intent::Move { x, y })
    }

    pub fn send_hit(&mut self, enemy_id: &str, damage: f32) -> Result<(), ClientError> {
        self.enqueue(Intent::Send(ClientMessage::Hit {
            enemy_id: enemy_id.to_string(),
            damage,
        }))
    }

    pub fn send_ready(&mut self, status: bool) -> Result<(), ClientError> {
        self.enqueue(Intent::Send(ClientMessage::PlayerReady { status }))
    }

    /// Hides an enemy locally until the next snapshot says otherwise.
    pub fn predict_kill(&self, enemy_id: &str) {
        self.mirror_tx.send_modify(|m| m.predict_kill(enemy_id));
    }

    fn enqueue(&mut self, intent: Intent) -> Result<(), ClientError> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }
        let Some(session) = self.session.as_ref() else {
            return Err(ClientError::NotConnected);
        };

        match session.intent_tx.try_send(intent) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                if self.last_drop_log.elapsed() >= LOG_THROTTLE {
                    self.last_drop_log = Instant::now();
                    warn!(intent = ?dropped, "outbound queue full; dropping intent");
                }
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(ClientError::NotConnected),
        }
    }
}

impl Default for NetClient {
    fn default() -> Self {
        Self::new(ClientSettings::default())
    }
}

impl Drop for NetClient {
    fn drop(&mut self) {
        // No runtime to await a graceful close here, so stop the tasks outright.
        if let Some(session) = self.session.take() {
            session.reader.abort();
            session.writer.abort();
        }
    }
}

fn apply_message(mirror_tx: &watch::Sender<StateMirror>, session: u64, msg: ServerMessage) {
    mirror_tx.send_if_modified(|m| {
        if m.session() != session || m.status() != SessionStatus::Connected {
            return false;
        }
        match msg {
            ServerMessage::Welcome { id } => m.set_self_id(id.into()),
            ServerMessage::State(dto) => m.apply_snapshot(Snapshot::from(dto)),
        }
        true
    });
}

async fn read_loop(
    mut stream: SplitStream<WsStream>,
    mirror_tx: watch::Sender<StateMirror>,
    session: u64,
    closed: Arc<Notify>,
) {
    let reason = loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerMessage>(&text) {
                Ok(msg) => apply_message(&mirror_tx, session, msg),
                // Valid JSON of a kind we do not know yet.
                Err(e) if e.classify() == Category::Data => {
                    debug!(error = %e, "ignoring unrecognized server message");
                }
                Err(e) => break format!("malformed frame: {e}"),
            },
            Some(Ok(Message::Close(frame))) => {
                break match frame {
                    Some(frame) => format!("server closed: {}", u16::from(frame.code)),
                    None => "server closed".to_string(),
                };
            }
            Some(Ok(Message::Binary(_))) => break "unexpected binary frame".to_string(),
            Some(Ok(_)) => {}
            Some(Err(e)) => break format!("transport error: {e}"),
            None => break "stream ended".to_string(),
        }
    };

    info!(session, reason = %reason, "session ended");
    mirror_tx.send_if_modified(|m| {
        if m.session() != session || m.status() != SessionStatus::Connected {
            return false;
        }
        m.end_session(SessionStatus::Ended);
        true
    });
    closed.notify_one();
}

async fn send_json(
    sink: &mut SplitSink<WsStream, Message>,
    msg: &ClientMessage,
) -> Result<(), tungstenite::Error> {
    match serde_json::to_string(msg) {
        Ok(txt) => sink.send(Message::text(txt)).await,
        Err(e) => {
            warn!(error = %e, "failed to serialize intent");
            Ok(())
        }
    }
}

async fn write_loop(
    mut sink: SplitSink<WsStream, Message>,
    mut intent_rx: mpsc::Receiver<Intent>,
    settings: ClientSettings,
    closed: Arc<Notify>,
) {
    let mut moves = MoveCoalescer::new(settings.min_delta);
    let mut ticker = tokio::time::interval(settings.send_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let result = tokio::select! {
            intent = intent_rx.recv() => match intent {
                Some(Intent::Move { x, y }) => {
                    moves.push(x, y);
                    Ok(())
                }
                Some(Intent::Send(msg)) => send_json(&mut sink, &msg).await,
                None => {
                    // Handle asked us to stop; flush a last position then close politely.
                    if let Some((x, y)) = moves.take() {
                        let _ = send_json(&mut sink, &ClientMessage::Move { x, y }).await;
                    }
                    if let Err(e) = sink.close().await {
                        debug!(error = %e, "close frame not delivered");
                    }
                    break;
                }
            },
            _ = ticker.tick() => match moves.take() {
                Some((x, y)) => send_json(&mut sink, &ClientMessage::Move { x, y }).await,
                None => Ok(()),
            },
            _ = closed.notified() => break,
        };

        if let Err(e) = result {
            debug!(error = %e, "writer stopping after send failure");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn when_not_connected_then_sends_are_refused() {
        let mut client = NetClient::default();

        assert!(matches!(
            client.send_move(1.0, 2.0),
            Err(ClientError::NotConnected)
        ));
        assert!(matches!(
            client.send_hit("e1", 1.0),
            Err(ClientError::NotConnected)
        ));
        assert!(matches!(
            client.send_ready(true),
            Err(ClientError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn when_disconnecting_without_a_session_then_mirror_stays_idle() {
        let mut client = NetClient::default();
        client.disconnect().await;

        assert_eq!(client.mirror().status(), SessionStatus::Idle);
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn when_server_is_unreachable_then_connect_fails() {
        let mut client = NetClient::default();
        // Port 9 (discard) is almost never listening on loopback.
        let result = client.connect("ws://127.0.0.1:9/ws").await;

        assert!(matches!(result, Err(ClientError::Connect(_))));
        assert!(!client.is_connected());
    }
}
