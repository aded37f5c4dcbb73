// World registry for spawning and retiring independent world instances.

use crate::domain::{WorldRules, WorldSnapshot};
use crate::use_cases::GameEvent;
use crate::use_cases::game::world_task;
use axum::extract::ws::Utf8Bytes;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Notify, RwLock, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Shared configuration for spawning worlds.
#[derive(Debug, Clone)]
pub struct WorldSettings {
    /// Capacity for inbound player events.
    pub input_channel_capacity: usize,
    /// Capacity for broadcast snapshots.
    pub world_broadcast_capacity: usize,
    /// Fixed tick interval for the world loop.
    pub tick_interval: Duration,
    /// Gameplay rules every new world starts with.
    pub rules: WorldRules,
    /// How long an unpinned world may sit without connections before it is retired.
    pub idle_timeout: Duration,
}

/// Errors returned by registry operations.
#[derive(Debug, PartialEq, Eq)]
pub enum WorldError {
    /// World already exists and cannot be re-created.
    AlreadyExists,
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::AlreadyExists => write!(f, "world already exists"),
        }
    }
}

impl std::error::Error for WorldError {}

/// Per-world channels handed to connections.
#[derive(Clone)]
pub struct WorldHandle {
    /// Identifier clients use to target this world.
    pub world_id: Arc<str>,
    /// Sender for game events into the world task.
    pub input_tx: mpsc::Sender<GameEvent>,
    /// Broadcast sender for raw snapshots.
    pub world_tx: broadcast::Sender<WorldSnapshot>,
    /// Broadcast sender for serialized snapshots.
    pub world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    /// Watch sender holding the latest serialized snapshot.
    pub world_latest_tx: watch::Sender<Utf8Bytes>,
    /// Stops the world task once the world is retired.
    shutdown: Arc<Notify>,
}

struct WorldEntry {
    handle: WorldHandle,
    // Pinned worlds survive their last disconnect.
    pinned: bool,
    connections: usize,
    // Set while nobody is connected.
    idle_since: Option<Instant>,
}

impl WorldEntry {
    fn retire(self) {
        // Stored permit lets the task exit even if it is mid-tick right now.
        self.handle.shutdown.notify_one();
    }
}

/// Thread-safe registry for active worlds.
pub struct WorldRegistry {
    /// Settings applied to newly created worlds.
    settings: WorldSettings,
    /// Map of world id to active entry.
    worlds: RwLock<HashMap<String, WorldEntry>>,
}

impl WorldRegistry {
    pub fn new(settings: WorldSettings) -> Self {
        Self {
            settings,
            worlds: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a new world and spawns its task.
    pub async fn create_world(
        &self,
        world_id: String,
        pinned: bool,
    ) -> Result<WorldHandle, WorldError> {
        let mut worlds = self.worlds.write().await;
        if worlds.contains_key(&world_id) {
            return Err(WorldError::AlreadyExists);
        }

        // Channel wiring for the world loop.
        let (input_tx, input_rx) = mpsc::channel::<GameEvent>(self.settings.input_channel_capacity);
        let (world_tx, _world_rx) =
            broadcast::channel::<WorldSnapshot>(self.settings.world_broadcast_capacity);
        let (world_bytes_tx, _world_bytes_rx) =
            broadcast::channel::<Utf8Bytes>(self.settings.world_broadcast_capacity);
        let (world_latest_tx, _world_latest_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));
        let shutdown = Arc::new(Notify::new());

        tokio::spawn(world_task(
            input_rx,
            world_tx.clone(),
            self.settings.rules.clone(),
            self.settings.tick_interval,
            shutdown.clone(),
        ));

        let handle = WorldHandle {
            world_id: Arc::from(world_id.as_str()),
            input_tx,
            world_tx,
            world_bytes_tx,
            world_latest_tx,
            shutdown,
        };

        info!(world_id = %world_id, pinned, "world created");
        worlds.insert(
            world_id,
            WorldEntry {
                handle: handle.clone(),
                pinned,
                connections: 0,
                idle_since: Some(Instant::now()),
            },
        );
        Ok(handle)
    }

    /// Returns a handle for the provided id, if it exists.
    pub async fn get_world(&self, world_id: &str) -> Option<WorldHandle> {
        let worlds = self.worlds.read().await;
        worlds.get(world_id).map(|entry| entry.handle.clone())
    }

    /// Counts a live connection; returns the new count, or `None` if the world is gone.
    pub async fn register_connection(&self, world_id: &str) -> Option<usize> {
        let mut worlds = self.worlds.write().await;
        let entry = worlds.get_mut(world_id)?;
        entry.connections += 1;
        entry.idle_since = None;
        Some(entry.connections)
    }

    /// Drops a live connection and retires unpinned worlds that became empty.
    pub async fn register_disconnect(&self, world_id: &str) {
        let mut worlds = self.worlds.write().await;
        let Some(entry) = worlds.get_mut(world_id) else {
            return;
        };
        entry.connections = entry.connections.saturating_sub(1);
        if entry.connections > 0 {
            return;
        }
        if entry.pinned {
            entry.idle_since = Some(Instant::now());
            return;
        }

        if let Some(entry) = worlds.remove(world_id) {
            entry.retire();
            info!(world_id, "world retired after last disconnect");
        }
    }

    /// Retires unpinned worlds that nobody has joined within the idle timeout.
    pub async fn retire_idle(&self) -> usize {
        let timeout = self.settings.idle_timeout;
        let mut worlds = self.worlds.write().await;
        let idle: Vec<String> = worlds
            .iter()
            .filter(|(_, entry)| {
                !entry.pinned
                    && entry
                        .idle_since
                        .is_some_and(|since| since.elapsed() >= timeout)
            })
            .map(|(id, _)| id.clone())
            .collect();

        for world_id in &idle {
            if let Some(entry) = worlds.remove(world_id) {
                entry.retire();
                info!(world_id = %world_id, "world retired after idle timeout");
            }
        }
        idle.len()
    }

    pub async fn world_count(&self) -> usize {
        self.worlds.read().await.len()
    }
}

/// Periodically sweeps idle worlds; stops once the registry itself is dropped.
pub fn spawn_idle_reaper(registry: &Arc<WorldRegistry>, period: Duration) -> JoinHandle<()> {
    let registry: Weak<WorldRegistry> = Arc::downgrade(registry);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let Some(registry) = registry.upgrade() else {
                debug!("registry dropped; idle reaper exiting");
                break;
            };
            registry.retire_idle().await;
        }
    })
}
