// Local copy of the last authoritative snapshot plus session bookkeeping.

use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Hub,
    Wave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnemyKind {
    #[default]
    Melee,
    Ranged,
}

/// Lifecycle of the session feeding this mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Never connected.
    #[default]
    Idle,
    Connected,
    /// The transport failed or the server closed the socket.
    Ended,
    /// The local side called `disconnect`.
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnemyView {
    /// Wire id, sent back verbatim in `hit`.
    pub id: String,
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    pub hp: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortalView {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HazardView {
    pub x: f32,
    pub y: f32,
    pub kind: String,
}

/// One authoritative snapshot in client terms. `phase` is optional because older servers
/// omit it.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub tick: u64,
    pub wave: u32,
    pub phase: Option<Phase>,
    pub players: Vec<PlayerView>,
    pub enemies: Vec<EnemyView>,
    pub portal: Option<PortalView>,
    pub hazards: Vec<HazardView>,
}

#[derive(Debug, Clone, Default)]
pub struct StateMirror {
    // Bumped per connect so a stale reader cannot touch a newer session.
    session: u64,
    status: SessionStatus,
    self_id: Option<String>,
    players: BTreeMap<String, PlayerView>,
    enemies: Vec<EnemyView>,
    portal: Option<PortalView>,
    hazards: Vec<HazardView>,
    phase: Phase,
    wave: u32,
    tick: u64,
    predicted_kills: HashSet<String>,
}

impl StateMirror {
    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn self_id(&self) -> Option<&str> {
        self.self_id.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn portal(&self) -> Option<PortalView> {
        self.portal
    }

    pub fn hazards(&self) -> &[HazardView] {
        &self.hazards
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerView> {
        self.players.values()
    }

    pub fn player(&self, id: &str) -> Option<&PlayerView> {
        self.players.get(id)
    }

    /// Our own entry, once `welcome` has arrived and a snapshot included us.
    pub fn local_player(&self) -> Option<&PlayerView> {
        self.self_id.as_deref().and_then(|id| self.players.get(id))
    }

    /// Everyone except us. Before `welcome` this includes our own entry.
    pub fn remote_players(&self) -> impl Iterator<Item = &PlayerView> {
        let me = self.self_id.as_deref();
        self.players.values().filter(move |p| Some(p.id.as_str()) != me)
    }

    /// Enemies to draw and shoot at: none in the hub, minus locally predicted kills.
    pub fn visible_enemies(&self) -> impl Iterator<Item = &EnemyView> {
        let in_wave = self.phase == Phase::Wave;
        self.enemies
            .iter()
            .filter(move |e| in_wave && !self.predicted_kills.contains(&e.id))
    }

    /// Raw stored enemy list, regardless of phase.
    pub fn enemies(&self) -> &[EnemyView] {
        &self.enemies
    }

    /// Starts a fresh session; everything from the previous one is discarded.
    pub fn begin_session(&mut self) -> u64 {
        let next = self.session + 1;
        *self = StateMirror {
            session: next,
            status: SessionStatus::Connected,
            ..StateMirror::default()
        };
        next
    }

    pub fn set_self_id(&mut self, id: String) {
        self.self_id = Some(id);
    }

    /// Replaces the whole picture. A missing phase keeps the current one.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.tick = snapshot.tick;
        self.wave = snapshot.wave;
        if let Some(phase) = snapshot.phase {
            self.phase = phase;
        }
        self.players = snapshot
            .players
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        self.enemies = snapshot.enemies;
        self.portal = snapshot.portal;
        self.hazards = snapshot.hazards;
        self.predicted_kills.clear();
    }

    /// Hides an enemy until the next snapshot settles its fate.
    pub fn predict_kill(&mut self, enemy_id: &str) {
        self.predicted_kills.insert(enemy_id.to_string());
    }

    /// Drops all mirrored state and records why the session stopped.
    pub fn end_session(&mut self, status: SessionStatus) {
        *self = StateMirror {
            session: self.session,
            status,
            ..StateMirror::default()
        };
    }
}
