// Domain-level simulation entities and snapshot types.

/// Global simulation phase shared by every connected player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Safe zone between waves; no enemies exist.
    #[default]
    Hub,
    /// Combat is active and enemies pursue players.
    Wave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyKind {
    Melee,
    Ranged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardKind {
    Barrier,
    Trap,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Portal {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hazard {
    pub x: f32,
    pub y: f32,
    pub kind: HazardKind,
}

pub struct SimPlayer {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub avatar: String,

    // Phase-exit intent; only meaningful while standing in an exit zone.
    pub ready: bool,
}

pub struct SimEnemy {
    pub id: u64,
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    pub hp: f32,
    pub alive: bool,

    // Movement-only state (do not serialize to clients)
    pub speed: f32, // px/s
}

#[derive(Debug, Clone)]
pub struct PlayerSnapshot {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub avatar: String,
}

#[derive(Debug, Clone)]
pub struct EnemySnapshot {
    pub id: u64,
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    pub hp: f32,
}

/// Complete authoritative state broadcast after every tick.
#[derive(Debug, Clone)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub wave: u32,
    pub phase: Phase,
    pub players: Vec<PlayerSnapshot>,
    pub enemies: Vec<EnemySnapshot>,
    pub portal: Option<Portal>,
    pub hazards: Vec<Hazard>,
}

impl From<&SimPlayer> for PlayerSnapshot {
    fn from(p: &SimPlayer) -> Self {
        Self {
            id: p.id,
            x: p.x,
            y: p.y,
            avatar: p.avatar.clone(),
        }
    }
}

impl From<&SimEnemy> for EnemySnapshot {
    fn from(e: &SimEnemy) -> Self {
        Self {
            id: e.id,
            kind: e.kind,
            x: e.x,
            y: e.y,
            hp: e.hp,
        }
    }
}
