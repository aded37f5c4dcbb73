// Wire protocol DTOs and conversions for public wave server messages.
// Every message is a JSON object whose `type` field names the variant.

use crate::domain::{EnemyKind, HazardKind, Phase, WorldSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    // Assigned identity for the connection, sent once before any state.
    Welcome { id: String },
    // Full authoritative snapshot; replaces whatever the client holds.
    State(StateDto),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    // Absolute position of the client's own player.
    Move { x: f32, y: f32 },
    // Client-detected projectile collision; adjudicated by the world.
    Hit {
        #[serde(rename = "enemyId")]
        enemy_id: WireId,
        damage: f32,
    },
    // Intent to leave the current phase through the portal or hub exit.
    PlayerReady { status: bool },
}

/// Entity ids arrive either as numbers or strings across client revisions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(u64),
    Text(String),
}

impl WireId {
    /// Accepts `7`, `"7"` and the `"e7"` form the server emits.
    pub fn enemy_id(&self) -> Option<u64> {
        match self {
            WireId::Number(n) => Some(*n),
            WireId::Text(s) => {
                let s = s.trim();
                s.strip_prefix('e').unwrap_or(s).parse().ok()
            }
        }
    }
}

pub fn enemy_wire_id(id: u64) -> String {
    format!("e{id}")
}

/// Snapshot of the world sent to clients on each tick.
#[derive(Debug, Clone, Serialize)]
pub struct StateDto {
    pub tick: u64,
    pub wave: u32,
    pub phase: PhaseDto,
    pub players: BTreeMap<String, PlayerStateDto>,
    pub enemies: Vec<EnemyStateDto>,
    pub portal: Option<PortalDto>,
    pub hazards: Vec<HazardDto>,
}

impl From<WorldSnapshot> for StateDto {
    fn from(snapshot: WorldSnapshot) -> Self {
        Self {
            tick: snapshot.tick,
            wave: snapshot.wave,
            phase: snapshot.phase.into(),
            players: snapshot
                .players
                .into_iter()
                .map(|p| {
                    (
                        p.id.to_string(),
                        PlayerStateDto {
                            x: p.x,
                            y: p.y,
                            avatar: p.avatar,
                        },
                    )
                })
                .collect(),
            enemies: snapshot
                .enemies
                .into_iter()
                .map(|e| EnemyStateDto {
                    id: enemy_wire_id(e.id),
                    kind: e.kind.into(),
                    x: e.x,
                    y: e.y,
                    hp: e.hp,
                })
                .collect(),
            portal: snapshot.portal.map(|p| PortalDto { x: p.x, y: p.y }),
            hazards: snapshot
                .hazards
                .into_iter()
                .map(|h| HazardDto {
                    x: h.x,
                    y: h.y,
                    kind: h.kind.into(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerStateDto {
    pub x: f32,
    pub y: f32,
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnemyStateDto {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EnemyKindDto,
    pub x: f32,
    pub y: f32,
    pub hp: f32,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKindDto {
    Melee,
    Ranged,
}

impl From<EnemyKind> for EnemyKindDto {
    fn from(kind: EnemyKind) -> Self {
        match kind {
            EnemyKind::Melee => EnemyKindDto::Melee,
            EnemyKind::Ranged => EnemyKindDto::Ranged,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PortalDto {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct HazardDto {
    pub x: f32,
    pub y: f32,
    pub kind: HazardKindDto,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardKindDto {
    Barrier,
    Trap,
}

impl From<HazardKind> for HazardKindDto {
    fn from(kind: HazardKind) -> Self {
        match kind {
            HazardKind::Barrier => HazardKindDto::Barrier,
            HazardKind::Trap => HazardKindDto::Trap,
        }
    }
}

/// Phase names as the browser clients compare them.
#[derive(Debug, Clone, Copy, Serialize)]
pub enum PhaseDto {
    #[serde(rename = "WAVE")]
    Wave,
    #[serde(rename = "HUB")]
    Hub,
}

impl From<Phase> for PhaseDto {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Wave => PhaseDto::Wave,
            Phase::Hub => PhaseDto::Hub,
        }
    }
}
