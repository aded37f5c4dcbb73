// Wire DTOs as the client reads and writes them.
//
// Inbound parsing is lenient: absent, null or mistyped fields fall back to empty values so a
// snapshot from a slightly older or newer server still replaces the mirror cleanly.

use crate::domain::{
    EnemyKind, EnemyView, HazardView, Phase, PlayerView, PortalView, Snapshot,
};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Welcome { id: WireId },
    State(StateDto),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Move {
        x: f32,
        y: f32,
    },
    Hit {
        #[serde(rename = "enemyId")]
        enemy_id: String,
        damage: f32,
    },
    PlayerReady {
        status: bool,
    },
}

/// Ids may be numbers or strings on the wire; the mirror keeps them as strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(u64),
    Text(String),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Number(n) => n.to_string(),
            WireId::Text(s) => s,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateDto {
    #[serde(default, deserialize_with = "lenient")]
    pub tick: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub wave: u32,
    /// `None` when absent or unrecognized; the mirror then keeps its last phase.
    #[serde(default, deserialize_with = "lenient")]
    pub phase: Option<PhaseDto>,
    #[serde(default, deserialize_with = "lenient_entries")]
    pub players: BTreeMap<String, PlayerStateDto>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub enemies: Vec<EnemyStateDto>,
    #[serde(default, deserialize_with = "lenient")]
    pub portal: Option<PortalDto>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub hazards: Vec<HazardDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerStateDto {
    #[serde(default, deserialize_with = "lenient")]
    pub x: f32,
    #[serde(default, deserialize_with = "lenient")]
    pub y: f32,
    #[serde(default, deserialize_with = "lenient")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnemyStateDto {
    pub id: WireId,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub x: f32,
    #[serde(default, deserialize_with = "lenient")]
    pub y: f32,
    #[serde(default, deserialize_with = "lenient")]
    pub hp: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PortalDto {
    #[serde(default, deserialize_with = "lenient")]
    pub x: f32,
    #[serde(default, deserialize_with = "lenient")]
    pub y: f32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HazardDto {
    #[serde(default, deserialize_with = "lenient")]
    pub x: f32,
    #[serde(default, deserialize_with = "lenient")]
    pub y: f32,
    #[serde(default, deserialize_with = "lenient")]
    pub kind: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PhaseDto {
    #[serde(rename = "WAVE")]
    Wave,
    #[serde(rename = "HUB")]
    Hub,
}

impl From<PhaseDto> for Phase {
    fn from(phase: PhaseDto) -> Self {
        match phase {
            PhaseDto::Wave => Phase::Wave,
            PhaseDto::Hub => Phase::Hub,
        }
    }
}

// A field that is null or of the wrong shape falls back to its default instead of
// failing the whole snapshot.
fn lenient<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(de)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

// Sequences keep the entries that parse and drop the rest.
fn lenient_items<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(de)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| T::deserialize(item).ok())
        .collect())
}

fn lenient_entries<'de, D, T>(de: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let entries = match Value::deserialize(de)? {
        Value::Object(entries) => entries,
        _ => return Ok(BTreeMap::new()),
    };
    Ok(entries
        .into_iter()
        .filter_map(|(id, entry)| T::deserialize(entry).ok().map(|entry| (id, entry)))
        .collect())
}

fn enemy_kind(raw: Option<&str>) -> EnemyKind {
    match raw {
        Some("ranged") => EnemyKind::Ranged,
        _ => EnemyKind::Melee,
    }
}

impl From<StateDto> for Snapshot {
    fn from(dto: StateDto) -> Self {
        Snapshot {
            tick: dto.tick,
            wave: dto.wave,
            phase: dto.phase.map(Phase::from),
            players: dto
                .players
                .into_iter()
                .map(|(id, p)| PlayerView {
                    id,
                    x: p.x,
                    y: p.y,
                    avatar: p.avatar.unwrap_or_else(|| "?".to_string()),
                })
                .collect(),
            enemies: dto
                .enemies
                .into_iter()
                .map(|e| EnemyView {
                    kind: enemy_kind(e.kind.as_deref()),
                    id: e.id.into(),
                    x: e.x,
                    y: e.y,
                    hp: e.hp,
                })
                .collect(),
            portal: dto.portal.map(|p| PortalView { x: p.x, y: p.y }),
            hazards: dto
                .hazards
                .into_iter()
                .map(|h| HazardView {
                    x: h.x,
                    y: h.y,
                    kind: h.kind,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StateMirror;
    use serde_json::json;

    #[test]
    fn when_state_is_complete_then_snapshot_carries_every_field() {
        let raw = json!({
            "type": "state",
            "tick": 4,
            "wave": 2,
            "phase": "WAVE",
            "players": {"7": {"x": 1.0, "y": 2.0, "avatar": "ace"}},
            "enemies": [{"id": "e3", "type": "ranged", "x": 5.0, "y": 6.0, "hp": 1.0}],
            "portal": {"x": 0.0, "y": 400.0},
            "hazards": [{"x": 50.0, "y": 100.0, "kind": "trap"}]
        });

        let ServerMessage::State(dto) = serde_json::from_value(raw).expect("state parses") else {
            panic!("expected state");
        };
        let snap = Snapshot::from(dto);

        assert_eq!(snap.phase, Some(Phase::Wave));
        assert_eq!(snap.players[0].id, "7");
        assert_eq!(snap.players[0].avatar, "ace");
        assert_eq!(snap.enemies[0].id, "e3");
        assert_eq!(snap.enemies[0].kind, EnemyKind::Ranged);
        assert_eq!(snap.portal, Some(PortalView { x: 0.0, y: 400.0 }));
        assert_eq!(snap.hazards.len(), 1);
    }

    #[test]
    fn when_state_is_sparse_then_missing_fields_default_to_empty() {
        let msg: ServerMessage =
            serde_json::from_str(r#"{"type":"state","players":{"1":{"x":3}}}"#).expect("parses");
        let ServerMessage::State(dto) = msg else {
            panic!("expected state");
        };
        let snap = Snapshot::from(dto);

        assert_eq!(snap.phase, None);
        assert!(snap.enemies.is_empty());
        assert!(snap.portal.is_none());
        assert_eq!(snap.players[0].x, 3.0);
        assert_eq!(snap.players[0].avatar, "?");
    }

    #[test]
    fn when_welcome_id_is_numeric_then_it_becomes_a_string() {
        let msg: ServerMessage =
            serde_json::from_str(r#"{"type":"welcome","id":42}"#).expect("parses");
        let ServerMessage::Welcome { id } = msg else {
            panic!("expected welcome");
        };
        assert_eq!(String::from(id), "42");
    }

    #[test]
    fn when_intents_serialize_then_they_match_server_expectations() {
        let hit = ClientMessage::Hit {
            enemy_id: "e3".to_string(),
            damage: 1.0,
        };
        assert_eq!(
            serde_json::to_value(&hit).expect("serialize"),
            json!({"type": "hit", "enemyId": "e3", "damage": 1.0})
        );
        let ready = ClientMessage::PlayerReady { status: true };
        assert_eq!(
            serde_json::to_value(&ready).expect("serialize"),
            json!({"type": "playerReady", "status": true})
        );
    }

    fn parse_state(raw: serde_json::Value) -> Snapshot {
        match serde_json::from_value(raw).expect("state parses") {
            ServerMessage::State(dto) => Snapshot::from(dto),
            other => panic!("expected state, got {other:?}"),
        }
    }

    #[test]
    fn when_collections_are_null_then_they_become_empty() {
        let snap = parse_state(json!({
            "type": "state",
            "phase": "HUB",
            "players": null,
            "enemies": null,
            "portal": null,
            "hazards": null
        }));

        assert!(snap.players.is_empty());
        assert!(snap.enemies.is_empty());
        assert!(snap.portal.is_none());
        assert!(snap.hazards.is_empty());
        assert_eq!(snap.phase, Some(Phase::Hub));
    }

    #[test]
    fn when_phase_is_unknown_then_it_is_left_unset() {
        let snap = parse_state(json!({"type": "state", "phase": "LOBBY", "enemies": []}));
        assert_eq!(snap.phase, None);

        let snap = parse_state(json!({"type": "state", "phase": 3}));
        assert_eq!(snap.phase, None);
    }

    #[test]
    fn when_numbers_are_null_or_mistyped_then_they_default_to_zero() {
        let snap = parse_state(json!({
            "type": "state",
            "tick": "soon",
            "players": {"1": {"x": null, "y": "far", "avatar": 5}},
            "enemies": [{"id": "e1", "x": null, "y": 2.0, "hp": "lots"}],
            "portal": {"x": null, "y": 400.0}
        }));

        assert_eq!(snap.tick, 0);
        assert_eq!((snap.players[0].x, snap.players[0].y), (0.0, 0.0));
        assert_eq!(snap.players[0].avatar, "?");
        assert_eq!(snap.enemies[0].x, 0.0);
        assert_eq!(snap.enemies[0].y, 2.0);
        assert_eq!(snap.enemies[0].hp, 0.0);
        assert_eq!(snap.portal, Some(PortalView { x: 0.0, y: 400.0 }));
    }

    #[test]
    fn when_single_entries_are_malformed_then_only_those_are_dropped() {
        let snap = parse_state(json!({
            "type": "state",
            "players": {"1": {"x": 1.0}, "2": null},
            "enemies": [{"x": 1.0}, {"id": "e2", "hp": 3.0}, 7],
            "hazards": [{"x": 1.0, "y": 1.0, "kind": "spikes"}, "rock"]
        }));

        assert_eq!(snap.players.len(), 1);
        assert_eq!(snap.players[0].id, "1");
        assert_eq!(snap.enemies.len(), 1);
        assert_eq!(snap.enemies[0].id, "e2");
        assert_eq!(snap.hazards.len(), 1);
    }

    #[test]
    fn when_lenient_snapshot_follows_a_wave_then_mirror_drops_stale_wave_state() {
        let mut mirror = StateMirror::default();
        mirror.begin_session();
        mirror.apply_snapshot(parse_state(json!({
            "type": "state",
            "phase": "WAVE",
            "players": {"1": {"x": 0.0, "y": 0.0}},
            "enemies": [{"id": "e1", "type": "melee", "x": 5.0, "y": 5.0, "hp": 1.0}],
            "portal": {"x": 0.0, "y": 400.0}
        })));

        mirror.apply_snapshot(parse_state(json!({
            "type": "state",
            "phase": "LOBBY",
            "players": null,
            "enemies": null,
            "portal": null
        })));

        assert!(mirror.enemies().is_empty());
        assert_eq!(mirror.players().count(), 0);
        assert!(mirror.portal().is_none());
        assert_eq!(mirror.phase(), Phase::Wave);
    }
}
