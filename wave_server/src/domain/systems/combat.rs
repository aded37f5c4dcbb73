use crate::domain::state::SimEnemy;
use tracing::debug;

/// Result of adjudicating a client-reported hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitOutcome {
    /// No enemy with that id exists in the current wave.
    UnknownEnemy,
    /// The enemy already died; nothing changes.
    AlreadyDead,
    /// The validation stage refused the claim.
    Rejected,
    Damaged { hp: f32 },
    Killed,
}

/// Applies a hit claim against `enemy_id`, consulting `allow` before touching hit points.
///
/// Dead enemies stay in the slice (marked `alive = false`) until the caller prunes them, so a
/// repeated claim in the same tick resolves to `AlreadyDead` rather than double-removing.
pub fn adjudicate_hit(
    enemies: &mut [SimEnemy],
    enemy_id: u64,
    damage: f32,
    allow: impl FnOnce(&SimEnemy) -> bool,
) -> HitOutcome {
    let Some(enemy) = enemies.iter_mut().find(|e| e.id == enemy_id) else {
        return HitOutcome::UnknownEnemy;
    };
    if !enemy.alive || enemy.hp <= 0.0 {
        return HitOutcome::AlreadyDead;
    }
    if !allow(enemy) {
        return HitOutcome::Rejected;
    }

    enemy.hp = (enemy.hp - damage).max(0.0);
    if enemy.hp <= 0.0 {
        enemy.alive = false;
        debug!(enemy_id, "enemy killed");
        HitOutcome::Killed
    } else {
        HitOutcome::Damaged { hp: enemy.hp }
    }
}

/// Drops dead enemies so they never reach a snapshot.
pub fn remove_dead(enemies: &mut Vec<SimEnemy>) {
    enemies.retain(|e| e.alive);
}
