use crate::domain::state::{EnemyKind, SimEnemy};
use crate::domain::tuning::{ArenaTuning, EnemyTuning, WaveTuning};
use rand::Rng;

/// Kind for the `index`-th (0-based) enemy of a batch: every `ranged_every`-th is ranged.
pub fn kind_for_index(index: u32, ranged_every: u32) -> EnemyKind {
    if ranged_every > 0 && (index + 1) % ranged_every == 0 {
        EnemyKind::Ranged
    } else {
        EnemyKind::Melee
    }
}

/// Spawns the full enemy batch for `wave`, assigning ids from `next_enemy_id`.
pub fn spawn_batch<R: Rng + ?Sized>(
    rng: &mut R,
    wave: u32,
    next_enemy_id: &mut u64,
    waves: &WaveTuning,
    enemies: &EnemyTuning,
    arena: &ArenaTuning,
) -> Vec<SimEnemy> {
    let count = waves.enemy_count(wave);
    (0..count)
        .map(|index| {
            let kind = kind_for_index(index, waves.ranged_every);
            let (x, y) = edge_position(rng, arena);
            let id = *next_enemy_id;
            *next_enemy_id = next_enemy_id.wrapping_add(1);
            SimEnemy {
                id,
                kind,
                x,
                y,
                hp: enemies.hp(kind),
                alive: true,
                speed: enemies.speed(kind),
            }
        })
        .collect()
}

// Random point just inside one of the four arena walls.
fn edge_position<R: Rng + ?Sized>(rng: &mut R, arena: &ArenaTuning) -> (f32, f32) {
    let inner = arena.half_size - arena.spawn_margin;
    let along = rng.gen_range(-1.0f32..=1.0) * arena.half_size;
    match rng.gen_range(0..4) {
        0 => (-inner, along),
        1 => (inner, along),
        2 => (along, -inner),
        _ => (along, inner),
    }
}
