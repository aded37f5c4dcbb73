use crate::domain::state::{Hazard, HazardKind};
use crate::domain::tuning::ArenaTuning;
use rand::Rng;

const PLACEMENT_ATTEMPTS: u32 = 10;

/// Scatters grid-aligned hazards, keeping portal spots clear.
///
/// A hazard that cannot find a clear cell within a few attempts is skipped, so fewer than
/// `hazard_count` may come back.
pub fn generate<R: Rng + ?Sized>(rng: &mut R, arena: &ArenaTuning) -> Vec<Hazard> {
    let cells = ((arena.half_size * 2.0) / arena.hazard_grid).floor().max(1.0) as u32;
    let spots = arena.portal_spots();
    let clearance_sq = arena.hazard_clearance * arena.hazard_clearance;

    let mut hazards = Vec::new();
    for _ in 0..arena.hazard_count {
        for _ in 0..PLACEMENT_ATTEMPTS {
            let x = rng.gen_range(0..cells) as f32 * arena.hazard_grid - arena.half_size;
            let y = rng.gen_range(0..cells) as f32 * arena.hazard_grid - arena.half_size;
            let clear = spots
                .iter()
                .all(|(px, py)| (x - px).powi(2) + (y - py).powi(2) >= clearance_sq);
            if clear {
                let kind = if rng.gen_bool(0.5) {
                    HazardKind::Barrier
                } else {
                    HazardKind::Trap
                };
                hazards.push(Hazard { x, y, kind });
                break;
            }
        }
    }
    hazards
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn when_hazards_generate_then_none_block_a_portal_spot() {
        let arena = ArenaTuning::default();
        for seed in 0..25 {
            let mut rng = StdRng::seed_from_u64(seed);
            let hazards = generate(&mut rng, &arena);
            assert!(hazards.len() <= arena.hazard_count as usize);
            for h in hazards {
                for (px, py) in arena.portal_spots() {
                    assert!(((h.x - px).powi(2) + (h.y - py).powi(2)).sqrt() >= 80.0);
                }
                assert_eq!(h.x % arena.hazard_grid, 0.0);
            }
        }
    }

    #[test]
    fn when_hazard_count_is_zero_then_nothing_spawns() {
        let arena = ArenaTuning {
            hazard_count: 0,
            ..ArenaTuning::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate(&mut rng, &arena).is_empty());
    }
}
