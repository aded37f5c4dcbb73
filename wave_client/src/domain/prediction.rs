// Local motion integration and zone checks matching the server's rules.

pub const ARENA_HALF_SIZE: f32 = 450.0;
pub const PORTAL_RADIUS: f32 = 50.0;
pub const HUB_EXIT_MIN_X: f32 = 350.0;
pub const HUB_EXIT_MAX_X: f32 = 450.0;

/// Moves `pos` along `dir` (normalized here) and clamps to the arena.
pub fn step(pos: (f32, f32), dir: (f32, f32), speed: f32, dt: f32) -> (f32, f32) {
    let len = (dir.0 * dir.0 + dir.1 * dir.1).sqrt();
    if len <= f32::EPSILON || !len.is_finite() {
        return pos;
    }
    let x = pos.0 + dir.0 / len * speed * dt;
    let y = pos.1 + dir.1 / len * speed * dt;
    (
        x.clamp(-ARENA_HALF_SIZE, ARENA_HALF_SIZE),
        y.clamp(-ARENA_HALF_SIZE, ARENA_HALF_SIZE),
    )
}

pub fn in_portal(pos: (f32, f32), portal: (f32, f32)) -> bool {
    let dx = pos.0 - portal.0;
    let dy = pos.1 - portal.1;
    dx * dx + dy * dy <= PORTAL_RADIUS * PORTAL_RADIUS
}

pub fn in_hub_exit(pos: (f32, f32)) -> bool {
    (HUB_EXIT_MIN_X..=HUB_EXIT_MAX_X).contains(&pos.0)
        && (-ARENA_HALF_SIZE..=ARENA_HALF_SIZE).contains(&pos.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_direction_is_diagonal_then_speed_is_not_exceeded() {
        let (x, y) = step((0.0, 0.0), (1.0, 1.0), 100.0, 1.0);
        let travelled = (x * x + y * y).sqrt();
        assert!((travelled - 100.0).abs() < 1e-3);
    }

    #[test]
    fn when_direction_is_zero_then_position_is_unchanged() {
        assert_eq!(step((3.0, 4.0), (0.0, 0.0), 100.0, 1.0), (3.0, 4.0));
    }

    #[test]
    fn when_step_would_leave_arena_then_it_is_clamped() {
        assert_eq!(step((440.0, 0.0), (1.0, 0.0), 100.0, 1.0), (450.0, 0.0));
    }

    #[test]
    fn when_checking_zones_then_bounds_match_the_server() {
        assert!(in_portal((0.0, 360.0), (0.0, 400.0)));
        assert!(!in_portal((0.0, 340.0), (0.0, 400.0)));
        assert!(in_hub_exit((400.0, 0.0)));
        assert!(!in_hub_exit((300.0, 0.0)));
    }
}
