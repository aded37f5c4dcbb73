use crate::domain::state::SimEnemy;

/// Moves every living enemy toward its nearest target at its own speed.
///
/// With no targets enemies hold position.
pub fn tick_enemies(enemies: &mut [SimEnemy], targets: &[(f32, f32)], dt: f32) {
    for e in enemies.iter_mut().filter(|e| e.alive) {
        let Some((tx, ty)) = nearest(e.x, e.y, targets) else {
            continue;
        };
        let (x, y) = step_toward(e.x, e.y, tx, ty, e.speed * dt);
        e.x = x;
        e.y = y;
    }
}

fn nearest(x: f32, y: f32, targets: &[(f32, f32)]) -> Option<(f32, f32)> {
    targets.iter().copied().min_by(|a, b| {
        let da = (a.0 - x).powi(2) + (a.1 - y).powi(2);
        let db = (b.0 - x).powi(2) + (b.1 - y).powi(2);
        da.total_cmp(&db)
    })
}

/// Straight-line step of at most `max_step` toward the target, never overshooting.
pub fn step_toward(x: f32, y: f32, tx: f32, ty: f32, max_step: f32) -> (f32, f32) {
    let dx = tx - x;
    let dy = ty - y;
    let dist = (dx * dx + dy * dy).sqrt();

    // Coincident positions have no direction; stay put this tick.
    if dist <= f32::EPSILON {
        return (x, y);
    }
    if dist <= max_step {
        return (tx, ty);
    }

    (x + dx / dist * max_step, y + dy / dist * max_step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::EnemyKind;

    fn enemy(x: f32, y: f32, speed: f32) -> SimEnemy {
        SimEnemy {
            id: 1,
            kind: EnemyKind::Melee,
            x,
            y,
            hp: 3.0,
            alive: true,
            speed,
        }
    }

    #[test]
    fn when_enemy_sits_on_target_then_it_does_not_move() {
        let (x, y) = step_toward(5.0, 5.0, 5.0, 5.0, 10.0);
        assert_eq!((x, y), (5.0, 5.0));
        assert!(x.is_finite() && y.is_finite());
    }

    #[test]
    fn when_target_is_far_then_enemy_moves_exactly_its_step() {
        let (x, y) = step_toward(0.0, 0.0, 30.0, 40.0, 5.0);
        assert!((x - 3.0).abs() < 1e-4);
        assert!((y - 4.0).abs() < 1e-4);
    }

    #[test]
    fn when_target_is_within_one_step_then_enemy_lands_on_it() {
        assert_eq!(step_toward(0.0, 0.0, 1.0, 0.0, 5.0), (1.0, 0.0));
    }

    #[test]
    fn when_several_players_exist_then_enemy_chases_the_nearest() {
        let mut enemies = vec![enemy(0.0, 0.0, 10.0)];
        tick_enemies(&mut enemies, &[(100.0, 0.0), (-20.0, 0.0)], 1.0);
        assert_eq!((enemies[0].x, enemies[0].y), (-10.0, 0.0));
    }

    #[test]
    fn when_no_players_exist_then_enemies_hold_position() {
        let mut enemies = vec![enemy(3.0, 4.0, 10.0)];
        tick_enemies(&mut enemies, &[], 1.0);
        assert_eq!((enemies[0].x, enemies[0].y), (3.0, 4.0));
    }

    #[test]
    fn when_enemy_is_dead_then_it_is_not_moved() {
        let mut enemies = vec![enemy(0.0, 0.0, 10.0)];
        enemies[0].alive = false;
        tick_enemies(&mut enemies, &[(50.0, 0.0)], 1.0);
        assert_eq!(enemies[0].x, 0.0);
    }
}
