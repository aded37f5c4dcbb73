// Swappable plausibility checks that run ahead of hit adjudication and position updates.
//
// The default policies trust the client completely, matching how browser clients have always
// behaved against this server. Stricter policies are opt-in through configuration.

use crate::domain::state::{SimEnemy, SimPlayer};

/// A client's claim that one of its projectiles hit an enemy.
#[derive(Debug, Clone, Copy)]
pub struct HitClaim {
    pub player_id: u64,
    pub enemy_id: u64,
    pub damage: f32,
}

pub trait HitGuard: Send {
    /// Returns true when the claim may be adjudicated. `shooter` is `None` for unknown players.
    fn allow(&self, claim: &HitClaim, shooter: Option<&SimPlayer>, enemy: &SimEnemy) -> bool;
}

pub trait MoveGuard: Send {
    /// Returns true when `player` may jump to `(x, y)`.
    fn allow(&self, player: &SimPlayer, x: f32, y: f32) -> bool;
}

/// Accepts every claim as reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustClient;

impl HitGuard for TrustClient {
    fn allow(&self, _claim: &HitClaim, _shooter: Option<&SimPlayer>, _enemy: &SimEnemy) -> bool {
        true
    }
}

impl MoveGuard for TrustClient {
    fn allow(&self, _player: &SimPlayer, _x: f32, _y: f32) -> bool {
        true
    }
}

/// Rejects hits from shooters too far from the enemy's last known position or with
/// implausible damage.
#[derive(Debug, Clone, Copy)]
pub struct RangeCheck {
    pub max_range: f32,
    pub max_damage: f32,
}

impl HitGuard for RangeCheck {
    fn allow(&self, claim: &HitClaim, shooter: Option<&SimPlayer>, enemy: &SimEnemy) -> bool {
        let Some(shooter) = shooter else {
            return false;
        };
        if claim.damage > self.max_damage {
            return false;
        }
        let dx = shooter.x - enemy.x;
        let dy = shooter.y - enemy.y;
        dx * dx + dy * dy <= self.max_range * self.max_range
    }
}

/// Rejects position reports that jump farther than `max_step` from the last accepted one.
#[derive(Debug, Clone, Copy)]
pub struct MaxStep {
    pub max_step: f32,
}

impl MoveGuard for MaxStep {
    fn allow(&self, player: &SimPlayer, x: f32, y: f32) -> bool {
        let dx = x - player.x;
        let dy = y - player.y;
        dx * dx + dy * dy <= self.max_step * self.max_step
    }
}

/// Configuration-level choice of hit guard.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum HitPolicy {
    #[default]
    Trusted,
    Range { max_range: f32, max_damage: f32 },
}

impl HitPolicy {
    pub fn build(self) -> Box<dyn HitGuard> {
        match self {
            HitPolicy::Trusted => Box::new(TrustClient),
            HitPolicy::Range {
                max_range,
                max_damage,
            } => Box::new(RangeCheck {
                max_range,
                max_damage,
            }),
        }
    }
}

/// Configuration-level choice of move guard.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MovePolicy {
    #[default]
    Trusted,
    MaxStep { max_step: f32 },
}

impl MovePolicy {
    pub fn build(self) -> Box<dyn MoveGuard> {
        match self {
            MovePolicy::Trusted => Box::new(TrustClient),
            MovePolicy::MaxStep { max_step } => Box::new(MaxStep { max_step }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::EnemyKind;

    fn player(x: f32, y: f32) -> SimPlayer {
        SimPlayer {
            id: 7,
            x,
            y,
            avatar: "?".to_string(),
            ready: false,
        }
    }

    fn enemy(x: f32, y: f32) -> SimEnemy {
        SimEnemy {
            id: 1,
            kind: EnemyKind::Ranged,
            x,
            y,
            hp: 1.0,
            alive: true,
            speed: 48.0,
        }
    }

    fn claim(damage: f32) -> HitClaim {
        HitClaim {
            player_id: 7,
            enemy_id: 1,
            damage,
        }
    }

    #[test]
    fn when_policy_is_trusted_then_far_hits_are_allowed() {
        let guard = HitPolicy::Trusted.build();
        assert!(guard.allow(&claim(1000.0), None, &enemy(9000.0, 0.0)));
    }

    #[test]
    fn when_shooter_is_out_of_range_then_range_check_rejects() {
        let guard = RangeCheck {
            max_range: 500.0,
            max_damage: 10.0,
        };
        let shooter = player(0.0, 0.0);
        assert!(guard.allow(&claim(2.0), Some(&shooter), &enemy(300.0, 400.0)));
        assert!(!guard.allow(&claim(2.0), Some(&shooter), &enemy(301.0, 400.0)));
    }

    #[test]
    fn when_damage_is_implausible_or_shooter_unknown_then_range_check_rejects() {
        let guard = RangeCheck {
            max_range: 500.0,
            max_damage: 10.0,
        };
        assert!(!guard.allow(&claim(11.0), Some(&player(0.0, 0.0)), &enemy(1.0, 0.0)));
        assert!(!guard.allow(&claim(1.0), None, &enemy(1.0, 0.0)));
    }

    #[test]
    fn when_move_jumps_too_far_then_max_step_rejects() {
        let guard = MovePolicy::MaxStep { max_step: 10.0 }.build();
        let p = player(0.0, 0.0);
        assert!(guard.allow(&p, 6.0, 8.0));
        assert!(!guard.allow(&p, 6.0, 9.0));
    }
}
