use crate::domain::WorldRules;
use crate::domain::systems::phase::ReadyQuorum;
use crate::domain::validation::{HitPolicy, MovePolicy};
use std::{env, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const WORLD_BROADCAST_CAPACITY: usize = 128;

pub const TICK_INTERVAL: Duration = Duration::from_millis(1000 / 60);

// Unpinned worlds with nobody connected for this long are retired.
pub const IDLE_WORLD_TIMEOUT: Duration = Duration::from_secs(60);
pub const IDLE_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

// World every client lands in when no `world_id` is given; never retired.
pub const DEFAULT_WORLD_ID: &str = "main";

// Limits used when hit/move validation is switched on.
pub const HIT_MAX_RANGE: f32 = 500.0;
pub const HIT_MAX_DAMAGE: f32 = 10.0;
pub const MOVE_MAX_STEP: f32 = 120.0;

pub fn http_port() -> u16 {
    env::var("WAVE_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

pub fn world_seed() -> Option<u64> {
    env::var("WORLD_SEED").ok().and_then(|v| v.trim().parse().ok())
}

pub fn ready_quorum() -> ReadyQuorum {
    match env::var("READY_QUORUM") {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default ready quorum");
            ReadyQuorum::default()
        }),
        Err(_) => ReadyQuorum::default(),
    }
}

pub fn hit_policy() -> HitPolicy {
    parse_hit_policy(env::var("HIT_VALIDATION").ok().as_deref())
}

pub fn move_policy() -> MovePolicy {
    parse_move_policy(env::var("MOVE_VALIDATION").ok().as_deref())
}

fn parse_hit_policy(raw: Option<&str>) -> HitPolicy {
    match raw.map(str::trim) {
        Some(v) if v.eq_ignore_ascii_case("range") => HitPolicy::Range {
            max_range: HIT_MAX_RANGE,
            max_damage: HIT_MAX_DAMAGE,
        },
        _ => HitPolicy::Trusted,
    }
}

fn parse_move_policy(raw: Option<&str>) -> MovePolicy {
    match raw.map(str::trim) {
        Some(v) if v.eq_ignore_ascii_case("step") => MovePolicy::MaxStep {
            max_step: MOVE_MAX_STEP,
        },
        _ => MovePolicy::Trusted,
    }
}

/// Rules for every world this process creates, read from the environment.
pub fn world_rules() -> WorldRules {
    WorldRules {
        quorum: ready_quorum(),
        hit_policy: hit_policy(),
        move_policy: move_policy(),
        seed: world_seed(),
        ..WorldRules::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_validation_is_unset_or_unknown_then_clients_are_trusted() {
        assert_eq!(parse_hit_policy(None), HitPolicy::Trusted);
        assert_eq!(parse_hit_policy(Some("strict")), HitPolicy::Trusted);
        assert_eq!(parse_move_policy(None), MovePolicy::Trusted);
    }

    #[test]
    fn when_validation_is_named_then_matching_guard_is_selected() {
        assert_eq!(
            parse_hit_policy(Some(" Range ")),
            HitPolicy::Range {
                max_range: HIT_MAX_RANGE,
                max_damage: HIT_MAX_DAMAGE,
            }
        );
        assert_eq!(
            parse_move_policy(Some("step")),
            MovePolicy::MaxStep {
                max_step: MOVE_MAX_STEP,
            }
        );
    }
}
