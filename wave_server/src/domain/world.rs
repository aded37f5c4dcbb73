// Authoritative world state: players, the enemy wave, portal, hazards and the phase machine.
//
// A `World` is owned by exactly one world task; every mutation goes through its methods so the
// transition side effects live in one place.

use crate::domain::state::{
    EnemySnapshot, Hazard, Phase, PlayerSnapshot, Portal, SimEnemy, SimPlayer, WorldSnapshot,
};
use crate::domain::systems::phase::{PhaseEvent, ReadyQuorum};
use crate::domain::systems::{combat, hazards, portal, pursuit, spawning};
use crate::domain::tuning::{ArenaTuning, EnemyTuning, WaveTuning};
use crate::domain::validation::{HitClaim, HitGuard, HitPolicy, MoveGuard, MovePolicy};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use tracing::{debug, info};

pub use crate::domain::systems::combat::HitOutcome;

/// Everything that shapes a world's behavior, fixed at creation.
#[derive(Debug, Clone, Default)]
pub struct WorldRules {
    pub waves: WaveTuning,
    pub enemies: EnemyTuning,
    pub arena: ArenaTuning,
    pub quorum: ReadyQuorum,
    pub hit_policy: HitPolicy,
    pub move_policy: MovePolicy,
    /// Fixed RNG seed for reproducible spawns; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Applied,
    UnknownPlayer,
    Rejected,
}

pub struct World {
    waves: WaveTuning,
    enemy_tuning: EnemyTuning,
    arena: ArenaTuning,
    quorum: ReadyQuorum,
    hit_guard: Box<dyn HitGuard>,
    move_guard: Box<dyn MoveGuard>,
    rng: StdRng,

    tick: u64,
    phase: Phase,
    wave: u32,
    players: BTreeMap<u64, SimPlayer>,
    enemies: Vec<SimEnemy>,
    portal: Option<Portal>,
    hazards: Vec<Hazard>,
    next_enemy_id: u64,

    // Per-wave counters driving the portal trigger.
    wave_batch: u32,
    kills: u32,
}

impl World {
    /// Creates an empty world resting in the hub before wave 1.
    pub fn new(rules: WorldRules) -> Self {
        let rng = match rules.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            waves: rules.waves,
            enemy_tuning: rules.enemies,
            arena: rules.arena,
            quorum: rules.quorum,
            hit_guard: rules.hit_policy.build(),
            move_guard: rules.move_policy.build(),
            rng,
            tick: 0,
            phase: Phase::Hub,
            wave: 0,
            players: BTreeMap::new(),
            enemies: Vec::new(),
            portal: None,
            hazards: Vec::new(),
            next_enemy_id: 1,
            wave_batch: 0,
            kills: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn living_enemies(&self) -> usize {
        self.enemies.iter().filter(|e| e.alive).count()
    }

    pub fn portal(&self) -> Option<Portal> {
        self.portal
    }

    /// Spawns a player near the arena center. Re-joining an existing id keeps its record.
    pub fn join(&mut self, player_id: u64, avatar: String) {
        let spread = self.arena.join_spread.max(0.0);
        let x = self.rng.gen_range(-spread..=spread);
        let y = self.rng.gen_range(-spread..=spread);
        self.players.entry(player_id).or_insert_with(|| SimPlayer {
            id: player_id,
            x,
            y,
            avatar,
            ready: false,
        });
        info!(player_id, players = self.player_count(), "player joined");
    }

    /// Removes the player; returns false if it was not present.
    pub fn leave(&mut self, player_id: u64) -> bool {
        let removed = self.players.remove(&player_id).is_some();
        if removed {
            info!(player_id, players = self.player_count(), "player left");
        }
        removed
    }

    pub fn apply_move(&mut self, player_id: u64, x: f32, y: f32) -> MoveOutcome {
        let Some(player) = self.players.get_mut(&player_id) else {
            return MoveOutcome::UnknownPlayer;
        };
        if !self.move_guard.allow(player, x, y) {
            return MoveOutcome::Rejected;
        }
        player.x = x;
        player.y = y;
        MoveOutcome::Applied
    }

    /// Records a player's ready intent; returns false for unknown players.
    pub fn set_ready(&mut self, player_id: u64, status: bool) -> bool {
        match self.players.get_mut(&player_id) {
            Some(player) => {
                player.ready = status;
                true
            }
            None => false,
        }
    }

    /// Adjudicates a client-reported hit. The client's claim is only a request; hit points and
    /// death are decided here.
    pub fn apply_hit(&mut self, player_id: u64, enemy_id: u64, damage: f32) -> HitOutcome {
        let claim = HitClaim {
            player_id,
            enemy_id,
            damage,
        };
        let shooter = self.players.get(&player_id);
        let guard = &self.hit_guard;
        let outcome = combat::adjudicate_hit(&mut self.enemies, enemy_id, damage, |enemy| {
            guard.allow(&claim, shooter, enemy)
        });

        match outcome {
            HitOutcome::Killed => self.kills += 1,
            HitOutcome::Rejected => debug!(player_id, enemy_id, damage, "hit rejected"),
            _ => {}
        }
        outcome
    }

    /// Advances the simulation by `dt` seconds and applies any phase transition that became due.
    pub fn tick(&mut self, dt: f32) {
        self.tick += 1;

        if self.phase == Phase::Wave {
            combat::remove_dead(&mut self.enemies);

            let targets: Vec<(f32, f32)> = self.players.values().map(|p| (p.x, p.y)).collect();
            pursuit::tick_enemies(&mut self.enemies, &targets, dt);

            let threshold = self.waves.portal_kill_threshold(self.wave_batch);
            if portal::should_open(self.portal, self.kills, threshold, self.enemies.len()) {
                let opened = portal::open_at_random_spot(&mut self.rng, &self.arena);
                info!(wave = self.wave, x = opened.x, y = opened.y, "portal opened");
                self.portal = Some(opened);
            }
        }

        if let Some(event) = self.due_event() {
            self.transition(event);
        }
    }

    fn due_event(&self) -> Option<PhaseEvent> {
        match self.phase {
            Phase::Wave if self.enemies.is_empty() => Some(PhaseEvent::WaveCleared),
            Phase::Wave if self.quorum_at_portal() => Some(PhaseEvent::PortalTaken),
            Phase::Hub if self.quorum_at_hub_exit() => Some(PhaseEvent::HubExitTaken),
            _ => None,
        }
    }

    fn quorum_at_portal(&self) -> bool {
        let Some(open) = self.portal else {
            return false;
        };
        let radius = self.arena.portal_radius;
        let eligible = self
            .players
            .values()
            .filter(|p| p.ready && portal::in_reach(&open, p.x, p.y, radius))
            .count();
        self.quorum.is_met(eligible, self.players.len())
    }

    fn quorum_at_hub_exit(&self) -> bool {
        let eligible = self
            .players
            .values()
            .filter(|p| p.ready && self.arena.in_hub_exit(p.x, p.y))
            .count();
        self.quorum.is_met(eligible, self.players.len())
    }

    /// Applies `event` if the current phase accepts it. All phase side effects live here.
    pub fn transition(&mut self, event: PhaseEvent) -> bool {
        let Some(next) = self.phase.next(event) else {
            debug!(?event, phase = ?self.phase, "ignoring phase event");
            return false;
        };

        match next {
            Phase::Hub => {
                self.enemies.clear();
                self.portal = None;
                self.hazards.clear();
            }
            Phase::Wave => {
                self.wave += 1;
                self.portal = None;
                self.enemies = spawning::spawn_batch(
                    &mut self.rng,
                    self.wave,
                    &mut self.next_enemy_id,
                    &self.waves,
                    &self.enemy_tuning,
                    &self.arena,
                );
                self.hazards = hazards::generate(&mut self.rng, &self.arena);
                self.wave_batch = self.enemies.len() as u32;
                self.kills = 0;
            }
        }

        // Readiness never carries across a transition; clients must signal again.
        for player in self.players.values_mut() {
            player.ready = false;
        }

        info!(
            ?event,
            from = ?self.phase,
            to = ?next,
            wave = self.wave,
            enemies = self.enemies.len(),
            "phase changed"
        );
        self.phase = next;
        true
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let enemies = match self.phase {
            Phase::Wave => self
                .enemies
                .iter()
                .filter(|e| e.alive)
                .map(EnemySnapshot::from)
                .collect(),
            Phase::Hub => Vec::new(),
        };
        WorldSnapshot {
            tick: self.tick,
            wave: self.wave,
            phase: self.phase,
            players: self.players.values().map(PlayerSnapshot::from).collect(),
            enemies,
            portal: self.portal,
            hazards: self.hazards.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::EnemyKind;

    const DT: f32 = 1.0 / 60.0;

    fn rules(quorum: ReadyQuorum) -> WorldRules {
        WorldRules {
            quorum,
            seed: Some(11),
            ..WorldRules::default()
        }
    }

    // Joins one player, walks it into the hub exit and starts wave 1.
    fn world_in_first_wave() -> World {
        let mut world = World::new(rules(ReadyQuorum::Any));
        world.join(1, "?".to_string());
        world.apply_move(1, 400.0, 0.0);
        world.set_ready(1, true);
        world.tick(DT);
        world
    }

    fn melee_id(world: &World) -> u64 {
        world
            .snapshot()
            .enemies
            .iter()
            .find(|e| e.kind == EnemyKind::Melee)
            .map(|e| e.id)
            .expect("wave should contain a melee enemy")
    }

    #[test]
    fn when_world_starts_then_it_rests_in_hub_with_nothing_spawned() {
        let world = World::new(WorldRules::default());
        let snap = world.snapshot();
        assert_eq!(snap.phase, Phase::Hub);
        assert_eq!(snap.wave, 0);
        assert!(snap.enemies.is_empty());
        assert!(snap.portal.is_none());
    }

    #[test]
    fn when_full_cycle_runs_then_waves_scale_and_phases_alternate() {
        let mut world = world_in_first_wave();
        let snap = world.snapshot();
        assert_eq!(snap.phase, Phase::Wave);
        assert_eq!(snap.wave, 1);
        assert_eq!(snap.enemies.len(), 8);
        assert!(!snap.hazards.is_empty() || world.arena.hazard_count == 0);

        for enemy in &snap.enemies {
            assert_eq!(world.apply_hit(1, enemy.id, 100.0), HitOutcome::Killed);
        }
        world.tick(DT);
        let snap = world.snapshot();
        assert_eq!(snap.phase, Phase::Hub);
        assert!(snap.enemies.is_empty());
        assert!(snap.portal.is_none());
        assert!(snap.hazards.is_empty());

        // Ready flags were reset by the transition, so standing in the exit is not enough.
        world.tick(DT);
        assert_eq!(world.phase(), Phase::Hub);

        world.set_ready(1, true);
        world.tick(DT);
        let snap = world.snapshot();
        assert_eq!(snap.phase, Phase::Wave);
        assert_eq!(snap.wave, 2);
        assert_eq!(snap.enemies.len(), 11);
    }

    #[test]
    fn when_partial_hits_land_then_enemy_stays_with_reduced_hp_until_killed() {
        let mut world = world_in_first_wave();
        let id = melee_id(&world);

        assert_eq!(world.apply_hit(1, id, 1.0), HitOutcome::Damaged { hp: 2.0 });
        world.tick(DT);
        assert_eq!(world.apply_hit(1, id, 1.0), HitOutcome::Damaged { hp: 1.0 });
        world.tick(DT);
        let hp = world.snapshot().enemies.iter().find(|e| e.id == id).map(|e| e.hp);
        assert_eq!(hp, Some(1.0));

        assert_eq!(world.apply_hit(1, id, 3.0), HitOutcome::Killed);
        world.tick(DT);
        assert!(world.snapshot().enemies.iter().all(|e| e.id != id));
    }

    #[test]
    fn when_enemy_is_dead_or_unknown_then_hits_are_harmless_no_ops() {
        let mut world = world_in_first_wave();
        let id = melee_id(&world);
        let before = world.living_enemies();

        assert_eq!(world.apply_hit(1, id, 3.0), HitOutcome::Killed);
        assert_eq!(world.apply_hit(1, id, 3.0), HitOutcome::AlreadyDead);
        world.tick(DT);
        assert_eq!(world.apply_hit(1, id, 3.0), HitOutcome::UnknownEnemy);
        assert_eq!(world.apply_hit(1, 99_999, 3.0), HitOutcome::UnknownEnemy);
        assert_eq!(world.living_enemies(), before - 1);
        assert_eq!(world.kills, 1);
    }

    #[test]
    fn when_in_hub_then_hits_find_no_enemy() {
        let mut world = World::new(WorldRules::default());
        world.join(1, "?".to_string());
        assert_eq!(world.apply_hit(1, 1, 5.0), HitOutcome::UnknownEnemy);
    }

    #[test]
    fn when_player_disconnects_then_it_is_absent_from_later_snapshots() {
        let mut world = world_in_first_wave();
        world.join(2, "🔥".to_string());
        assert_eq!(world.player_count(), 2);
        assert_eq!(world.snapshot().players.len(), 2);

        assert!(world.leave(2));
        assert_eq!(world.player_count(), 1);
        world.tick(DT);
        assert!(world.snapshot().players.iter().all(|p| p.id != 2));
        assert!(!world.leave(2));
    }

    #[test]
    fn when_half_the_wave_dies_then_portal_opens_and_ready_players_leave_through_it() {
        let mut world = world_in_first_wave();
        let ids: Vec<u64> = world.snapshot().enemies.iter().map(|e| e.id).collect();
        for id in ids.iter().take(4) {
            world.apply_hit(1, *id, 100.0);
        }
        world.tick(DT);
        let open = world.portal().expect("portal should open after half the wave dies");
        assert_eq!(world.phase(), Phase::Wave);

        world.apply_move(1, open.x, open.y);
        world.set_ready(1, true);
        world.tick(DT);
        let snap = world.snapshot();
        assert_eq!(snap.phase, Phase::Hub);
        assert!(snap.enemies.is_empty());
        assert!(snap.portal.is_none());
    }

    #[test]
    fn when_quorum_is_all_then_one_ready_player_cannot_leave_the_hub_alone() {
        let mut world = World::new(rules(ReadyQuorum::All));
        world.join(1, "?".to_string());
        world.join(2, "?".to_string());
        world.apply_move(1, 400.0, 0.0);
        world.set_ready(1, true);
        world.tick(DT);
        assert_eq!(world.phase(), Phase::Hub);

        world.apply_move(2, 420.0, 100.0);
        world.set_ready(2, true);
        world.tick(DT);
        assert_eq!(world.phase(), Phase::Wave);
    }

    #[test]
    fn when_ready_outside_the_exit_then_nothing_happens() {
        let mut world = World::new(rules(ReadyQuorum::Any));
        world.join(1, "?".to_string());
        world.apply_move(1, 0.0, 0.0);
        world.set_ready(1, true);
        world.tick(DT);
        assert_eq!(world.phase(), Phase::Hub);
    }

    #[test]
    fn when_hub_phase_holds_stale_enemies_then_snapshot_still_reports_none() {
        let mut world = world_in_first_wave();
        world.phase = Phase::Hub;
        assert!(!world.enemies.is_empty());
        assert!(world.snapshot().enemies.is_empty());
    }

    #[test]
    fn when_event_does_not_fit_phase_then_transition_is_refused() {
        let mut world = World::new(WorldRules::default());
        assert!(!world.transition(PhaseEvent::WaveCleared));
        assert_eq!(world.phase(), Phase::Hub);
        assert_eq!(world.wave(), 0);
    }

    #[test]
    fn when_wave_runs_then_enemies_close_in_on_the_player() {
        let mut world = world_in_first_wave();
        let player = (400.0f32, 0.0f32);
        let distance = |w: &World| -> f32 {
            w.snapshot()
                .enemies
                .iter()
                .map(|e| ((e.x - player.0).powi(2) + (e.y - player.1).powi(2)).sqrt())
                .sum()
        };
        let before = distance(&world);
        for _ in 0..30 {
            world.tick(DT);
        }
        assert!(distance(&world) < before);
    }

    #[test]
    fn when_move_policy_limits_steps_then_teleports_are_rejected() {
        let mut world = World::new(WorldRules {
            move_policy: MovePolicy::MaxStep { max_step: 120.0 },
            arena: ArenaTuning {
                join_spread: 0.0,
                ..ArenaTuning::default()
            },
            ..WorldRules::default()
        });
        world.join(1, "?".to_string());
        assert_eq!(world.apply_move(1, 100.0, 0.0), MoveOutcome::Applied);
        assert_eq!(world.apply_move(1, 400.0, 0.0), MoveOutcome::Rejected);
        assert_eq!(world.apply_move(9, 0.0, 0.0), MoveOutcome::UnknownPlayer);
    }

    #[test]
    fn when_hit_policy_checks_range_then_far_shots_do_no_damage() {
        let mut world = World::new(WorldRules {
            quorum: ReadyQuorum::Any,
            hit_policy: HitPolicy::Range {
                max_range: 1.0,
                max_damage: 10.0,
            },
            seed: Some(5),
            ..WorldRules::default()
        });
        world.join(1, "?".to_string());
        world.apply_move(1, 400.0, 0.0);
        world.set_ready(1, true);
        world.tick(DT);
        let id = melee_id(&world);
        assert_eq!(world.apply_hit(1, id, 1.0), HitOutcome::Rejected);
        assert_eq!(world.living_enemies(), 8);
    }
}
