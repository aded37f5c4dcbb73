// Domain layer: core simulation types and rules.

pub mod state;
pub mod systems;
pub mod tuning;
pub mod validation;
pub mod world;

pub use state::{
    EnemyKind, EnemySnapshot, Hazard, HazardKind, Phase, PlayerSnapshot, Portal, SimEnemy,
    SimPlayer, WorldSnapshot,
};
pub use world::{HitOutcome, MoveOutcome, World, WorldRules};
